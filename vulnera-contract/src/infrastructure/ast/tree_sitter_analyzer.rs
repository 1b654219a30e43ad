//! Tree-sitter backed source analyzer

use std::time::Instant;
use tracing::{debug, instrument};
use tree_sitter::{Node, Parser, Tree};

use super::{AnalysisKind, AnalysisMetadata, AstAnalyzer, AstError, AstFinding, FunctionInfo, SourceLanguage};

/// Confidence for middleware recognised inside a function
const FUNCTION_PATTERN_CONFIDENCE: f64 = 0.85;
/// Confidence for an `Authorization: Bearer` check anywhere in the file
const FILE_BEARER_CONFIDENCE: f64 = 0.85;
/// Confidence for an API key header check anywhere in the file
const FILE_API_KEY_CONFIDENCE: f64 = 0.80;

/// Security middleware detection over tree-sitter syntax trees
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeSitterAstAnalyzer;

impl TreeSitterAstAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn grammar(language: SourceLanguage) -> tree_sitter::Language {
        match language {
            SourceLanguage::Go => tree_sitter_go::LANGUAGE.into(),
            SourceLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Python => tree_sitter_python::LANGUAGE.into(),
            SourceLanguage::Rust => tree_sitter_rust::LANGUAGE.into(),
        }
    }

    fn function_node_kinds(language: SourceLanguage) -> &'static [&'static str] {
        match language {
            SourceLanguage::Go => &["function_declaration", "method_declaration"],
            SourceLanguage::JavaScript | SourceLanguage::TypeScript => &[
                "function_declaration",
                "function_expression",
                "function",
                "generator_function_declaration",
                "arrow_function",
                "method_definition",
            ],
            SourceLanguage::Python => &["function_definition"],
            SourceLanguage::Rust => &["function_item"],
        }
    }

    fn parse(code: &str, language_label: &str) -> Result<(SourceLanguage, Tree), AstError> {
        let language = SourceLanguage::from_label(language_label)
            .ok_or_else(|| AstError::UnsupportedLanguage(language_label.to_string()))?;

        let mut parser = Parser::new();
        parser
            .set_language(&Self::grammar(language))
            .map_err(|e| AstError::Grammar {
                language: language.as_str().to_string(),
                message: e.to_string(),
            })?;

        let tree = parser.parse(code, None).ok_or_else(|| AstError::ParseFailed {
            language: language.as_str().to_string(),
        })?;

        Ok((language, tree))
    }

    /// Every function-like node in document order, plus the total node count
    fn collect_functions<'t>(root: Node<'t>, language: SourceLanguage) -> (Vec<Node<'t>>, usize) {
        let kinds = Self::function_node_kinds(language);
        let mut functions = Vec::new();
        let mut visited = 0;
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            visited += 1;
            if kinds.contains(&node.kind()) {
                functions.push(node);
            }
            let mut cursor = node.walk();
            let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        (functions, visited)
    }

    /// Declared name, or the binding name for anonymous functions assigned to a variable
    fn function_name(node: Node<'_>, source: &[u8]) -> Option<String> {
        if let Some(name) = node.child_by_field_name("name")
            && let Ok(text) = name.utf8_text(source)
        {
            return Some(text.to_string());
        }

        let parent = node.parent()?;
        if matches!(parent.kind(), "variable_declarator" | "pair" | "assignment_expression") {
            let name_node = parent
                .child_by_field_name("name")
                .or_else(|| parent.child_by_field_name("key"))
                .or_else(|| parent.child_by_field_name("left"))?;
            return name_node.utf8_text(source).ok().map(|s| s.to_string());
        }

        None
    }

    fn security_middleware_findings(
        functions: &[Node<'_>],
        code: &str,
        findings: &mut Vec<AstFinding>,
    ) {
        let source = code.as_bytes();

        for node in functions {
            let name = Self::function_name(*node, source).unwrap_or_default();
            let body = node.utf8_text(source).unwrap_or_default();
            let name_lower = name.to_lowercase();
            let body_lower = body.to_lowercase();
            let line = node.start_position().row + 1;

            for (finding_type, scheme) in classify_function(&name_lower, &body_lower) {
                let display_name = if name.is_empty() { "<anonymous>" } else { name.as_str() };
                findings.push(AstFinding {
                    finding_type: finding_type.to_string(),
                    line,
                    confidence: FUNCTION_PATTERN_CONFIDENCE,
                    message: format!("Security middleware detected: {display_name} ({scheme})"),
                });
            }
        }

        let code_lower = code.to_lowercase();
        if code_lower.contains("authorization") && code_lower.contains("bearer") {
            findings.push(AstFinding {
                finding_type: "jwt_middleware".to_string(),
                line: first_line_containing(&code_lower, "bearer"),
                confidence: FILE_BEARER_CONFIDENCE,
                message: "JWT/Bearer token authentication detected".to_string(),
            });
        }
        if code_lower.contains("x-api-key") || code_lower.contains("xapikey") {
            findings.push(AstFinding {
                finding_type: "apikey_middleware".to_string(),
                line: first_line_containing(&code_lower, "api"),
                confidence: FILE_API_KEY_CONFIDENCE,
                message: "API key authentication detected".to_string(),
            });
        }
    }
}

impl AstAnalyzer for TreeSitterAstAnalyzer {
    #[instrument(skip(self, code, kinds), fields(bytes = code.len()))]
    fn analyze(
        &self,
        code: &str,
        language: &str,
        kinds: &[AnalysisKind],
    ) -> Result<(Vec<AstFinding>, AnalysisMetadata), AstError> {
        let started = Instant::now();
        let (lang, tree) = Self::parse(code, language)?;
        let (functions, nodes_visited) = Self::collect_functions(tree.root_node(), lang);

        let mut findings = Vec::new();
        for kind in kinds {
            match kind {
                AnalysisKind::SecurityMiddleware => {
                    Self::security_middleware_findings(&functions, code, &mut findings)
                }
            }
        }

        debug!(
            findings = findings.len(),
            functions = functions.len(),
            "AST analysis complete"
        );

        Ok((
            findings,
            AnalysisMetadata {
                language: lang.as_str().to_string(),
                nodes_visited,
                functions_found: functions.len(),
                duration_ms: started.elapsed().as_millis() as u64,
            },
        ))
    }

    fn extract_functions(&self, code: &str, language: &str) -> Result<Vec<FunctionInfo>, AstError> {
        let (lang, tree) = Self::parse(code, language)?;
        let (functions, _) = Self::collect_functions(tree.root_node(), lang);
        let source = code.as_bytes();

        Ok(functions
            .into_iter()
            .filter_map(|node| {
                Self::function_name(node, source).map(|name| FunctionInfo {
                    name,
                    line: node.start_position().row + 1,
                })
            })
            .collect())
    }
}

/// Middleware categories suggested by a function's name and body (both lower-cased)
fn classify_function(name: &str, body: &str) -> Vec<(&'static str, &'static str)> {
    let mut matches = Vec::new();

    if name.contains("jwt")
        || name.contains("bearer")
        || name.contains("token")
        || (body.contains("bearer") && body.contains("authorization"))
        || body.contains("jwt")
        || body.contains("jsonwebtoken")
    {
        matches.push(("jwt_middleware", "BearerAuth"));
    }
    if name.contains("apikey")
        || name.contains("api_key")
        || body.contains("x-api-key")
        || body.contains("xapikey")
        || body.contains("extractapikey")
        || body.contains("validateapikey")
    {
        matches.push(("apikey_middleware", "ApiKeyAuth"));
    }
    if name.contains("oauth") || body.contains("oauth") {
        matches.push(("oauth_middleware", "OAuth2"));
    }
    if name.contains("rbac")
        || name.contains("role")
        || name.contains("authorize")
        || body.contains("rbac")
        || (body.contains("role") && (body.contains("check") || body.contains("verify")))
    {
        matches.push(("rbac_middleware", "RBAC"));
    }
    if name.contains("ratelimit")
        || name.contains("rate_limit")
        || body.contains("ratelimit")
        || body.contains("throttle")
    {
        matches.push(("ratelimit_middleware", "RateLimit"));
    }
    if name.contains("cors")
        || body.contains("cors")
        || body.contains("access-control-allow-origin")
    {
        matches.push(("cors_middleware", "CORS"));
    }

    matches
}

fn first_line_containing(code_lower: &str, needle: &str) -> usize {
    code_lower
        .lines()
        .position(|line| line.contains(needle))
        .map(|idx| idx + 1)
        .unwrap_or(1)
}
