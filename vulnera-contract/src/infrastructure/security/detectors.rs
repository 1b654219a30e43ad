//! Security pattern detection strategies

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::domain::value_objects::{PatternCategory, SecurityPattern};
use crate::infrastructure::ast::{AnalysisKind, AstAnalyzer, AstError};

/// Endpoint source handed to each detector
#[derive(Debug, Clone, Copy)]
pub struct SourceUnit<'a> {
    pub path: &'a Path,
    pub code: &'a str,
    pub language: &'a str,
}

/// One step of the detection chain.
///
/// An `Err` means the chain is degraded and the caller falls back to metadata.
pub trait SecurityDetector: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, source: &SourceUnit<'_>) -> Result<Vec<SecurityPattern>, AstError>;
}

/// Classifies security middleware findings from the AST analyzer
pub struct AstPatternDetector {
    analyzer: Arc<dyn AstAnalyzer>,
}

impl AstPatternDetector {
    pub fn new(analyzer: Arc<dyn AstAnalyzer>) -> Self {
        Self { analyzer }
    }
}

impl SecurityDetector for AstPatternDetector {
    fn name(&self) -> &'static str {
        "ast_pattern"
    }

    fn detect(&self, source: &SourceUnit<'_>) -> Result<Vec<SecurityPattern>, AstError> {
        let (findings, metadata) = self.analyzer.analyze(
            source.code,
            source.language,
            &[AnalysisKind::SecurityMiddleware],
        )?;

        debug!(
            file = %source.path.display(),
            nodes = metadata.nodes_visited,
            functions = metadata.functions_found,
            "Analyzed endpoint source"
        );

        Ok(findings
            .into_iter()
            .filter_map(|finding| {
                let (category, scheme) = classify_finding_type(&finding.finding_type)?;
                Some(SecurityPattern {
                    category,
                    scheme_guess: scheme.to_string(),
                    location: format!("line {}", finding.line),
                    confidence: finding.confidence,
                })
            })
            .collect())
    }
}

fn classify_finding_type(finding_type: &str) -> Option<(PatternCategory, &'static str)> {
    let ft = finding_type.to_lowercase();
    if ft.contains("jwt") || ft.contains("bearer") {
        Some((PatternCategory::Authentication, "BearerAuth"))
    } else if ft.contains("apikey") || ft.contains("api_key") {
        Some((PatternCategory::Authentication, "ApiKeyAuth"))
    } else if ft.contains("oauth") {
        Some((PatternCategory::Authentication, "OAuth2"))
    } else if ft.contains("rbac") || ft.contains("authorize") {
        Some((PatternCategory::Authorization, "RBAC"))
    } else if ft.contains("ratelimit") {
        Some((PatternCategory::RateLimit, "RateLimit"))
    } else if ft.contains("cors") {
        Some((PatternCategory::Cors, "CORS"))
    } else {
        None
    }
}

/// Guesses schemes from middleware-looking function names
pub struct FunctionNameDetector {
    analyzer: Arc<dyn AstAnalyzer>,
    confidence: f64,
}

/// Most specific keywords first; generic `auth` is last
const NAME_SCHEMES: [(&str, PatternCategory, &str); 9] = [
    ("apikey", PatternCategory::Authentication, "ApiKeyAuth"),
    ("api_key", PatternCategory::Authentication, "ApiKeyAuth"),
    ("oauth", PatternCategory::Authentication, "OAuth2"),
    ("authorize", PatternCategory::Authorization, "RBAC"),
    ("rbac", PatternCategory::Authorization, "RBAC"),
    ("ratelimit", PatternCategory::RateLimit, "RateLimit"),
    ("cors", PatternCategory::Cors, "CORS"),
    ("jwt", PatternCategory::Authentication, "BearerAuth"),
    ("auth", PatternCategory::Authentication, "BearerAuth"),
];

const MIDDLEWARE_KEYWORDS: [&str; 8] = [
    "auth",
    "jwt",
    "oauth",
    "rbac",
    "ratelimit",
    "cors",
    "authenticate",
    "authorize",
];

impl FunctionNameDetector {
    pub fn new(analyzer: Arc<dyn AstAnalyzer>, confidence: f64) -> Self {
        Self {
            analyzer,
            confidence,
        }
    }

    fn is_middleware_name(name: &str) -> bool {
        let lower = name.to_lowercase();
        lower.ends_with("middleware")
            || lower.ends_with("auth")
            || MIDDLEWARE_KEYWORDS.iter().any(|kw| lower.contains(kw))
    }
}

impl SecurityDetector for FunctionNameDetector {
    fn name(&self) -> &'static str {
        "function_name"
    }

    fn detect(&self, source: &SourceUnit<'_>) -> Result<Vec<SecurityPattern>, AstError> {
        let functions = match self.analyzer.extract_functions(source.code, source.language) {
            Ok(functions) => functions,
            Err(e) => {
                debug!(error = %e, file = %source.path.display(), "Function extraction failed");
                return Ok(Vec::new());
            }
        };

        Ok(functions
            .into_iter()
            .filter(|function| Self::is_middleware_name(&function.name))
            .filter_map(|function| {
                let lower = function.name.to_lowercase();
                let (_, category, scheme) = NAME_SCHEMES
                    .iter()
                    .find(|(keyword, _, _)| lower.contains(keyword))?;
                Some(SecurityPattern {
                    category: *category,
                    scheme_guess: scheme.to_string(),
                    location: format!("function {}", function.name),
                    confidence: self.confidence,
                })
            })
            .collect())
    }
}
