//! Static analysis of endpoint sources
//!
//! The security verifier talks to source analysis through [`AstAnalyzer`];
//! [`TreeSitterAstAnalyzer`] is the bundled implementation.

pub mod tree_sitter_analyzer;

pub use tree_sitter_analyzer::TreeSitterAstAnalyzer;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Languages with a bundled grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    Go,
    JavaScript,
    TypeScript,
    Python,
    Rust,
}

impl SourceLanguage {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "go" => Some(SourceLanguage::Go),
            "js" | "jsx" | "mjs" | "cjs" => Some(SourceLanguage::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "py" => Some(SourceLanguage::Python),
            "rs" => Some(SourceLanguage::Rust),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "go" | "golang" => Some(SourceLanguage::Go),
            "javascript" | "js" => Some(SourceLanguage::JavaScript),
            "typescript" | "ts" => Some(SourceLanguage::TypeScript),
            "python" | "py" => Some(SourceLanguage::Python),
            "rust" | "rs" => Some(SourceLanguage::Rust),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLanguage::Go => "go",
            SourceLanguage::JavaScript => "javascript",
            SourceLanguage::TypeScript => "typescript",
            SourceLanguage::Python => "python",
            SourceLanguage::Rust => "rust",
        }
    }
}

/// Language label for a source file; `unknown` when the extension is not recognised
pub fn language_for_path(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SourceLanguage::from_extension(ext)
                .map(|lang| lang.as_str().to_string())
                .unwrap_or_else(|| ext.to_ascii_lowercase())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Analyses an [`AstAnalyzer`] can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    SecurityMiddleware,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::SecurityMiddleware => "security_middleware",
        }
    }
}

/// One analyzer observation, e.g. `jwt_middleware` at line 12
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstFinding {
    pub finding_type: String,
    pub line: usize,
    pub confidence: f64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub language: String,
    pub nodes_visited: usize,
    pub functions_found: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AstError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to load {language} grammar: {message}")]
    Grammar { language: String, message: String },

    #[error("Failed to parse {language} source")]
    ParseFailed { language: String },
}

/// Source analysis used for security verification
pub trait AstAnalyzer: Send + Sync {
    fn analyze(
        &self,
        code: &str,
        language: &str,
        kinds: &[AnalysisKind],
    ) -> Result<(Vec<AstFinding>, AnalysisMetadata), AstError>;

    fn extract_functions(&self, code: &str, language: &str) -> Result<Vec<FunctionInfo>, AstError>;
}
