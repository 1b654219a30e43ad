//! Contract validation infrastructure
//!
//! - Parser: OpenAPI 3.x / Swagger 2.0 loading with `$ref` resolution
//! - Cache: TTL and modification-time aware contract cache
//! - Matcher: implementation/contract path reconciliation
//! - Validation: parameter, body, response and security checks
//! - Security: detector chain over endpoint sources
//! - AST: tree-sitter analysis backing the security detectors

pub mod analyzers;
pub mod ast;
pub mod cache;
pub mod matcher;
pub mod parser;
pub mod security;
pub mod validation;

pub use cache::ContractCache;
pub use matcher::{find_matching_contract_endpoint, normalize_path};
pub use parser::ContractLoader;
pub use security::SecurityVerifier;
pub use validation::DeepValidator;
