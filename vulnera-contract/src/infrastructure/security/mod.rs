//! Security requirement verification
//!
//! Detection runs as an ordered chain: AST middleware patterns, then
//! function-name heuristics. When the source cannot be read or analysed the
//! verifier degrades to the endpoint's declared auth schemes.

pub mod detectors;
pub mod fallback;
pub mod matching;
pub mod verifier;

pub use detectors::{AstPatternDetector, FunctionNameDetector, SecurityDetector, SourceUnit};
pub use matching::{matches_scheme, normalize_scheme_name};
pub use verifier::SecurityVerifier;

use crate::domain::entities::ContractEndpoint;
use crate::infrastructure::matcher::{escape_pointer_token, json_pointer_for_operation};

fn security_pointer(contract_endpoint: &ContractEndpoint, scheme: &str) -> String {
    format!(
        "{}/security/{}",
        json_pointer_for_operation(&contract_endpoint.path, &contract_endpoint.method),
        escape_pointer_token(scheme)
    )
}
