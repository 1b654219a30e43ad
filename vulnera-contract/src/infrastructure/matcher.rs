//! Endpoint matching between implementation and contract notations

use crate::domain::entities::{Contract, ContractEndpoint, ImplementedEndpoint};

/// Rewrite `:name` path segments to `{name}`
///
/// Bracketed segments are left alone, so the function is idempotent and
/// `/users/:id` and `/users/{id}` normalize to the same string.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{name}}}"),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Find the contract endpoint for an implemented endpoint
///
/// Methods compare case-insensitively and paths after normalization. The
/// first match in contract order wins.
pub fn find_matching_contract_endpoint<'c>(
    endpoint: &ImplementedEndpoint,
    contract: &'c Contract,
) -> Option<&'c ContractEndpoint> {
    let wanted_path = normalize_path(&endpoint.path);
    contract.endpoints.iter().find(|candidate| {
        candidate.method.eq_ignore_ascii_case(&endpoint.method)
            && normalize_path(&candidate.path) == wanted_path
    })
}

/// JSON pointer to a path item, `~` and `/` escaped per RFC 6901
pub fn json_pointer_for_path(path: &str) -> String {
    format!("#/paths/{}", escape_pointer_token(path))
}

/// JSON pointer to an operation, e.g. `#/paths/~1users~1{id}/get`
pub fn json_pointer_for_operation(path: &str, method: &str) -> String {
    format!("{}/{}", json_pointer_for_path(path), method.to_lowercase())
}

pub fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
