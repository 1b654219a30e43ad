//! Metadata-only security check, used when source analysis is unavailable

use crate::domain::entities::{ContractEndpoint, Finding, ImplementedEndpoint};
use crate::domain::value_objects::FindingSeverity;

use super::security_pointer;

/// One critical finding per required scheme the endpoint does not declare
pub fn metadata_fallback(
    endpoint: &ImplementedEndpoint,
    contract_endpoint: &ContractEndpoint,
    required_schemes: &[String],
) -> Vec<Finding> {
    let location = endpoint.source_file.display().to_string();

    required_schemes
        .iter()
        .filter(|scheme| {
            !endpoint
                .declared_auth_schemes
                .iter()
                .any(|declared| declared.eq_ignore_ascii_case(scheme))
        })
        .map(|scheme| {
            Finding::mismatch(
                FindingSeverity::Critical,
                &location,
                format!(
                    "Security scheme '{}' required by contract but not found in endpoint {}",
                    scheme,
                    endpoint.label()
                ),
                security_pointer(contract_endpoint, scheme),
            )
            .with_fix(format!(
                "Add security scheme '{}' implementation to endpoint {}",
                scheme,
                endpoint.label()
            ))
            .with_detail("validation_method", "metadata_fallback")
            .with_detail("scheme", scheme.clone())
        })
        .collect()
}
