//! Endpoint-level contract validation

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::domain::entities::{Contract, Finding, ImplementedEndpoint};
use crate::domain::errors::{ContractError, ensure_active};
use crate::domain::value_objects::FindingSeverity;
use crate::infrastructure::matcher::{
    find_matching_contract_endpoint, json_pointer_for_operation, normalize_path,
};
use crate::infrastructure::security::SecurityVerifier;

use super::parameters::validate_parameters;
use super::request_body::validate_request_body;
use super::responses::validate_responses;

/// Runs every structural check for one implemented endpoint
pub struct DeepValidator {
    security: Arc<SecurityVerifier>,
}

impl DeepValidator {
    pub fn new(security: Arc<SecurityVerifier>) -> Self {
        Self { security }
    }

    /// Match the endpoint, then check parameters, request body, responses and
    /// security, in that order. An unmatched endpoint yields a single finding.
    #[instrument(skip_all, fields(endpoint = %endpoint.label()))]
    pub fn validate_endpoint_against_contract(
        &self,
        endpoint: &ImplementedEndpoint,
        contract: &Contract,
        cancel: &CancellationToken,
    ) -> Result<Vec<Finding>, ContractError> {
        ensure_active(cancel)?;

        let Some(contract_endpoint) = find_matching_contract_endpoint(endpoint, contract) else {
            debug!("No contract operation for endpoint");
            let location = endpoint.source_file.display().to_string();
            return Ok(vec![
                Finding::mismatch(
                    FindingSeverity::Medium,
                    &location,
                    format!(
                        "Endpoint {} {} not found in contract {}",
                        endpoint.method.to_uppercase(),
                        endpoint.path,
                        contract.source_location.display()
                    ),
                    json_pointer_for_operation(&normalize_path(&endpoint.path), &endpoint.method),
                )
                .with_fix(format!(
                    "Document endpoint {} in the contract or remove it",
                    endpoint.label()
                )),
            ]);
        };

        let mut findings = validate_parameters(endpoint, contract_endpoint, cancel)?;
        findings.extend(validate_request_body(endpoint, contract_endpoint, cancel)?);
        findings.extend(validate_responses(endpoint, contract_endpoint, cancel)?);
        findings.extend(
            self.security
                .validate_security(endpoint, contract_endpoint, cancel)?,
        );

        debug!(findings = findings.len(), "Endpoint validated");
        Ok(findings)
    }
}

impl Default for DeepValidator {
    fn default() -> Self {
        Self::new(Arc::new(SecurityVerifier::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ContractEndpoint;
    use crate::domain::value_objects::{ContractResponse, FindingType, SpecVersion};
    use std::collections::BTreeMap;
    use std::path::Path;

    fn contract() -> Contract {
        let endpoint = ContractEndpoint {
            method: "GET".to_string(),
            path: "/users/{id}".to_string(),
            operation_id: Some("getUser".to_string()),
            parameters: vec![],
            request_body: None,
            responses: BTreeMap::from([(
                "200".to_string(),
                ContractResponse {
                    description: "ok".to_string(),
                    ..Default::default()
                },
            )]),
            security: vec![],
        };
        Contract::new(SpecVersion::V3_0, "3.0.3", Path::new("openapi.yaml"), vec![endpoint])
    }

    #[test]
    fn unmatched_endpoint_yields_single_medium() {
        let endpoint = ImplementedEndpoint::new("DELETE", "/users/:id", "users.go");

        let findings = DeepValidator::default()
            .validate_endpoint_against_contract(&endpoint, &contract(), &CancellationToken::new())
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].finding_type, FindingType::ContractMismatch);
        assert_eq!(findings[0].severity, FindingSeverity::Medium);
        assert_eq!(findings[0].contract_pointer, "#/paths/~1users~1{id}/delete");
        assert!(findings[0].issue.contains("openapi.yaml"));
    }

    #[test]
    fn conforming_endpoint_has_no_findings() {
        let endpoint = ImplementedEndpoint::new("get", "/users/:id", "users.go").with_response(200);

        let findings = DeepValidator::default()
            .validate_endpoint_against_contract(&endpoint, &contract(), &CancellationToken::new())
            .unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn cancellation_discards_findings() {
        let token = CancellationToken::new();
        token.cancel();
        let endpoint = ImplementedEndpoint::new("GET", "/users/:id", "users.go");

        let result =
            DeepValidator::default().validate_endpoint_against_contract(&endpoint, &contract(), &token);
        assert!(matches!(result, Err(ContractError::Cancelled)));
    }
}
