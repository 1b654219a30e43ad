//! Parameter conformance checks

use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

use crate::domain::entities::{ContractEndpoint, Finding, ImplementedEndpoint};
use crate::domain::errors::{ContractError, ensure_active};
use crate::domain::value_objects::{FindingSeverity, ParameterLocation};
use crate::infrastructure::matcher::{escape_pointer_token, json_pointer_for_operation};

/// Compare declared parameters with the implementation's parameters
pub fn validate_parameters(
    endpoint: &ImplementedEndpoint,
    contract_endpoint: &ContractEndpoint,
    cancel: &CancellationToken,
) -> Result<Vec<Finding>, ContractError> {
    let mut findings = Vec::new();
    let location = endpoint.source_file.display().to_string();
    let operation_pointer =
        json_pointer_for_operation(&contract_endpoint.path, &contract_endpoint.method);

    for contract_param in &contract_endpoint.parameters {
        ensure_active(cancel)?;

        let param_pointer = format!(
            "{}/parameters/{}",
            operation_pointer,
            escape_pointer_token(&contract_param.name)
        );

        let implemented = endpoint
            .parameters
            .iter()
            .find(|p| p.name == contract_param.name && p.location == contract_param.location);

        let Some(implemented) = implemented else {
            if contract_param.required {
                findings.push(
                    Finding::mismatch(
                        FindingSeverity::High,
                        &location,
                        format!(
                            "Required parameter '{}' (in: {}) missing in endpoint {}",
                            contract_param.name,
                            contract_param.location,
                            endpoint.label()
                        ),
                        param_pointer,
                    )
                    .with_fix(format!(
                        "Add parameter '{}' to endpoint {}",
                        contract_param.name,
                        endpoint.label()
                    )),
                );
            }
            continue;
        };

        let expected_type = contract_param
            .schema
            .as_ref()
            .and_then(|schema| schema.kind().implementation_type());

        if let Some(expected) = expected_type
            && !implemented.data_type.is_empty()
            && implemented.data_type != expected
        {
            findings.push(
                Finding::mismatch(
                    FindingSeverity::High,
                    &location,
                    format!(
                        "Parameter '{}' type mismatch: contract expects {}, endpoint has {}",
                        contract_param.name, expected, implemented.data_type
                    ),
                    param_pointer,
                )
                .with_fix(format!(
                    "Change parameter '{}' type to {} to match contract",
                    contract_param.name, expected
                ))
                .with_detail("expected_type", expected)
                .with_detail("actual_type", implemented.data_type.clone())
                .with_detail("parameter_location", contract_param.location.as_str()),
            );
        }
    }

    // Body parameters are reconciled against the request body instead
    let has_contract_body = contract_endpoint.request_body.is_some();
    let mut reported: HashSet<(&str, ParameterLocation)> = HashSet::new();

    for implemented in &endpoint.parameters {
        ensure_active(cancel)?;

        if implemented.location == ParameterLocation::Body && has_contract_body {
            continue;
        }
        if contract_endpoint
            .find_parameter(&implemented.name, implemented.location)
            .is_some()
        {
            continue;
        }
        if !reported.insert((implemented.name.as_str(), implemented.location)) {
            continue;
        }

        findings.push(
            Finding::mismatch(
                FindingSeverity::Medium,
                &location,
                format!(
                    "Parameter '{}' (in: {}) exists in endpoint but not in contract",
                    implemented.name, implemented.location
                ),
                format!("{operation_pointer}/parameters"),
            )
            .with_fix(format!(
                "Add parameter '{}' to contract or remove from endpoint",
                implemented.name
            )),
        );
    }

    Ok(findings)
}
