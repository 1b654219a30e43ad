//! Response conformance checks

use tokio_util::sync::CancellationToken;

use crate::domain::entities::{ContractEndpoint, Finding, ImplementedEndpoint};
use crate::domain::errors::{ContractError, ensure_active};
use crate::domain::value_objects::{ContractResponse, FindingSeverity, FindingType};
use crate::infrastructure::matcher::json_pointer_for_operation;

/// Success codes the contract is expected to be able to return
const CANONICAL_SUCCESS_CODES: [&str; 3] = ["200", "201", "204"];

pub fn validate_responses(
    endpoint: &ImplementedEndpoint,
    contract_endpoint: &ContractEndpoint,
    cancel: &CancellationToken,
) -> Result<Vec<Finding>, ContractError> {
    ensure_active(cancel)?;

    let mut findings = Vec::new();
    let location = endpoint.source_file.display().to_string();
    let responses_pointer = format!(
        "{}/responses",
        json_pointer_for_operation(&contract_endpoint.path, &contract_endpoint.method)
    );

    if contract_endpoint.responses.is_empty() {
        findings.push(Finding::mismatch(
            FindingSeverity::Medium,
            &location,
            format!(
                "Contract does not define responses for endpoint {}",
                endpoint.label()
            ),
            responses_pointer,
        ));
        return Ok(findings);
    }

    let has_default = contract_endpoint.responses.contains_key("default");
    let mut seen_codes: Vec<u16> = Vec::new();

    for implemented in &endpoint.responses {
        ensure_active(cancel)?;

        let status_code = implemented.status_code;
        if seen_codes.contains(&status_code) {
            continue;
        }
        seen_codes.push(status_code);

        let code = status_code.to_string();
        let Some((documented_code, response)) = documented_response(contract_endpoint, status_code)
        else {
            if !has_default {
                findings.push(
                    Finding::mismatch(
                        FindingSeverity::High,
                        &location,
                        format!(
                            "Response status {} not documented in contract (expected: {})",
                            status_code,
                            expected_codes(contract_endpoint)
                        ),
                        responses_pointer.clone(),
                    )
                    .with_fix(format!(
                        "Add response status {status_code} to contract or remove from endpoint"
                    )),
                );
            }
            continue;
        };

        let media_types = response.media_types();
        if !media_types.is_empty() {
            findings.push(
                Finding::new(
                    FindingType::Info,
                    FindingSeverity::Low,
                    &location,
                    format!(
                        "Response {} should match contract content types: {}",
                        status_code,
                        media_types.join(", ")
                    ),
                    format!("{responses_pointer}/{documented_code}/content"),
                )
                .with_detail("expected_content_types", media_types.join(", "))
                .with_detail("status_code", code),
            );
        }
    }

    for status_code in CANONICAL_SUCCESS_CODES {
        let Some(response) = contract_endpoint.responses.get(status_code) else {
            continue;
        };
        if endpoint.emits_status(status_code) {
            continue;
        }

        findings.push(
            Finding::mismatch(
                FindingSeverity::Medium,
                &location,
                format!("Contract defines response {status_code} but endpoint may not return it"),
                format!("{responses_pointer}/{status_code}"),
            )
            .with_fix(format!(
                "Ensure endpoint {} can return status code {}",
                endpoint.label(),
                status_code
            ))
            .with_detail("expected_status", status_code)
            .with_detail("response_description", response.description.clone()),
        );
    }

    Ok(findings)
}

/// Exact code first, then an `NXX` range key such as `2XX`
fn documented_response(
    contract_endpoint: &ContractEndpoint,
    status_code: u16,
) -> Option<(String, &ContractResponse)> {
    let code = status_code.to_string();
    if let Some(response) = contract_endpoint.responses.get(&code) {
        return Some((code, response));
    }

    let range = format!("{}XX", status_code / 100);
    contract_endpoint
        .responses
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(&range))
        .map(|(key, response)| (key.clone(), response))
}

fn expected_codes(contract_endpoint: &ContractEndpoint) -> String {
    contract_endpoint
        .responses
        .keys()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
}
