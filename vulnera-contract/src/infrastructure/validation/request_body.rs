//! Request body conformance checks

use tokio_util::sync::CancellationToken;

use crate::domain::entities::{ContractEndpoint, Finding, ImplementedEndpoint};
use crate::domain::errors::{ContractError, ensure_active};
use crate::domain::value_objects::FindingSeverity;
use crate::infrastructure::matcher::json_pointer_for_operation;

pub fn validate_request_body(
    endpoint: &ImplementedEndpoint,
    contract_endpoint: &ContractEndpoint,
    cancel: &CancellationToken,
) -> Result<Vec<Finding>, ContractError> {
    ensure_active(cancel)?;

    let mut findings = Vec::new();
    let Some(body) = contract_endpoint.request_body.as_ref() else {
        return Ok(findings);
    };

    let location = endpoint.source_file.display().to_string();
    let body_pointer = format!(
        "{}/requestBody",
        json_pointer_for_operation(&contract_endpoint.path, &contract_endpoint.method)
    );
    let has_body = endpoint.has_body_parameter();

    if body.required && !has_body {
        findings.push(
            Finding::mismatch(
                FindingSeverity::High,
                &location,
                format!("Required request body missing in endpoint {}", endpoint.label()),
                body_pointer.clone(),
            )
            .with_fix(format!(
                "Add request body handling to endpoint {}",
                endpoint.label()
            )),
        );
    }

    if body.content_types.is_empty() {
        return Ok(findings);
    }

    let expected = body.media_types();
    let evidenced = if has_body {
        endpoint.content_types.is_empty()
            || endpoint
                .content_types
                .iter()
                .any(|declared| expected.iter().any(|ct| same_media_type(ct, declared)))
    } else {
        !body.required
    };

    if !evidenced {
        let mut finding = Finding::mismatch(
            FindingSeverity::High,
            &location,
            format!(
                "Request body content types defined in contract but not handled in endpoint {}",
                endpoint.label()
            ),
            format!("{body_pointer}/content"),
        )
        .with_fix(format!(
            "Add request body handling with content types: {}",
            expected.join(", ")
        ))
        .with_detail("expected_content_types", expected.join(", "));

        if !endpoint.content_types.is_empty() {
            finding = finding.with_detail("declared_content_types", endpoint.content_types.join(", "));
        }
        findings.push(finding);
    }

    Ok(findings)
}

/// Compare media types ignoring case and parameters such as `charset`
fn same_media_type(a: &str, b: &str) -> bool {
    let essence = |s: &str| s.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence(a) == essence(b)
}
