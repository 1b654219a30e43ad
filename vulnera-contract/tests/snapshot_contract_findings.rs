//! Snapshot tests for contract validation findings

mod common;

use std::path::Path;
use tokio_util::sync::CancellationToken;

use common::USERS_OPENAPI;
use vulnera_contract::domain::ImplementedEndpoint;
use vulnera_contract::domain::value_objects::{ImplParameter, ParameterLocation};
use vulnera_contract::infrastructure::parser::ContractLoader;
use vulnera_contract::DeepValidator;

#[test]
fn test_contract_findings_snapshot() {
    let token = CancellationToken::new();
    let contract =
        ContractLoader::parse(USERS_OPENAPI.as_bytes(), Path::new("openapi.yaml"), &token)
            .unwrap();
    let endpoint = ImplementedEndpoint::new("GET", "/users/:id", "handlers/users.go")
        .with_parameter(ImplParameter::new("id", ParameterLocation::Path, "string"))
        .with_response(200);

    let findings = DeepValidator::default()
        .validate_endpoint_against_contract(&endpoint, &contract, &token)
        .unwrap();

    insta::assert_json_snapshot!("contract_findings", findings);
}
