//! Tests for the async contract validation module

mod common;

use tokio_util::sync::CancellationToken;

use common::{GO_BEARER_HANDLER, PETS_SWAGGER, USERS_OPENAPI, write_fixture};
use vulnera_contract::domain::value_objects::{ImplParameter, ParameterLocation, SpecVersion};
use vulnera_contract::{
    ContractValidationModule, ContractValidationRequest, FindingSeverity, ImplementedEndpoint,
    ModuleExecutionError,
};

#[test]
fn test_discover_contract_prefers_root_then_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    let module = ContractValidationModule::new();
    assert!(module.discover_contract(dir.path()).is_none());

    let nested = write_fixture(dir.path(), "docs/swagger.json", "{}");
    assert_eq!(module.discover_contract(dir.path()), Some(nested));

    let root = write_fixture(dir.path(), "openapi.yml", USERS_OPENAPI);
    assert_eq!(module.discover_contract(dir.path()), Some(root));
}

#[tokio::test]
async fn test_execute_discovers_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "api/openapi.yaml", USERS_OPENAPI);
    let handler = write_fixture(dir.path(), "handlers/users.go", GO_BEARER_HANDLER);

    let module = ContractValidationModule::new();
    let report = module
        .execute(
            ContractValidationRequest {
                project_root: dir.path().to_path_buf(),
                contract_path: None,
                endpoints: vec![
                    ImplementedEndpoint::new("GET", "/users/:id", &handler)
                        .with_parameter(ImplParameter::new("id", ParameterLocation::Path, "int"))
                        .with_response(200),
                ],
            },
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.spec_version, SpecVersion::V3_0);
    assert_eq!(report.endpoints_checked, 1);
    assert_eq!(report.count_by_severity(FindingSeverity::Critical), 0);
    assert_eq!(report.count_by_severity(FindingSeverity::High), 0);
    assert_eq!(module.cache().stats().total, 1);
}

#[tokio::test]
async fn test_execute_with_explicit_contract_path() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "contracts/pets.yaml", PETS_SWAGGER);

    let report = ContractValidationModule::new()
        .execute(
            ContractValidationRequest {
                project_root: dir.path().to_path_buf(),
                contract_path: Some("contracts/pets.yaml".into()),
                endpoints: vec![ImplementedEndpoint::new("GET", "/pets", "handlers/pets.go")],
            },
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.spec_version, SpecVersion::V2_0);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.score, 95);
}

#[tokio::test]
async fn test_execute_without_contract_is_empty() {
    let dir = tempfile::tempdir().unwrap();

    let report = ContractValidationModule::new()
        .execute(
            ContractValidationRequest {
                project_root: dir.path().to_path_buf(),
                contract_path: None,
                endpoints: vec![ImplementedEndpoint::new("GET", "/users", "users.go")],
            },
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.findings.is_empty());
    assert_eq!(report.score, 100);
    assert_eq!(report.spec_version, SpecVersion::Unknown);
}

#[tokio::test]
async fn test_execute_rejects_missing_project_root() {
    let dir = tempfile::tempdir().unwrap();

    let err = ContractValidationModule::new()
        .execute(
            ContractValidationRequest {
                project_root: dir.path().join("nope"),
                contract_path: None,
                endpoints: vec![],
            },
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ModuleExecutionError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_execute_propagates_cancellation() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "openapi.yaml", USERS_OPENAPI);
    let token = CancellationToken::new();
    token.cancel();

    let err = ContractValidationModule::new()
        .execute(
            ContractValidationRequest {
                project_root: dir.path().to_path_buf(),
                contract_path: None,
                endpoints: vec![],
            },
            token,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ModuleExecutionError::Contract(e) if e.is_cancelled()));
}
