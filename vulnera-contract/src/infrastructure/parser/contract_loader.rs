//! Contract loader: raw bytes -> version-aware [`Contract`]

use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::entities::Contract;
use crate::domain::errors::{ContractError, ensure_active};
use crate::domain::value_objects::SpecVersion;

use super::document::SpecDocument;
use super::openapi_v3::OpenApiV3Adapter;
use super::swagger_v2::Swagger2Adapter;

/// Loader for OpenAPI 3.x and Swagger 2.0 contracts
pub struct ContractLoader;

impl ContractLoader {
    /// Read and parse a contract file
    pub fn parse_file(path: &Path, cancel: &CancellationToken) -> Result<Contract, ContractError> {
        ensure_active(cancel)?;
        let bytes = std::fs::read(path).map_err(|e| {
            error!(error = %e, file = %path.display(), "Failed to read contract file");
            ContractError::io(path, e)
        })?;
        Self::parse(&bytes, path, cancel)
    }

    /// Parse contract bytes
    ///
    /// A 3.x model is attempted first, then 2.0. When neither builds the
    /// contract is returned with version `unknown` and no endpoints; only
    /// malformed YAML/JSON is an error.
    pub fn parse(
        bytes: &[u8],
        source_location: &Path,
        cancel: &CancellationToken,
    ) -> Result<Contract, ContractError> {
        ensure_active(cancel)?;
        info!(file = %source_location.display(), "Parsing API contract");

        let document = SpecDocument::parse(bytes).map_err(|e| {
            error!(
                error = %e,
                file = %source_location.display(),
                "Failed to parse contract document"
            );
            ContractError::parse(e.to_string(), source_location.display().to_string())
        })?;
        let version_label = document.version_label().unwrap_or_default().to_string();

        let v3_error = match document.build_v3_model() {
            Ok(spec) => {
                let endpoints = OpenApiV3Adapter::new(&document).extract_endpoints(&spec, cancel)?;
                let version = SpecVersion::from_openapi_label(&spec.openapi);
                debug!(version = %version, endpoints = endpoints.len(), "Built OpenAPI 3.x contract");
                return Ok(Contract::new(version, spec.openapi.clone(), source_location, endpoints));
            }
            Err(e) => e,
        };

        ensure_active(cancel)?;
        let v2_error = match document.build_v2_model() {
            Ok(spec) => {
                let endpoints = Swagger2Adapter::new(&document).extract_endpoints(&spec, cancel)?;
                debug!(endpoints = endpoints.len(), "Built Swagger 2.0 contract");
                return Ok(Contract::new(SpecVersion::V2_0, spec.swagger.clone(), source_location, endpoints));
            }
            Err(e) => e,
        };

        warn!(
            file = %source_location.display(),
            version = %version_label,
            v3_error = %v3_error,
            v2_error = %v2_error,
            "Unrecognized contract version, no endpoints extracted"
        );
        Ok(Contract::new(
            SpecVersion::Unknown,
            version_label,
            source_location,
            Vec::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ParameterLocation;

    const USERS_V3: &str = r##"
openapi: 3.0.3
info:
  title: Users
  version: "1.0"
security:
  - BearerAuth: []
paths:
  /users/{id}:
    parameters:
      - $ref: "#/components/parameters/UserId"
    get:
      operationId: getUser
      parameters:
        - name: verbose
          in: query
          schema:
            type: boolean
      responses:
        "200":
          $ref: "#/components/responses/UserResponse"
        "404":
          description: Not found
    delete:
      security: []
      responses:
        "204":
          description: Deleted
  /users:
    post:
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: "#/components/schemas/User"
      responses:
        "201":
          description: Created
components:
  parameters:
    UserId:
      name: id
      in: path
      required: true
      schema:
        type: integer
  responses:
    UserResponse:
      description: A user
      content:
        application/json:
          schema:
            $ref: "#/components/schemas/User"
  schemas:
    User:
      type: object
      required: [name]
      properties:
        name:
          type: string
  securitySchemes:
    BearerAuth:
      type: http
      scheme: bearer
"##;

    fn load(content: &str) -> Result<Contract, ContractError> {
        ContractLoader::parse(
            content.as_bytes(),
            Path::new("openapi.yaml"),
            &CancellationToken::new(),
        )
    }

    #[test]
    fn test_parses_openapi_v3_contract() {
        let contract = load(USERS_V3).unwrap();

        assert_eq!(contract.spec_version, SpecVersion::V3_0);
        assert_eq!(contract.version_label, "3.0.3");
        assert_eq!(contract.endpoints.len(), 3);

        let get = contract
            .endpoints
            .iter()
            .find(|e| e.method == "GET")
            .unwrap();
        assert_eq!(get.path, "/users/{id}");
        assert_eq!(get.operation_id.as_deref(), Some("getUser"));

        let id = get.find_parameter("id", ParameterLocation::Path).unwrap();
        assert!(id.required);
        assert_eq!(id.schema.as_ref().unwrap().schema_type.as_deref(), Some("integer"));
        assert!(get.find_parameter("verbose", ParameterLocation::Query).is_some());

        let ok = &get.responses["200"];
        assert_eq!(ok.description, "A user");
        assert_eq!(ok.media_types(), vec!["application/json"]);
        assert_eq!(get.required_schemes(), vec!["BearerAuth"]);
    }

    #[test]
    fn test_request_body_and_security_override() {
        let contract = load(USERS_V3).unwrap();

        let post = contract
            .endpoints
            .iter()
            .find(|e| e.method == "POST")
            .unwrap();
        let body = post.request_body.as_ref().unwrap();
        assert!(body.required);
        let schema = body.content_types["application/json"].as_ref().unwrap();
        assert_eq!(schema.required, vec!["name"]);

        let delete = contract
            .endpoints
            .iter()
            .find(|e| e.method == "DELETE")
            .unwrap();
        assert!(delete.security.is_empty());
    }

    #[test]
    fn test_json_contract() {
        let contract = load(
            r#"{"openapi": "3.1.0", "info": {"title": "t", "version": "1"},
                "paths": {"/health": {"get": {"responses": {"200": {"description": "ok"}}}}}}"#,
        )
        .unwrap();

        assert_eq!(contract.spec_version, SpecVersion::V3_1);
        assert_eq!(contract.endpoints.len(), 1);
        assert_eq!(contract.endpoints[0].method, "GET");
    }

    #[test]
    fn test_v30_boolean_exclusive_minimum_still_builds() {
        let contract = load(
            r##"
openapi: 3.0.3
info:
  title: Orders
  version: "1.0"
paths:
  /orders/{id}:
    get:
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: integer
            minimum: 0
            exclusiveMinimum: true
      responses:
        "200":
          description: An order
"##,
        )
        .unwrap();

        assert_eq!(contract.spec_version, SpecVersion::V3_0);
        assert_eq!(contract.endpoints.len(), 1);
        let id = contract.endpoints[0]
            .find_parameter("id", ParameterLocation::Path)
            .unwrap();
        assert_eq!(id.schema.as_ref().unwrap().schema_type.as_deref(), Some("integer"));
    }

    #[test]
    fn test_unknown_version_yields_empty_contract() {
        let contract = load("openapi: 4.0.0\ninfo:\n  title: t\n  version: '1'\npaths: {}\n").unwrap();

        assert_eq!(contract.spec_version, SpecVersion::Unknown);
        assert_eq!(contract.version_label, "4.0.0");
        assert!(contract.endpoints.is_empty());
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let err = load("openapi: [3.0\n  paths: {").unwrap_err();
        assert!(matches!(err, ContractError::Parse { .. }));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = ContractLoader::parse(USERS_V3.as_bytes(), Path::new("openapi.yaml"), &cancel)
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
