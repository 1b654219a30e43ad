//! Contract validation domain entities

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::value_objects::*;

/// Parsed, version-independent API contract
///
/// Immutable once built by the loader; shared as `Arc<Contract>` through the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub spec_version: SpecVersion,
    /// Raw `openapi`/`swagger` label as written in the document
    pub version_label: String,
    pub source_location: PathBuf,
    pub endpoints: Vec<ContractEndpoint>,
}

impl Contract {
    pub fn new(
        spec_version: SpecVersion,
        version_label: impl Into<String>,
        source_location: &Path,
        endpoints: Vec<ContractEndpoint>,
    ) -> Self {
        Self {
            spec_version,
            version_label: version_label.into(),
            source_location: source_location.to_path_buf(),
            endpoints,
        }
    }
}

/// One operation (method + path) declared by the contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractEndpoint {
    /// Upper-case HTTP method
    pub method: String,
    /// Path in contract notation, e.g. `/users/{id}`
    pub path: String,
    pub operation_id: Option<String>,
    pub parameters: Vec<ContractParameter>,
    pub request_body: Option<ContractRequestBody>,
    /// Status code (or `default`) -> response
    pub responses: BTreeMap<String, ContractResponse>,
    pub security: Vec<ContractSecurity>,
}

impl ContractEndpoint {
    /// Every scheme named by any security requirement, deduplicated in declaration order
    pub fn required_schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = Vec::new();
        for requirement in &self.security {
            for scheme in &requirement.schemes {
                if !schemes.contains(scheme) {
                    schemes.push(scheme.clone());
                }
            }
        }
        schemes
    }

    pub fn find_parameter(
        &self,
        name: &str,
        location: ParameterLocation,
    ) -> Option<&ContractParameter> {
        self.parameters
            .iter()
            .find(|p| p.name == name && p.location == location)
    }
}

/// Endpoint as discovered in the implementation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementedEndpoint {
    pub method: String,
    /// Path in implementation notation, e.g. `/users/:id`
    pub path: String,
    pub source_file: PathBuf,
    #[serde(default)]
    pub parameters: Vec<ImplParameter>,
    #[serde(default)]
    pub responses: Vec<ImplResponse>,
    #[serde(default)]
    pub declared_auth_schemes: Vec<String>,
    /// Request media types the handler declares it accepts (may be empty)
    #[serde(default)]
    pub content_types: Vec<String>,
}

impl ImplementedEndpoint {
    pub fn new(method: &str, path: &str, source_file: impl Into<PathBuf>) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            source_file: source_file.into(),
            parameters: Vec::new(),
            responses: Vec::new(),
            declared_auth_schemes: Vec::new(),
            content_types: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: ImplParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_response(mut self, status_code: u16) -> Self {
        self.responses.push(ImplResponse { status_code });
        self
    }

    pub fn with_auth_scheme(mut self, scheme: &str) -> Self {
        self.declared_auth_schemes.push(scheme.to_string());
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_types.push(content_type.to_string());
        self
    }

    pub fn has_body_parameter(&self) -> bool {
        self.parameters
            .iter()
            .any(|p| p.location == ParameterLocation::Body)
    }

    pub fn emits_status(&self, status_code: &str) -> bool {
        self.responses
            .iter()
            .any(|r| r.status_code.to_string() == status_code)
    }

    /// `METHOD path` label used in finding messages
    pub fn label(&self) -> String {
        format!("{} {}", self.method.to_uppercase(), self.path)
    }
}

/// A single conformance finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    pub location: String,
    pub issue: String,
    pub severity: FindingSeverity,
    pub contract_pointer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl Finding {
    pub fn new(
        finding_type: FindingType,
        severity: FindingSeverity,
        location: impl Into<String>,
        issue: impl Into<String>,
        contract_pointer: impl Into<String>,
    ) -> Self {
        Self {
            finding_type,
            location: location.into(),
            issue: issue.into(),
            severity,
            contract_pointer: contract_pointer.into(),
            code_location: None,
            suggested_fix: None,
            details: BTreeMap::new(),
        }
    }

    /// Shorthand for the common `contract_mismatch` finding
    pub fn mismatch(
        severity: FindingSeverity,
        location: impl Into<String>,
        issue: impl Into<String>,
        contract_pointer: impl Into<String>,
    ) -> Self {
        Self::new(
            FindingType::ContractMismatch,
            severity,
            location,
            issue,
            contract_pointer,
        )
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    pub fn with_code_location(mut self, code_location: impl Into<String>) -> Self {
        self.code_location = Some(code_location.into());
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_schemes_are_flattened_and_deduplicated() {
        let endpoint = ContractEndpoint {
            method: "GET".to_string(),
            path: "/users".to_string(),
            operation_id: None,
            parameters: vec![],
            request_body: None,
            responses: BTreeMap::new(),
            security: vec![
                ContractSecurity {
                    schemes: vec!["BearerAuth".to_string(), "ApiKeyAuth".to_string()],
                    scopes: vec![],
                },
                ContractSecurity {
                    schemes: vec!["BearerAuth".to_string()],
                    scopes: vec!["read".to_string()],
                },
            ],
        };

        assert_eq!(endpoint.required_schemes(), vec!["BearerAuth", "ApiKeyAuth"]);
    }

    #[test]
    fn finding_serializes_type_field() {
        let finding = Finding::mismatch(
            FindingSeverity::High,
            "handlers/users.go",
            "issue",
            "#/paths/~1users/get",
        )
        .with_detail("scheme", "BearerAuth");

        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["type"], "contract_mismatch");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["details"]["scheme"], "BearerAuth");
        assert!(json.get("suggested_fix").is_none());
    }
}
