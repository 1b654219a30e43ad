//! Contract validation value objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Version of the specification a contract was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecVersion {
    #[serde(rename = "2.0")]
    V2_0,
    #[serde(rename = "3.0")]
    V3_0,
    #[serde(rename = "3.1")]
    V3_1,
    #[serde(rename = "3.2")]
    V3_2,
    #[serde(rename = "unknown")]
    Unknown,
}

impl SpecVersion {
    /// Classify a 3.x version label (`openapi` field)
    pub fn from_openapi_label(label: &str) -> Self {
        if label.starts_with("3.2") {
            SpecVersion::V3_2
        } else if label.starts_with("3.1") {
            SpecVersion::V3_1
        } else if label.starts_with("3.") {
            SpecVersion::V3_0
        } else {
            SpecVersion::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecVersion::V2_0 => "2.0",
            SpecVersion::V3_0 => "3.0",
            SpecVersion::V3_1 => "3.1",
            SpecVersion::V3_2 => "3.2",
            SpecVersion::Unknown => "unknown",
        }
    }

    pub fn is_v3(&self) -> bool {
        matches!(
            self,
            SpecVersion::V3_0 | SpecVersion::V3_1 | SpecVersion::V3_2
        )
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter location, shared by contract and implementation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl ParameterLocation {
    /// Parse an `in` value; `formData` has no counterpart here and yields `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            "body" => Some(ParameterLocation::Body),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Body => "body",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a schema's declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Unknown,
}

impl SchemaKind {
    fn from_type_name(name: &str) -> Self {
        match name {
            "string" => SchemaKind::String,
            "integer" => SchemaKind::Integer,
            "number" => SchemaKind::Number,
            "boolean" => SchemaKind::Boolean,
            "array" => SchemaKind::Array,
            "object" => SchemaKind::Object,
            _ => SchemaKind::Unknown,
        }
    }

    /// Type name as reported by implementation metadata
    pub fn implementation_type(&self) -> Option<&'static str> {
        match self {
            SchemaKind::String => Some("string"),
            SchemaKind::Integer | SchemaKind::Number => Some("int"),
            SchemaKind::Boolean => Some("bool"),
            SchemaKind::Array => Some("array"),
            SchemaKind::Object => Some("object"),
            SchemaKind::Unknown => None,
        }
    }
}

/// Structural view of a JSON schema, enough to compare types
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractSchema {
    pub schema_type: Option<String>,
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ContractSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ContractSchema>>,
}

impl ContractSchema {
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> SchemaKind {
        self.schema_type
            .as_deref()
            .map(SchemaKind::from_type_name)
            .unwrap_or(SchemaKind::Unknown)
    }
}

/// Parameter declared by the contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractParameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<ContractSchema>,
    #[serde(default)]
    pub description: String,
}

/// Request body declared by the contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractRequestBody {
    pub required: bool,
    /// Media type -> schema (if one is declared)
    pub content_types: BTreeMap<String, Option<ContractSchema>>,
}

impl ContractRequestBody {
    pub fn media_types(&self) -> Vec<String> {
        self.content_types.keys().cloned().collect()
    }
}

/// Response declared by the contract for one status code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractResponse {
    #[serde(default)]
    pub description: String,
    pub content_types: BTreeMap<String, Option<ContractSchema>>,
    #[serde(default)]
    pub headers: BTreeMap<String, Option<ContractSchema>>,
}

impl ContractResponse {
    pub fn media_types(&self) -> Vec<String> {
        self.content_types.keys().cloned().collect()
    }
}

/// One security requirement object, flattened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSecurity {
    pub schemes: Vec<String>,
    pub scopes: Vec<String>,
}

/// Parameter observed in the implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplParameter {
    pub name: String,
    pub location: ParameterLocation,
    /// Implementation data type (`string`, `int`, `bool`, `array`, `object`); empty when unknown
    #[serde(default)]
    pub data_type: String,
}

impl ImplParameter {
    pub fn new(name: &str, location: ParameterLocation, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            location,
            data_type: data_type.to_string(),
        }
    }
}

/// Status code the implementation is statically known to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplResponse {
    pub status_code: u16,
}

/// Category of a detected security pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    Authentication,
    Authorization,
    RateLimit,
    Cors,
}

/// Evidence that the implementation enforces some security mechanism
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityPattern {
    pub category: PatternCategory,
    pub scheme_guess: String,
    pub location: String,
    pub confidence: f64,
}

/// Finding category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    ContractMismatch,
    MissingAuth,
    MissingValidation,
    MissingErrorHandling,
    Info,
}

/// Finding severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl FindingSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingSeverity::Critical => "critical",
            FindingSeverity::High => "high",
            FindingSeverity::Medium => "medium",
            FindingSeverity::Low => "low",
            FindingSeverity::Info => "info",
        }
    }
}

impl fmt::Display for FindingSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_critical_first() {
        let mut severities = vec![
            FindingSeverity::Low,
            FindingSeverity::Critical,
            FindingSeverity::Info,
            FindingSeverity::Medium,
            FindingSeverity::High,
        ];
        severities.sort();
        assert_eq!(
            severities,
            vec![
                FindingSeverity::Critical,
                FindingSeverity::High,
                FindingSeverity::Medium,
                FindingSeverity::Low,
                FindingSeverity::Info,
            ]
        );
    }

    #[test]
    fn schema_kind_maps_to_implementation_types() {
        assert_eq!(ContractSchema::of_type("integer").kind().implementation_type(), Some("int"));
        assert_eq!(ContractSchema::of_type("number").kind().implementation_type(), Some("int"));
        assert_eq!(ContractSchema::of_type("boolean").kind().implementation_type(), Some("bool"));
        assert_eq!(ContractSchema::of_type("string").kind().implementation_type(), Some("string"));
        assert_eq!(ContractSchema::of_type("null").kind().implementation_type(), None);
        assert_eq!(ContractSchema::default().kind(), SchemaKind::Unknown);
    }

    #[test]
    fn spec_version_from_label() {
        assert_eq!(SpecVersion::from_openapi_label("3.0.3"), SpecVersion::V3_0);
        assert_eq!(SpecVersion::from_openapi_label("3.1.0"), SpecVersion::V3_1);
        assert_eq!(SpecVersion::from_openapi_label("3.2.0"), SpecVersion::V3_2);
        assert_eq!(SpecVersion::from_openapi_label("2.0"), SpecVersion::Unknown);
    }

    #[test]
    fn parameter_location_rejects_form_data() {
        assert_eq!(ParameterLocation::parse("Query"), Some(ParameterLocation::Query));
        assert_eq!(ParameterLocation::parse("formData"), None);
    }
}
