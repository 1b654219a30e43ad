//! JSON-level helpers shared by the 2.0 and 3.x adapters

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::domain::value_objects::{ContractParameter, ContractSecurity, ParameterLocation};

use super::document::SpecDocument;
use super::schema_resolver::SchemaRefResolver;

/// Read a `security` array from an object
///
/// `None` when the key is absent, so callers can fall back to document-level
/// requirements. An explicit empty array yields `Some(vec![])`.
pub(crate) fn security_from_json(value: &JsonValue) -> Option<Vec<ContractSecurity>> {
    let security_array = value.get("security")?.as_array()?;

    let requirements = security_array
        .iter()
        .filter_map(|item| item.as_object())
        .filter(|obj| !obj.is_empty())
        .map(|obj| {
            let mut requirement = ContractSecurity::default();
            for (scheme_name, scopes_value) in obj {
                requirement.schemes.push(scheme_name.clone());
                if let Some(scopes) = scopes_value.as_array() {
                    requirement
                        .scopes
                        .extend(scopes.iter().filter_map(|s| s.as_str().map(|s| s.to_string())));
                }
            }
            requirement
        })
        .collect();

    Some(requirements)
}

/// Operation security overrides the document-level requirements
pub(crate) fn effective_security(
    operation: Option<&JsonValue>,
    root: &JsonValue,
) -> Vec<ContractSecurity> {
    operation
        .and_then(security_from_json)
        .or_else(|| security_from_json(root))
        .unwrap_or_default()
}

/// Resolve a parameter entry (inline or `$ref`) into its JSON object
pub(crate) fn resolve_parameter_json<'a>(
    document: &'a SpecDocument,
    param: &'a JsonValue,
) -> Option<&'a JsonValue> {
    match document.follow_ref(param) {
        Ok(resolved) => Some(resolved),
        Err(e) => {
            warn!(error = %e, "Failed to resolve parameter reference");
            None
        }
    }
}

/// Build a non-body parameter from its JSON object
///
/// 3.x parameters carry a `schema`; 2.0 parameters declare `type`/`format`
/// inline, so the object itself is read as the schema in that case.
pub(crate) fn parameter_from_json(
    param_json: &JsonValue,
    resolver: &mut SchemaRefResolver<'_>,
) -> Option<ContractParameter> {
    let name = param_json.get("name").and_then(|v| v.as_str())?.to_string();
    let location_label = param_json.get("in").and_then(|v| v.as_str())?;
    let Some(location) = ParameterLocation::parse(location_label) else {
        warn!(
            parameter = %name,
            location = location_label,
            "Skipping parameter with unsupported location"
        );
        return None;
    };

    let required = param_json
        .get("required")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let schema = if let Some(schema_json) = param_json.get("schema") {
        Some(resolver.parse_schema_from_json(schema_json))
    } else if param_json.get("type").is_some() {
        Some(resolver.parse_schema_from_json(param_json))
    } else {
        None
    };

    let description = param_json
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Some(ContractParameter {
        name,
        location,
        required,
        schema,
        description,
    })
}

/// Merge path-item parameters with operation parameters
///
/// Operation entries replace path-level entries with the same `(name, in)`.
pub(crate) fn merge_parameters(
    path_level: Vec<ContractParameter>,
    operation_level: Vec<ContractParameter>,
) -> Vec<ContractParameter> {
    let mut merged: Vec<ContractParameter> = path_level
        .into_iter()
        .filter(|p| {
            !operation_level
                .iter()
                .any(|op| op.name == p.name && op.location == p.location)
        })
        .collect();
    merged.extend(operation_level);
    merged
}

/// Read a string array such as `consumes`/`produces`
pub(crate) fn string_list(value: Option<&JsonValue>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operation_security_overrides_root() {
        let root = json!({"security": [{"ApiKeyAuth": []}]});
        let op = json!({"security": [{"oauth2": ["read", "write"]}]});

        let security = effective_security(Some(&op), &root);
        assert_eq!(security.len(), 1);
        assert_eq!(security[0].schemes, vec!["oauth2"]);
        assert_eq!(security[0].scopes, vec!["read", "write"]);
    }

    #[test]
    fn missing_operation_security_inherits_root_and_empty_list_disables() {
        let root = json!({"security": [{"ApiKeyAuth": []}]});

        let inherited = effective_security(Some(&json!({})), &root);
        assert_eq!(inherited[0].schemes, vec!["ApiKeyAuth"]);

        let disabled = effective_security(Some(&json!({"security": []})), &root);
        assert!(disabled.is_empty());
    }

    #[test]
    fn merge_prefers_operation_parameters() {
        let path_param = ContractParameter {
            name: "id".to_string(),
            location: ParameterLocation::Path,
            required: true,
            schema: None,
            description: "path level".to_string(),
        };
        let op_param = ContractParameter {
            description: "operation level".to_string(),
            ..path_param.clone()
        };
        let other = ContractParameter {
            name: "trace".to_string(),
            location: ParameterLocation::Header,
            required: false,
            schema: None,
            description: String::new(),
        };

        let merged = merge_parameters(vec![path_param, other], vec![op_param]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "trace");
        assert_eq!(merged[1].description, "operation level");
    }
}
