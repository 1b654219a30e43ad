//! Schema reference resolver
//!
//! Turns JSON schema fragments into [`ContractSchema`] values, resolving `$ref`
//! pointers against the owning document with cycle and depth protection.

use crate::domain::value_objects::ContractSchema;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

use super::document::SpecDocument;

/// Maximum depth for schema resolution to prevent infinite recursion
const MAX_RESOLUTION_DEPTH: usize = 50;

/// Resolver for schema references within one document
pub struct SchemaRefResolver<'a> {
    document: &'a SpecDocument,
    /// Resolved schemas by reference path
    cache: HashMap<String, ContractSchema>,
    /// References currently being resolved
    resolving: HashSet<String>,
    depth: usize,
}

impl<'a> SchemaRefResolver<'a> {
    pub fn new(document: &'a SpecDocument) -> Self {
        Self {
            document,
            cache: HashMap::new(),
            resolving: HashSet::new(),
            depth: 0,
        }
    }

    /// Resolve a schema reference
    ///
    /// Returns `None` for circular references, when the depth limit is hit,
    /// or when the pointer does not exist.
    pub fn resolve_ref(&mut self, ref_path: &str) -> Option<ContractSchema> {
        if self.depth >= MAX_RESOLUTION_DEPTH {
            warn!(
                ref_path = ref_path,
                max_depth = MAX_RESOLUTION_DEPTH,
                "Maximum schema resolution depth exceeded"
            );
            return None;
        }

        if self.resolving.contains(ref_path) {
            warn!(ref_path = ref_path, "Circular schema reference detected");
            return None;
        }

        if let Some(cached) = self.cache.get(ref_path) {
            return Some(cached.clone());
        }

        let Some(schema_json) = self.document.resolve_pointer(ref_path) else {
            warn!(ref_path = ref_path, "Schema reference not found in document");
            return None;
        };

        self.resolving.insert(ref_path.to_string());
        self.depth += 1;

        let schema = self.parse_schema_from_json(schema_json);

        self.depth -= 1;
        self.resolving.remove(ref_path);

        self.cache.insert(ref_path.to_string(), schema.clone());
        Some(schema)
    }

    /// Parse a schema fragment, following `$ref` when present
    pub fn parse_schema_from_json(&mut self, schema_json: &JsonValue) -> ContractSchema {
        if let Some(ref_path) = schema_json.get("$ref").and_then(|r| r.as_str()) {
            return self.resolve_ref(ref_path).unwrap_or_else(|| ContractSchema {
                schema_type: Some("ref_unresolved".to_string()),
                ..Default::default()
            });
        }

        let schema_type = Self::declared_type(schema_json).or_else(|| {
            // allOf compositions carry the type on a member
            schema_json
                .get("allOf")
                .and_then(|all| all.as_array())
                .and_then(|members| {
                    members
                        .iter()
                        .map(|member| self.parse_schema_from_json(member))
                        .find_map(|member| member.schema_type)
                })
        });

        let format = schema_json
            .get("format")
            .and_then(|f| f.as_str())
            .map(|s| s.to_string());

        let required: Vec<String> = schema_json
            .get("required")
            .and_then(|r| r.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let properties: BTreeMap<String, ContractSchema> = schema_json
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop_schema)| (name.clone(), self.parse_schema_from_json(prop_schema)))
                    .collect()
            })
            .unwrap_or_default();

        let items = schema_json
            .get("items")
            .filter(|i| i.is_object())
            .map(|i| Box::new(self.parse_schema_from_json(i)));

        ContractSchema {
            schema_type,
            format,
            properties,
            required,
            items,
        }
    }

    /// `type` may be a string or (3.1) an array including `"null"`
    fn declared_type(schema_json: &JsonValue) -> Option<String> {
        match schema_json.get("type")? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Array(types) => types
                .iter()
                .filter_map(|t| t.as_str())
                .find(|t| *t != "null")
                .map(|t| t.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> SpecDocument {
        SpecDocument::from_value(json!({
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "required": ["id"],
                        "properties": {
                            "id": {"type": "integer"},
                            "manager": {"$ref": "#/components/schemas/User"}
                        }
                    }
                }
            },
            "definitions": {
                "Pet": {"type": ["string", "null"]}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_resolves_components_and_definitions() {
        let doc = document();
        let mut resolver = SchemaRefResolver::new(&doc);

        let user = resolver.resolve_ref("#/components/schemas/User").unwrap();
        assert_eq!(user.schema_type.as_deref(), Some("object"));
        assert_eq!(user.required, vec!["id"]);
        assert_eq!(user.properties["id"].schema_type.as_deref(), Some("integer"));

        let pet = resolver.resolve_ref("#/definitions/Pet").unwrap();
        assert_eq!(pet.schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_circular_reference_is_cut() {
        let doc = document();
        let mut resolver = SchemaRefResolver::new(&doc);

        let user = resolver.resolve_ref("#/components/schemas/User").unwrap();
        let manager = &user.properties["manager"];
        assert_eq!(manager.schema_type.as_deref(), Some("ref_unresolved"));
    }

    #[test]
    fn test_max_depth_check() {
        let doc = document();
        let mut resolver = SchemaRefResolver::new(&doc);
        resolver.depth = MAX_RESOLUTION_DEPTH;

        assert!(resolver.resolve_ref("#/components/schemas/User").is_none());
    }

    #[test]
    fn test_all_of_type_is_inherited() {
        let doc = document();
        let mut resolver = SchemaRefResolver::new(&doc);

        let schema = resolver.parse_schema_from_json(&json!({
            "allOf": [{"$ref": "#/components/schemas/User"}, {"description": "extended"}]
        }));
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
    }
}
