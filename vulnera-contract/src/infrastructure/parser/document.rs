//! Raw specification document and version-specific model builders

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::swagger_v2::Swagger2Spec;

/// Maximum `$ref` hops followed for a single value
const MAX_REF_HOPS: usize = 50;

/// A YAML or JSON specification document, kept as a JSON tree
///
/// Reference resolution works on the raw tree so that 2.0 (`#/definitions/...`)
/// and 3.x (`#/components/...`) documents share one resolver.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    raw: JsonValue,
}

impl SpecDocument {
    /// Parse bytes as JSON when the first non-blank character is `{`, YAML otherwise
    pub fn parse(bytes: &[u8]) -> Result<Self, ResolveError> {
        let content = std::str::from_utf8(bytes).map_err(|e| ResolveError::Encoding {
            message: e.to_string(),
        })?;

        let raw: JsonValue = if content.trim_start().starts_with('{') {
            serde_json::from_str(content)?
        } else {
            serde_yml::from_str(content)?
        };

        if !raw.is_object() {
            return Err(ResolveError::NotAMapping);
        }

        Ok(Self { raw })
    }

    pub fn from_value(raw: JsonValue) -> Result<Self, ResolveError> {
        if !raw.is_object() {
            return Err(ResolveError::NotAMapping);
        }
        Ok(Self { raw })
    }

    pub fn raw(&self) -> &JsonValue {
        &self.raw
    }

    /// The `openapi` or `swagger` label, whichever is present
    pub fn version_label(&self) -> Option<&str> {
        self.raw
            .get("openapi")
            .or_else(|| self.raw.get("swagger"))
            .and_then(|v| v.as_str())
    }

    /// Look up a local reference such as `#/components/schemas/User`
    pub fn resolve_pointer(&self, ref_path: &str) -> Option<&JsonValue> {
        let pointer = ref_path.strip_prefix('#')?;
        if pointer.is_empty() {
            return Some(&self.raw);
        }
        self.raw.pointer(pointer)
    }

    /// Follow `$ref` chains until a concrete object is reached
    pub fn follow_ref<'a>(&'a self, value: &'a JsonValue) -> Result<&'a JsonValue, ResolveError> {
        let mut current = value;
        let mut seen: Vec<&str> = Vec::new();

        for _ in 0..MAX_REF_HOPS {
            let Some(ref_path) = current.get("$ref").and_then(|r| r.as_str()) else {
                return Ok(current);
            };
            if seen.contains(&ref_path) {
                warn!(ref_path = ref_path, "Circular reference detected");
                return Err(ResolveError::CircularReference {
                    ref_path: ref_path.to_string(),
                });
            }
            seen.push(ref_path);
            current = self
                .resolve_pointer(ref_path)
                .ok_or_else(|| ResolveError::UnresolvedReference {
                    ref_path: ref_path.to_string(),
                })?;
        }

        Err(ResolveError::DepthExceeded {
            max_depth: MAX_REF_HOPS,
        })
    }

    /// Build an OpenAPI 3.x model; fails for anything that is not a valid 3.x document
    pub fn build_v3_model(&self) -> Result<oas3::Spec, ResolveError> {
        let label = self
            .raw
            .get("openapi")
            .and_then(|v| v.as_str())
            .ok_or(ResolveError::MissingVersion { field: "openapi" })?;

        if !label.starts_with("3.") {
            return Err(ResolveError::UnsupportedVersion {
                expected: "3.x",
                found: label.to_string(),
            });
        }

        let mut model_source = self.raw.clone();
        if label.starts_with("3.0") {
            upgrade_exclusive_bounds(&mut model_source);
        }

        let spec = serde_json::from_value::<oas3::Spec>(model_source).map_err(|e| {
            debug!(error = %e, "Document is not a valid OpenAPI 3.x model");
            ResolveError::Model {
                version: "3.x",
                message: e.to_string(),
            }
        })?;

        Ok(spec)
    }

    /// Build a Swagger 2.0 model; fails for anything that is not a valid 2.0 document
    pub fn build_v2_model(&self) -> Result<Swagger2Spec, ResolveError> {
        let label = self
            .raw
            .get("swagger")
            .and_then(|v| v.as_str())
            .ok_or(ResolveError::MissingVersion { field: "swagger" })?;

        if !label.starts_with("2.") {
            return Err(ResolveError::UnsupportedVersion {
                expected: "2.0",
                found: label.to_string(),
            });
        }

        serde_json::from_value::<Swagger2Spec>(self.raw.clone()).map_err(|e| {
            debug!(error = %e, "Document is not a valid Swagger 2.0 model");
            ResolveError::Model {
                version: "2.0",
                message: e.to_string(),
            }
        })
    }
}

/// Rewrite 3.0 boolean `exclusiveMinimum`/`exclusiveMaximum` into the numeric 3.1 form
///
/// `exclusiveMinimum: true` with `minimum: 0` becomes `exclusiveMinimum: 0`.
/// A `false` flag, or a `true` flag without its bound, is dropped.
fn upgrade_exclusive_bounds(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            for (flag, bound) in [("exclusiveMinimum", "minimum"), ("exclusiveMaximum", "maximum")] {
                let Some(exclusive) = map.get(flag).and_then(|v| v.as_bool()) else {
                    continue;
                };
                map.remove(flag);
                if exclusive && let Some(limit) = map.remove(bound) {
                    map.insert(flag.to_string(), limit);
                }
            }
            for child in map.values_mut() {
                upgrade_exclusive_bounds(child);
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                upgrade_exclusive_bounds(item);
            }
        }
        _ => {}
    }
}

/// Errors raised while reading a document or building a versioned model
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Document is not valid UTF-8: {message}")]
    Encoding { message: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Document root is not a mapping")]
    NotAMapping,

    #[error("Missing '{field}' version field")]
    MissingVersion { field: &'static str },

    #[error("Unsupported version {found} (expected {expected})")]
    UnsupportedVersion {
        expected: &'static str,
        found: String,
    },

    #[error("Invalid {version} model: {message}")]
    Model {
        version: &'static str,
        message: String,
    },

    #[error("Unresolved reference: {ref_path}")]
    UnresolvedReference { ref_path: String },

    #[error("Circular reference: {ref_path}")]
    CircularReference { ref_path: String },

    #[error("Maximum reference depth {max_depth} exceeded")]
    DepthExceeded { max_depth: usize },
}

impl ResolveError {
    /// True when the bytes themselves could not be read as a document
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ResolveError::Encoding { .. }
                | ResolveError::Json(_)
                | ResolveError::Yaml(_)
                | ResolveError::NotAMapping
        )
    }
}
