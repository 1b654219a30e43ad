//! Swagger 2.0 model and adapter

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::entities::ContractEndpoint;
use crate::domain::errors::{ContractError, ensure_active};
use crate::domain::value_objects::*;

use super::document::SpecDocument;
use super::extract;
use super::schema_resolver::SchemaRefResolver;

const DEFAULT_MEDIA_TYPE: &str = "application/json";
const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Typed view of a Swagger 2.0 document
#[derive(Debug, Clone, Deserialize)]
pub struct Swagger2Spec {
    pub swagger: String,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub paths: BTreeMap<String, Swagger2PathItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Swagger2PathItem {
    pub get: Option<Swagger2Operation>,
    pub put: Option<Swagger2Operation>,
    pub post: Option<Swagger2Operation>,
    pub delete: Option<Swagger2Operation>,
    pub options: Option<Swagger2Operation>,
    pub head: Option<Swagger2Operation>,
    pub patch: Option<Swagger2Operation>,
    #[serde(default)]
    pub parameters: Vec<JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Swagger2Operation {
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub parameters: Vec<JsonValue>,
    #[serde(default)]
    pub responses: BTreeMap<String, JsonValue>,
    pub consumes: Option<Vec<String>>,
    pub produces: Option<Vec<String>>,
}

/// Converts a 2.0 model into [`ContractEndpoint`]s
///
/// `in: body` and `formData` parameters become the endpoint's request body.
pub struct Swagger2Adapter<'a> {
    document: &'a SpecDocument,
    resolver: SchemaRefResolver<'a>,
}

impl<'a> Swagger2Adapter<'a> {
    pub fn new(document: &'a SpecDocument) -> Self {
        Self {
            document,
            resolver: SchemaRefResolver::new(document),
        }
    }

    pub fn extract_endpoints(
        &mut self,
        spec: &Swagger2Spec,
        cancel: &CancellationToken,
    ) -> Result<Vec<ContractEndpoint>, ContractError> {
        let mut endpoints = Vec::new();
        let document = self.document;
        let raw_paths = document.raw().get("paths");

        for (path_str, path_item) in &spec.paths {
            ensure_active(cancel)?;

            let raw_item = raw_paths.and_then(|p| p.get(path_str));
            let operations: [(&str, Option<&Swagger2Operation>); 7] = [
                ("GET", path_item.get.as_ref()),
                ("PUT", path_item.put.as_ref()),
                ("POST", path_item.post.as_ref()),
                ("DELETE", path_item.delete.as_ref()),
                ("OPTIONS", path_item.options.as_ref()),
                ("HEAD", path_item.head.as_ref()),
                ("PATCH", path_item.patch.as_ref()),
            ];

            for (method, operation) in operations {
                let Some(operation) = operation else {
                    continue;
                };
                let raw_operation = raw_item.and_then(|item| item.get(method.to_lowercase()));
                endpoints.push(self.convert_operation(
                    spec,
                    method,
                    path_str,
                    &path_item.parameters,
                    operation,
                    raw_operation,
                ));
            }
        }

        debug!(endpoint_count = endpoints.len(), "Extracted Swagger 2.0 endpoints");
        Ok(endpoints)
    }

    fn convert_operation(
        &mut self,
        spec: &Swagger2Spec,
        method: &str,
        path: &str,
        path_parameters: &[JsonValue],
        operation: &Swagger2Operation,
        raw_operation: Option<&JsonValue>,
    ) -> ContractEndpoint {
        let consumes = operation
            .consumes
            .clone()
            .unwrap_or_else(|| spec.consumes.clone());
        let produces = operation
            .produces
            .clone()
            .unwrap_or_else(|| spec.produces.clone());

        let document = self.document;
        let path_level: Vec<&JsonValue> = path_parameters
            .iter()
            .filter_map(|p| extract::resolve_parameter_json(document, p))
            .collect();
        let operation_level: Vec<&JsonValue> = operation
            .parameters
            .iter()
            .filter_map(|p| extract::resolve_parameter_json(document, p))
            .collect();

        let (path_plain, path_body) = self.split_parameters(&path_level);
        let (op_plain, op_body) = self.split_parameters(&operation_level);

        let body_params = merge_body(path_body, op_body);
        let request_body = self.request_body(&body_params, &consumes);

        let responses = operation
            .responses
            .iter()
            .map(|(status_code, response)| {
                (status_code.clone(), self.convert_response(response, &produces))
            })
            .collect();

        ContractEndpoint {
            method: method.to_string(),
            path: path.to_string(),
            operation_id: operation.operation_id.clone(),
            parameters: extract::merge_parameters(path_plain, op_plain),
            request_body,
            responses,
            security: extract::effective_security(raw_operation, document.raw()),
        }
    }

    /// Separate plain parameters from `body`/`formData` entries
    fn split_parameters<'p>(
        &mut self,
        params: &[&'p JsonValue],
    ) -> (Vec<ContractParameter>, Vec<&'p JsonValue>) {
        let mut plain = Vec::new();
        let mut body = Vec::new();

        for param in params {
            match param.get("in").and_then(|v| v.as_str()) {
                Some("body") | Some("formData") => body.push(*param),
                _ => {
                    if let Some(p) = extract::parameter_from_json(param, &mut self.resolver) {
                        plain.push(p);
                    }
                }
            }
        }

        (plain, body)
    }

    fn request_body(
        &mut self,
        body_params: &[&JsonValue],
        consumes: &[String],
    ) -> Option<ContractRequestBody> {
        if body_params.is_empty() {
            return None;
        }

        // A single `in: body` parameter carries the whole payload schema
        if let Some(body) = body_params
            .iter()
            .find(|p| p.get("in").and_then(|v| v.as_str()) == Some("body"))
        {
            let schema = body
                .get("schema")
                .map(|s| self.resolver.parse_schema_from_json(s));
            let media_types = non_empty_or(consumes, DEFAULT_MEDIA_TYPE);
            return Some(ContractRequestBody {
                required: is_required(body),
                content_types: media_types
                    .into_iter()
                    .map(|mt| (mt, schema.clone()))
                    .collect(),
            });
        }

        // formData fields fold into one object schema
        let mut form_schema = ContractSchema::of_type("object");
        let mut any_required = false;
        for field in body_params {
            let Some(name) = field.get("name").and_then(|v| v.as_str()) else {
                continue;
            };
            if is_required(field) {
                any_required = true;
                form_schema.required.push(name.to_string());
            }
            form_schema
                .properties
                .insert(name.to_string(), self.resolver.parse_schema_from_json(field));
        }

        let media_types = non_empty_or(consumes, FORM_MEDIA_TYPE);
        Some(ContractRequestBody {
            required: any_required,
            content_types: media_types
                .into_iter()
                .map(|mt| (mt, Some(form_schema.clone())))
                .collect(),
        })
    }

    fn convert_response(&mut self, response: &JsonValue, produces: &[String]) -> ContractResponse {
        let document = self.document;
        let response = document.follow_ref(response).unwrap_or(response);

        let content_types = match response.get("schema") {
            Some(schema_json) => {
                let schema = self.resolver.parse_schema_from_json(schema_json);
                non_empty_or(produces, DEFAULT_MEDIA_TYPE)
                    .into_iter()
                    .map(|mt| (mt, Some(schema.clone())))
                    .collect()
            }
            None => BTreeMap::new(),
        };

        // 2.0 headers declare their type inline
        let headers = response
            .get("headers")
            .and_then(|h| h.as_object())
            .map(|headers| {
                headers
                    .iter()
                    .map(|(name, header)| {
                        (name.clone(), Some(self.resolver.parse_schema_from_json(header)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        ContractResponse {
            description: response
                .get("description")
                .and_then(|d| d.as_str())
                .unwrap_or_default()
                .to_string(),
            content_types,
            headers,
        }
    }
}

/// Operation-level body entries replace path-level ones with the same name
fn merge_body<'p>(path_level: Vec<&'p JsonValue>, operation_level: Vec<&'p JsonValue>) -> Vec<&'p JsonValue> {
    let name_of = |p: &JsonValue| p.get("name").and_then(|v| v.as_str()).map(|s| s.to_string());
    let mut merged: Vec<&JsonValue> = path_level
        .into_iter()
        .filter(|p| {
            let name = name_of(p);
            !operation_level.iter().any(|op| name_of(op) == name)
        })
        .collect();
    merged.extend(operation_level);
    merged
}

fn non_empty_or(values: &[String], fallback: &str) -> Vec<String> {
    if values.is_empty() {
        vec![fallback.to_string()]
    } else {
        values.to_vec()
    }
}

fn is_required(param: &JsonValue) -> bool {
    param
        .get("required")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PETSTORE: &str = r##"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0"
consumes:
  - application/json
security:
  - api_key: []
paths:
  /pets/{petId}:
    parameters:
      - name: petId
        in: path
        required: true
        type: integer
    get:
      operationId: getPet
      produces:
        - application/xml
      responses:
        "200":
          description: A pet
          schema:
            $ref: "#/definitions/Pet"
        default:
          description: Error
    put:
      security: []
      parameters:
        - name: body
          in: body
          required: true
          schema:
            $ref: "#/definitions/Pet"
      responses:
        "204":
          description: Updated
  /pets/{petId}/photo:
    post:
      consumes:
        - multipart/form-data
      parameters:
        - name: petId
          in: path
          required: true
          type: integer
        - name: file
          in: formData
          required: true
          type: file
      responses:
        "201":
          description: Uploaded
definitions:
  Pet:
    type: object
    properties:
      id:
        type: integer
"##;

    fn endpoints() -> Vec<ContractEndpoint> {
        let document = SpecDocument::parse(PETSTORE.as_bytes()).unwrap();
        let spec = document.build_v2_model().unwrap();
        Swagger2Adapter::new(&document)
            .extract_endpoints(&spec, &CancellationToken::new())
            .unwrap()
    }

    fn find<'e>(endpoints: &'e [ContractEndpoint], method: &str, path: &str) -> &'e ContractEndpoint {
        endpoints
            .iter()
            .find(|e| e.method == method && e.path == path)
            .unwrap()
    }

    #[test]
    fn path_level_parameters_apply_to_every_operation() {
        let endpoints = endpoints();
        let get = find(&endpoints, "GET", "/pets/{petId}");

        let pet_id = get
            .find_parameter("petId", ParameterLocation::Path)
            .unwrap();
        assert!(pet_id.required);
        assert_eq!(
            pet_id.schema.as_ref().unwrap().kind().implementation_type(),
            Some("int")
        );
    }

    #[test]
    fn body_parameter_becomes_request_body() {
        let endpoints = endpoints();
        let put = find(&endpoints, "PUT", "/pets/{petId}");

        let body = put.request_body.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(body.media_types(), vec!["application/json"]);
        assert!(put.find_parameter("body", ParameterLocation::Body).is_none());
    }

    #[test]
    fn form_data_folds_into_form_body() {
        let endpoints = endpoints();
        let post = find(&endpoints, "POST", "/pets/{petId}/photo");

        let body = post.request_body.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(body.media_types(), vec!["multipart/form-data"]);
        let schema = body.content_types["multipart/form-data"].as_ref().unwrap();
        assert!(schema.properties.contains_key("file"));
        assert_eq!(schema.required, vec!["file"]);
    }

    #[test]
    fn responses_use_produces_and_security_inherits() {
        let endpoints = endpoints();
        let get = find(&endpoints, "GET", "/pets/{petId}");

        assert_eq!(get.operation_id.as_deref(), Some("getPet"));
        assert_eq!(get.responses["200"].media_types(), vec!["application/xml"]);
        assert!(get.responses["default"].content_types.is_empty());
        assert_eq!(get.required_schemes(), vec!["api_key"]);

        let put = find(&endpoints, "PUT", "/pets/{petId}");
        assert!(put.required_schemes().is_empty());
    }
}
