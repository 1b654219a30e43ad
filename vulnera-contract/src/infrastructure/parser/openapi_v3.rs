//! OpenAPI 3.x adapter: `oas3` model -> unified contract endpoints

use oas3::spec::{
    Header, MediaType, ObjectOrReference, ObjectSchema, Operation, Parameter, ParameterIn,
    RequestBody, Response,
};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::entities::ContractEndpoint;
use crate::domain::errors::{ContractError, ensure_active};
use crate::domain::value_objects::*;

use super::document::SpecDocument;
use super::extract;
use super::schema_resolver::SchemaRefResolver;

/// Converts a 3.x model into [`ContractEndpoint`]s
///
/// Structure comes from the typed `oas3` model. Security and path-item
/// parameters are read from the raw document, which `oas3` does not expose
/// in a form that distinguishes "absent" from "empty".
pub struct OpenApiV3Adapter<'a> {
    document: &'a SpecDocument,
    resolver: SchemaRefResolver<'a>,
}

impl<'a> OpenApiV3Adapter<'a> {
    pub fn new(document: &'a SpecDocument) -> Self {
        Self {
            document,
            resolver: SchemaRefResolver::new(document),
        }
    }

    pub fn extract_endpoints(
        &mut self,
        spec: &oas3::Spec,
        cancel: &CancellationToken,
    ) -> Result<Vec<ContractEndpoint>, ContractError> {
        let mut endpoints = Vec::new();
        let Some(paths) = spec.paths.as_ref() else {
            return Ok(endpoints);
        };

        let document = self.document;
        let raw_paths = document.raw().get("paths");

        for (path_str, path_item) in paths.iter() {
            ensure_active(cancel)?;

            let raw_item = raw_paths.and_then(|p| p.get(path_str));
            let path_parameters = self.path_level_parameters(raw_item);

            let operations: [(&str, Option<&Operation>); 8] = [
                ("GET", path_item.get.as_ref()),
                ("PUT", path_item.put.as_ref()),
                ("POST", path_item.post.as_ref()),
                ("DELETE", path_item.delete.as_ref()),
                ("OPTIONS", path_item.options.as_ref()),
                ("HEAD", path_item.head.as_ref()),
                ("PATCH", path_item.patch.as_ref()),
                ("TRACE", path_item.trace.as_ref()),
            ];

            for (method, operation) in operations {
                let Some(operation) = operation else {
                    continue;
                };
                let raw_operation = raw_item.and_then(|item| item.get(method.to_lowercase()));

                endpoints.push(self.convert_operation(
                    method,
                    path_str,
                    operation,
                    raw_operation,
                    path_parameters.clone(),
                ));
            }
        }

        debug!(endpoint_count = endpoints.len(), "Extracted OpenAPI 3.x endpoints");
        Ok(endpoints)
    }

    fn convert_operation(
        &mut self,
        method: &str,
        path: &str,
        operation: &Operation,
        raw_operation: Option<&JsonValue>,
        path_parameters: Vec<ContractParameter>,
    ) -> ContractEndpoint {
        let operation_parameters = operation
            .parameters
            .iter()
            .filter_map(|param_ref| self.convert_parameter(param_ref))
            .collect();

        let request_body = operation
            .request_body
            .as_ref()
            .and_then(|rb_ref| self.convert_request_body(rb_ref));

        let responses = operation
            .responses
            .as_ref()
            .map(|responses| {
                responses
                    .iter()
                    .filter_map(|(status_code, response_ref)| {
                        self.convert_response(status_code, response_ref)
                            .map(|r| (status_code.clone(), r))
                    })
                    .collect()
            })
            .unwrap_or_default();

        ContractEndpoint {
            method: method.to_string(),
            path: path.to_string(),
            operation_id: operation.operation_id.clone(),
            parameters: extract::merge_parameters(path_parameters, operation_parameters),
            request_body,
            responses,
            security: extract::effective_security(raw_operation, self.document.raw()),
        }
    }

    fn path_level_parameters(&mut self, raw_item: Option<&JsonValue>) -> Vec<ContractParameter> {
        let Some(params) = raw_item
            .and_then(|item| item.get("parameters"))
            .and_then(|p| p.as_array())
        else {
            return Vec::new();
        };

        let document = self.document;
        params
            .iter()
            .filter_map(|param| extract::resolve_parameter_json(document, param))
            .filter_map(|param_json| extract::parameter_from_json(param_json, &mut self.resolver))
            .collect()
    }

    fn convert_parameter(
        &mut self,
        param_ref: &ObjectOrReference<Parameter>,
    ) -> Option<ContractParameter> {
        match param_ref {
            ObjectOrReference::Object(param) => {
                let location = match param.location {
                    ParameterIn::Query => ParameterLocation::Query,
                    ParameterIn::Header => ParameterLocation::Header,
                    ParameterIn::Path => ParameterLocation::Path,
                    ParameterIn::Cookie => ParameterLocation::Cookie,
                };

                Some(ContractParameter {
                    name: param.name.clone(),
                    location,
                    required: param.required.unwrap_or(false),
                    schema: param.schema.as_ref().map(|s| self.convert_schema(s)),
                    description: param.description.clone().unwrap_or_default(),
                })
            }
            ObjectOrReference::Ref { ref_path, .. } => {
                let document = self.document;
                match document.resolve_pointer(ref_path) {
                    Some(param_json) => {
                        let param_json = extract::resolve_parameter_json(document, param_json)?;
                        extract::parameter_from_json(param_json, &mut self.resolver)
                    }
                    None => {
                        warn!(ref_path = %ref_path, "Failed to resolve parameter reference");
                        None
                    }
                }
            }
        }
    }

    fn convert_request_body(
        &mut self,
        rb_ref: &ObjectOrReference<RequestBody>,
    ) -> Option<ContractRequestBody> {
        match rb_ref {
            ObjectOrReference::Object(rb) => Some(ContractRequestBody {
                required: rb.required.unwrap_or(false),
                content_types: self.convert_content(&rb.content),
            }),
            ObjectOrReference::Ref { ref_path, .. } => {
                let rb_json = self.resolve_json(ref_path)?;
                Some(ContractRequestBody {
                    required: rb_json
                        .get("required")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false),
                    content_types: self.content_from_json(rb_json.get("content")),
                })
            }
        }
    }

    fn convert_response(
        &mut self,
        status_code: &str,
        response_ref: &ObjectOrReference<Response>,
    ) -> Option<ContractResponse> {
        match response_ref {
            ObjectOrReference::Object(response) => Some(ContractResponse {
                description: response.description.clone().unwrap_or_default(),
                content_types: self.convert_content(&response.content),
                headers: self.convert_headers(&response.headers),
            }),
            ObjectOrReference::Ref { ref_path, .. } => {
                let Some(response_json) = self.resolve_json(ref_path) else {
                    warn!(status_code = %status_code, ref_path = %ref_path, "Failed to resolve response reference");
                    return None;
                };
                let headers = response_json
                    .get("headers")
                    .and_then(|h| h.as_object())
                    .map(|headers| {
                        headers
                            .iter()
                            .map(|(name, header)| {
                                let schema = header
                                    .get("schema")
                                    .map(|s| self.resolver.parse_schema_from_json(s));
                                (name.clone(), schema)
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                Some(ContractResponse {
                    description: response_json
                        .get("description")
                        .and_then(|d| d.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    content_types: self.content_from_json(response_json.get("content")),
                    headers,
                })
            }
        }
    }

    fn convert_content(
        &mut self,
        content: &BTreeMap<String, MediaType>,
    ) -> BTreeMap<String, Option<ContractSchema>> {
        content
            .iter()
            .map(|(media_type, media_type_obj)| {
                let schema = media_type_obj
                    .schema
                    .as_ref()
                    .map(|schema_ref| self.convert_schema(schema_ref));
                (media_type.clone(), schema)
            })
            .collect()
    }

    fn convert_headers(
        &mut self,
        headers: &BTreeMap<String, ObjectOrReference<Header>>,
    ) -> BTreeMap<String, Option<ContractSchema>> {
        headers
            .iter()
            .map(|(name, header_ref)| {
                let schema = match header_ref {
                    ObjectOrReference::Object(header) => {
                        header.schema.as_ref().map(|s| self.convert_schema(s))
                    }
                    ObjectOrReference::Ref { ref_path, .. } => self
                        .resolve_json(ref_path)
                        .and_then(|h| h.get("schema"))
                        .map(|s| self.resolver.parse_schema_from_json(s)),
                };
                (name.clone(), schema)
            })
            .collect()
    }

    fn convert_schema(&mut self, schema: &ObjectOrReference<ObjectSchema>) -> ContractSchema {
        match schema {
            ObjectOrReference::Ref { ref_path, .. } => {
                self.resolver.resolve_ref(ref_path).unwrap_or_default()
            }
            ObjectOrReference::Object(obj_schema) => match serde_json::to_value(obj_schema) {
                Ok(schema_json) => self.resolver.parse_schema_from_json(&schema_json),
                Err(e) => {
                    warn!(error = %e, "Failed to read inline schema");
                    ContractSchema::default()
                }
            },
        }
    }

    fn content_from_json(
        &mut self,
        content: Option<&JsonValue>,
    ) -> BTreeMap<String, Option<ContractSchema>> {
        content
            .and_then(|c| c.as_object())
            .map(|media_types| {
                media_types
                    .iter()
                    .map(|(media_type, media)| {
                        let schema = media
                            .get("schema")
                            .map(|s| self.resolver.parse_schema_from_json(s));
                        (media_type.clone(), schema)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn resolve_json(&self, ref_path: &str) -> Option<&'a JsonValue> {
        let document = self.document;
        let value = document.resolve_pointer(ref_path)?;
        document.follow_ref(value).ok()
    }
}
