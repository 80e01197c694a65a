use crate::definition::Member;
use crate::extractor::{ApiInfo, HttpMethod, OperationInfo, ParameterLocation};
use crate::schema_generator::{Schema, SchemaGenerator};
use crate::type_ref::primitive;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Swagger document builder
pub struct OpenApiBuilder {
    info: Info,
    base_path: Option<String>,
    /// Paths collection (URL path -> PathItem)
    paths: BTreeMap<String, PathItem>,
}

/// Swagger Info object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
}

/// Swagger PathItem object - all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
        }
    }
}

/// Swagger Operation object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status code
    pub responses: BTreeMap<String, Response>,
}

/// Swagger Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set for body parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    /// Set for every other location
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
}

/// Swagger Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Complete Swagger 2.0 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwaggerDocument {
    /// Always "2.0"
    pub swagger: String,
    pub info: Info,
    #[serde(rename = "basePath", skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, Schema>,
}

impl OpenApiBuilder {
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info::default(),
            base_path: None,
            paths: BTreeMap::new(),
        }
    }

    /// Takes title, description, version and base path from the API blocks.
    pub fn with_api(mut self, api: &ApiInfo) -> Self {
        self.info = Info {
            title: api.title.clone(),
            description: non_empty(&api.description),
            version: api.version.clone(),
        };
        self.base_path = non_empty(&api.base_path);
        self
    }

    /// Adds an operation to its path item.
    ///
    /// Operations with an unknown HTTP method are dropped with a warning. A
    /// second operation on the same path and method replaces the first.
    pub fn add_operation(&mut self, operation: &OperationInfo, schema_gen: &SchemaGenerator) {
        let Some(method) = HttpMethod::parse(&operation.method) else {
            warn!(
                "Dropping operation {} with unknown method '{}'",
                operation.path, operation.method
            );
            return;
        };
        debug!("Adding operation: {} {}", operation.method, operation.path);

        let parameters = operation
            .parameters
            .iter()
            .map(|param| {
                let (schema, param_type) = if param.location == ParameterLocation::Body {
                    (Some(schema_gen.member_schema(&param.member)), None)
                } else {
                    let type_text = match &param.member {
                        Member::Scalar(scalar) => scalar.type_text.as_str(),
                        _ => "",
                    };
                    let kind = primitive(type_text).map(|p| p.kind.to_string());
                    if kind.is_none() {
                        warn!(
                            "Parameter '{}' of {} {} is in {} but is not a primitive type",
                            param.name,
                            operation.method,
                            operation.path,
                            param.location.as_str()
                        );
                    }
                    (None, kind)
                };
                Parameter {
                    name: param.name.clone(),
                    location: param.location.as_str().to_string(),
                    required: param.required,
                    description: non_empty(&param.description),
                    schema,
                    param_type,
                }
            })
            .collect();

        let mut responses = BTreeMap::new();
        for response in &operation.responses {
            responses.insert(
                response.code.to_string(),
                Response {
                    description: response.description.clone(),
                    schema: Some(schema_gen.member_schema(&response.member)),
                },
            );
        }

        let built = Operation {
            summary: non_empty(&operation.title),
            description: non_empty(&operation.description),
            consumes: operation.accepts.clone(),
            produces: operation.accepts.clone(),
            tags: operation.tag.iter().cloned().collect(),
            parameters,
            responses,
        };

        let path_item = self.paths.entry(operation.path.clone()).or_default();
        let slot = path_item.slot(method);
        if slot.is_some() {
            warn!(
                "Operation {} {} declared twice; keeping the last one",
                operation.method, operation.path
            );
        }
        *slot = Some(built);
    }

    /// Build the final document with the given definitions
    pub fn build(self, definitions: BTreeMap<String, Schema>) -> SwaggerDocument {
        debug!(
            "Building Swagger document with {} paths and {} definitions",
            self.paths.len(),
            definitions.len()
        );
        SwaggerDocument {
            swagger: "2.0".to_string(),
            info: self.info,
            base_path: self.base_path,
            paths: self.paths,
            definitions,
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}
