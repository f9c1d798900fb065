//! Route metadata: documentation attached to a route.
//!
//! Metadata is an immutable value assembled through [`RouteMetadataBuilder`]. Example
//! bodies are stored per media type together with the type they were produced from, which
//! decides whether a response references a component directly or gets synthesized media
//! types.

use crate::descriptor::{ApiModel, ModelRef};
use crate::error::{GenerationError, Result};
use crate::route::HttpMethod;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_JSON_UTF8: &str = "application/json; charset=utf-8";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
pub const TEXT_PLAIN: &str = "text/plain";

/// Value type of a query, path or form parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Boolean,
    Integer,
    Number,
    /// Epoch milliseconds
    Date,
    File,
}

/// Description of a single parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub description: Option<String>,
    pub example: Option<String>,
    pub required: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub default_value: Option<String>,
    pub enumeration: Option<Vec<String>>,
    pub pattern: Option<String>,
}

impl ParamSpec {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn of_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn length(mut self, min_length: Option<u64>, max_length: Option<u64>) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn enumeration<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enumeration = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

/// Example body for one media type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MimeExample {
    pub example: Option<serde_json::Value>,
    /// JSON schema describing the example (`type`, `id`)
    pub schema: Option<serde_json::Value>,
    /// Form fields of a multipart body
    pub form_parameters: Option<BTreeMap<String, ParamSpec>>,
}

impl MimeExample {
    pub fn example(example: serde_json::Value) -> Self {
        Self {
            example: Some(example),
            ..Self::default()
        }
    }

    pub fn form(parameters: BTreeMap<String, ParamSpec>) -> Self {
        Self {
            form_parameters: Some(parameters),
            ..Self::default()
        }
    }
}

/// What an example body was produced from
#[derive(Debug, Clone, PartialEq)]
pub enum ExampleOrigin {
    /// A described domain type
    Model(ModelRef),
    /// A dynamic JSON value
    Json,
    /// Plain text
    Text,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExampleResponse {
    pub description: String,
    /// Media type -> example; `None` when only a description is known
    pub body: Option<BTreeMap<String, MimeExample>>,
    pub origin: Option<ExampleOrigin>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExampleRequest {
    pub body: BTreeMap<String, MimeExample>,
    pub origin: Option<ExampleOrigin>,
}

/// Documentation attached to a route
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteMetadata {
    /// Method the documented operation is registered under; GET when unset
    pub method: Option<HttpMethod>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub path_parameters: BTreeMap<String, ParamSpec>,
    pub query_parameters: BTreeMap<String, ParamSpec>,
    pub produces: Vec<String>,
    pub consumes: Vec<String>,
    pub example_responses: BTreeMap<u16, ExampleResponse>,
    pub example_request: Option<ExampleRequest>,
    /// Skip the bearer authentication requirement
    pub insecure: bool,
    /// Model types documented as components for this route
    pub models: Vec<ModelRef>,
}

impl RouteMetadata {
    pub fn builder() -> RouteMetadataBuilder {
        RouteMetadataBuilder::default()
    }

    /// Method the operation is registered under
    pub fn effective_method(&self) -> HttpMethod {
        self.method.unwrap_or(HttpMethod::Get)
    }

    /// Check that the metadata documents `path` completely.
    ///
    /// JSON producing routes need example responses, JSON consuming routes need an example
    /// request, a description is mandatory and every named path segment needs a path
    /// parameter.
    pub fn validate(&self, path: &str) -> Result<()> {
        if self.produces.iter().any(|p| p == APPLICATION_JSON) && self.example_responses.is_empty()
        {
            return Err(GenerationError::InvalidMetadata(format!(
                "Endpoint {{{}}} has no example responses.",
                path
            )));
        }
        if self
            .consumes
            .iter()
            .any(|c| c == APPLICATION_JSON || c == APPLICATION_JSON_UTF8)
            && self.example_request.is_none()
        {
            return Err(GenerationError::InvalidMetadata(format!(
                "Endpoint {{{}}} has no example request.",
                path
            )));
        }
        if self
            .description
            .as_deref()
            .map_or(true, |d| d.trim().is_empty())
        {
            return Err(GenerationError::InvalidMetadata(format!(
                "Endpoint {{{}}} has no description.",
                path
            )));
        }
        for segment in named_segments(path) {
            if !self.path_parameters.contains_key(&segment) {
                return Err(GenerationError::InvalidMetadata(format!(
                    "Missing URI description for path {{{}}} segment {{{}}}",
                    path, segment
                )));
            }
        }
        Ok(())
    }
}

/// Names of `:param` and `{param}` segments of a path pattern
pub fn named_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| {
            segment
                .strip_prefix(':')
                .or_else(|| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builder for [`RouteMetadata`]
#[derive(Debug, Clone, Default)]
pub struct RouteMetadataBuilder {
    metadata: RouteMetadata,
}

impl RouteMetadataBuilder {
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.metadata.method = Some(method);
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.display_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    pub fn path_parameter(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.metadata.path_parameters.insert(name.into(), spec);
        self
    }

    /// Path parameter with a description and an example value
    pub fn add_uri_parameter(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        self.path_parameter(name, ParamSpec::new(description).example(example).required())
    }

    pub fn query_parameter(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.metadata.query_parameters.insert(name.into(), spec);
        self
    }

    /// Optional query parameter with a description and an optional example value
    pub fn add_query_parameter(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        example: Option<&str>,
    ) -> Self {
        let mut spec = ParamSpec::new(description);
        spec.example = example.map(str::to_string);
        self.query_parameter(name, spec)
    }

    pub fn produces(mut self, media_type: impl Into<String>) -> Self {
        let media_type = media_type.into();
        if !self.metadata.produces.contains(&media_type) {
            self.metadata.produces.push(media_type);
        }
        self
    }

    pub fn consumes(mut self, media_type: impl Into<String>) -> Self {
        let media_type = media_type.into();
        if !self.metadata.consumes.contains(&media_type) {
            self.metadata.consumes.push(media_type);
        }
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.metadata.insecure = insecure;
        self
    }

    /// Document an additional model type as a component
    pub fn model(mut self, model: ModelRef) -> Self {
        if !self.metadata.models.contains(&model) {
            self.metadata.models.push(model);
        }
        self
    }

    pub fn model_of<T: ApiModel>(self) -> Self {
        self.model(ModelRef::of::<T>())
    }

    /// Example response with a description only
    pub fn example_response(mut self, status: u16, description: impl Into<String>) -> Self {
        self.metadata.example_responses.insert(
            status,
            ExampleResponse {
                description: description.into(),
                body: None,
                origin: None,
            },
        );
        self
    }

    /// Example response produced from a domain type value
    pub fn example_response_model<T: ApiModel + Serialize>(
        self,
        status: u16,
        model: &T,
        description: impl Into<String>,
    ) -> Self {
        self.example_response_of(status, ModelRef::of::<T>(), to_example(model), description)
    }

    /// Example response produced from a model known by reference
    pub fn example_response_of(
        mut self,
        status: u16,
        model: ModelRef,
        example: serde_json::Value,
        description: impl Into<String>,
    ) -> Self {
        let mime = MimeExample {
            example: Some(example),
            schema: Some(json_schema_of(&model)),
            form_parameters: None,
        };
        self.metadata.example_responses.insert(
            status,
            ExampleResponse {
                description: description.into(),
                body: Some(BTreeMap::from([(APPLICATION_JSON.to_string(), mime)])),
                origin: Some(ExampleOrigin::Model(model)),
            },
        );
        self
    }

    /// Example response with a dynamic JSON body
    pub fn example_response_json(
        mut self,
        status: u16,
        example: serde_json::Value,
        description: impl Into<String>,
    ) -> Self {
        self.metadata.example_responses.insert(
            status,
            ExampleResponse {
                description: description.into(),
                body: Some(BTreeMap::from([(
                    APPLICATION_JSON.to_string(),
                    MimeExample::example(example),
                )])),
                origin: Some(ExampleOrigin::Json),
            },
        );
        self
    }

    /// Example response with a plain text body
    pub fn example_response_text(
        mut self,
        status: u16,
        example: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.metadata.example_responses.insert(
            status,
            ExampleResponse {
                description: description.into(),
                body: Some(BTreeMap::from([(
                    TEXT_PLAIN.to_string(),
                    MimeExample::example(serde_json::Value::String(example.into())),
                )])),
                origin: Some(ExampleOrigin::Text),
            },
        );
        self
    }

    /// Example request produced from a domain type value
    pub fn example_request_model<T: ApiModel + Serialize>(self, model: &T) -> Self {
        self.example_request_of(ModelRef::of::<T>(), to_example(model))
    }

    pub fn example_request_of(mut self, model: ModelRef, example: serde_json::Value) -> Self {
        let mime = MimeExample {
            example: Some(example),
            schema: Some(json_schema_of(&model)),
            form_parameters: None,
        };
        self.metadata.example_request = Some(ExampleRequest {
            body: BTreeMap::from([(APPLICATION_JSON.to_string(), mime)]),
            origin: Some(ExampleOrigin::Model(model)),
        });
        self
    }

    pub fn example_request_json(mut self, example: serde_json::Value) -> Self {
        self.metadata.example_request = Some(ExampleRequest {
            body: BTreeMap::from([(APPLICATION_JSON.to_string(), MimeExample::example(example))]),
            origin: Some(ExampleOrigin::Json),
        });
        self
    }

    pub fn example_request_text(mut self, example: impl Into<String>) -> Self {
        self.metadata.example_request = Some(ExampleRequest {
            body: BTreeMap::from([(
                TEXT_PLAIN.to_string(),
                MimeExample::example(serde_json::Value::String(example.into())),
            )]),
            origin: Some(ExampleOrigin::Text),
        });
        self
    }

    /// Example multipart request described by its form fields
    pub fn example_request_form(mut self, parameters: BTreeMap<String, ParamSpec>) -> Self {
        self.metadata.example_request = Some(ExampleRequest {
            body: BTreeMap::from([(
                MULTIPART_FORM_DATA.to_string(),
                MimeExample::form(parameters),
            )]),
            origin: None,
        });
        self
    }

    pub fn build(self) -> RouteMetadata {
        self.metadata
    }
}

fn to_example<T: Serialize>(model: &T) -> serde_json::Value {
    serde_json::to_value(model).unwrap_or_else(|err| {
        warn!("Could not serialize example value: {}", err);
        serde_json::Value::Null
    })
}

/// Minimal JSON schema attached to model examples
pub fn json_schema_of(model: &ModelRef) -> serde_json::Value {
    let mut id = String::from("urn:jsonschema");
    for segment in model.module.split("::").filter(|s| !s.is_empty()) {
        id.push(':');
        id.push_str(segment);
    }
    id.push(':');
    id.push_str(&model.name);
    serde_json::json!({ "type": "object", "id": id })
}
