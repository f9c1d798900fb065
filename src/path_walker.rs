//! Router tree walker.
//!
//! Converts every documented route of a router tree into a path entry: the route pattern
//! is joined to its mount prefix and converted from `:param` to `{param}` syntax, filtered
//! through the configured blacklist and whitelist, and populated either from the route's
//! metadata or with a generic fallback operation. Entries left without operations are
//! dropped.

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::metadata::{
    ExampleOrigin, ExampleResponse, MimeExample, ParamSpec, ParamType, RouteMetadata,
    APPLICATION_OCTET_STREAM, MULTIPART_FORM_DATA,
};
use crate::openapi_builder::{
    MediaType, Operation, Parameter, ParameterLocation, PathItem, RequestBody, Response,
};
use crate::route::{HttpMethod, Route, Router};
use crate::schema::Schema;
use crate::schema_generator::SchemaGenerator;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Name of the security scheme required by protected operations
pub const BEARER_AUTH: &str = "bearerAuth";

/// Media type used for responses of fallback operations and in-domain examples
pub const ANY_MEDIA_TYPE: &str = "*/*";

/// Walks router trees into a path map
pub struct PathWalker<'c> {
    config: &'c GeneratorConfig,
}

impl<'c> PathWalker<'c> {
    pub fn new(config: &'c GeneratorConfig) -> Self {
        Self { config }
    }

    /// Add every route of `router`, mounted at `prefix`, to `paths`
    pub fn walk(
        &self,
        prefix: &str,
        router: &Router,
        paths: &mut BTreeMap<String, PathItem>,
        schema_gen: &mut SchemaGenerator,
    ) -> Result<()> {
        for route in &router.routes {
            self.add_route(prefix, route, paths, schema_gen)?;
        }
        Ok(())
    }

    fn add_route(
        &self,
        prefix: &str,
        route: &Route,
        paths: &mut BTreeMap<String, PathItem>,
        schema_gen: &mut SchemaGenerator,
    ) -> Result<()> {
        let Some(raw_path) = route.path.as_deref().filter(|p| !p.trim().is_empty()) else {
            debug!("Skipping route without a path: {:?}", route.name);
            return Ok(());
        };
        let path = convert_path(prefix, raw_path);

        if !self.config.admits(&path) {
            debug!("Path filtered off: {}", path);
            return Ok(());
        }
        if self.config.strict {
            if let Some(metadata) = &route.metadata {
                metadata.validate(raw_path)?;
            }
        }

        let mut item = paths.remove(&path).unwrap_or_else(|| {
            debug!("Raw path: {}", path);
            PathItem::with_summary(route.name.clone())
        });

        match &route.metadata {
            Some(metadata) => {
                debug!("Path with metadata: {}", path);
                item.summary = metadata.display_name.clone();
                item.description = metadata.description.clone();
                for model in &metadata.models {
                    schema_gen.build_component(model);
                }
                let operation = self.endpoint_operation(metadata, schema_gen);
                item.set_operation(metadata.effective_method(), operation);
            }
            None => {
                let operation = fallback_operation(raw_path);
                for method in &route.methods {
                    item.set_operation(*method, operation.clone());
                }
            }
        }

        let key = match &self.config.path_rewriter {
            Some(rewrite) => {
                let rewritten = rewrite(&path, &mut item);
                if rewritten != path {
                    debug!("Path {} moved to {}", path, rewritten);
                }
                rewritten
            }
            None => path.clone(),
        };

        if item.has_operations() {
            match paths.get_mut(&key) {
                Some(existing) => existing.merge(item),
                None => {
                    paths.insert(key, item);
                }
            }
        } else {
            debug!("Path removed due to having no operations: {}", key);
        }

        if let Some(sub_router) = &route.sub_router {
            self.walk(&path, sub_router, paths, schema_gen)?;
        }
        Ok(())
    }

    /// Operation documented by route metadata
    fn endpoint_operation(
        &self,
        metadata: &RouteMetadata,
        schema_gen: &mut SchemaGenerator,
    ) -> Operation {
        let security = if metadata.insecure {
            Vec::new()
        } else {
            vec![BTreeMap::from([(BEARER_AUTH.to_string(), Vec::new())])]
        };

        let query = metadata
            .query_parameters
            .iter()
            .map(|(name, spec)| parameter(name, spec, ParameterLocation::Query));
        let path = metadata.path_parameters.iter().map(|(name, spec)| {
            let mut param = parameter(name, spec, ParameterLocation::Path);
            param.required = true;
            param
        });
        let parameters = query.chain(path).collect();

        let mut responses = BTreeMap::new();
        if let Some(response) = produced_response(&metadata.produces) {
            responses.insert("default".to_string(), response);
        }
        for (status, example) in &metadata.example_responses {
            let response = self.example_response(*status, example, schema_gen);
            responses.insert(status.to_string(), response);
        }

        let request_body = match &metadata.example_request {
            Some(_) if metadata.effective_method() == HttpMethod::Delete => None,
            Some(request) => Some(RequestBody {
                description: None,
                content: request
                    .body
                    .iter()
                    .map(|(key, mime)| fill_media_type(key, mime, request.origin.as_ref(), schema_gen))
                    .collect(),
            }),
            None => None,
        };

        Operation {
            security: Some(security),
            parameters,
            request_body,
            responses,
        }
    }

    fn example_response(
        &self,
        status: u16,
        example: &ExampleResponse,
        schema_gen: &mut SchemaGenerator,
    ) -> Response {
        let mut response = Response {
            description: example.description.clone(),
            ..Response::default()
        };

        match &example.origin {
            Some(ExampleOrigin::Model(model))
                if schema_gen.is_in_domain(&schema_gen.type_resolver().module_of(model)) =>
            {
                let media = MediaType {
                    schema: Some(schema_gen.component_reference(model)),
                    example: example
                        .body
                        .as_ref()
                        .and_then(|body| body.values().find_map(|m| m.example.clone())),
                };
                response.content = Some(BTreeMap::from([(ANY_MEDIA_TYPE.to_string(), media)]));
            }
            Some(origin) => {
                let content = match &example.body {
                    Some(body) => body
                        .iter()
                        .map(|(key, mime)| fill_media_type(key, mime, Some(origin), schema_gen))
                        .collect(),
                    None => {
                        warn!("Body of {} is null!", status);
                        BTreeMap::new()
                    }
                };
                response.content = Some(content);
            }
            None => {}
        }
        response
    }
}

/// Join a mount prefix and a route pattern into an OpenAPI path
///
/// `:name` segments become `{name}`, a bare `/` pattern is kept as is and doubled
/// separators are collapsed.
pub fn convert_path(prefix: &str, raw_path: &str) -> String {
    let converted = if raw_path == "/" {
        "/".to_string()
    } else {
        raw_path
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => format!("{{{}}}", name),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    };

    let mut path = format!("{}{}", prefix, converted);
    while path.contains("//") {
        path = path.replace("//", "/");
    }
    path
}

/// One `default` response listing every produced media type.
///
/// The description names all of them, joined with `", "`, instead of only the last one.
fn produced_response(produces: &[String]) -> Option<Response> {
    if produces.is_empty() {
        return None;
    }
    let mut response = Response {
        description: produces.join(", "),
        ..Response::default()
    };
    let mut content = BTreeMap::new();
    for media_type in produces {
        let mut media = MediaType::default();
        if media_type == APPLICATION_OCTET_STREAM {
            media.schema = Some(Schema::with_format("string", "binary"));
            response
                .extensions
                .insert("x-is-file".to_string(), serde_json::Value::Bool(true));
        }
        content.insert(media_type.clone(), media);
    }
    response.content = Some(content);
    Some(response)
}

/// Media type entry synthesized from an example body
fn fill_media_type(
    key: &str,
    mime: &MimeExample,
    origin: Option<&ExampleOrigin>,
    schema_gen: &mut SchemaGenerator,
) -> (String, MediaType) {
    let mut media = MediaType {
        schema: None,
        example: mime.example.clone(),
    };

    if let Some(form) = &mime.form_parameters {
        let mut schema = Schema::of_type("object");
        schema.properties = Some(
            form.iter()
                .map(|(name, spec)| (name.clone(), param_schema(spec)))
                .collect(),
        );
        media.schema = Some(schema);
        return (MULTIPART_FORM_DATA.to_string(), media);
    }

    match (&mime.schema, origin) {
        (Some(json_schema), Some(ExampleOrigin::Model(model))) => {
            let mut schema = schema_gen.component_reference(model);
            schema.schema_type = Some(
                json_schema
                    .get("type")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("string")
                    .to_string(),
            );
            schema.id = json_schema
                .get("id")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string);
            media.schema = Some(schema);
        }
        (_, Some(ExampleOrigin::Json)) => {
            media.schema = Some(Schema::of_type("object"));
        }
        _ => {}
    }
    (key.to_string(), media)
}

/// Operation for a route without metadata
fn fallback_operation(raw_path: &str) -> Operation {
    let parameters = raw_path
        .split('/')
        .filter_map(|segment| segment.strip_prefix(':'))
        .map(|name| {
            let mut schema = Schema::of_type("string");
            schema.description = Some(format!(
                "A path parameter `{}` of a fallback type `string`",
                name
            ));
            Parameter {
                name: name.to_string(),
                location: ParameterLocation::Path,
                description: None,
                required: true,
                allow_empty_value: Some(false),
                schema,
            }
        })
        .collect();

    let response = Response {
        description: format!("Auto generated response description for {}", raw_path),
        content: Some(BTreeMap::from([(
            ANY_MEDIA_TYPE.to_string(),
            MediaType::default(),
        )])),
        extensions: BTreeMap::new(),
    };

    Operation {
        security: None,
        parameters,
        request_body: None,
        responses: BTreeMap::from([("200".to_string(), response)]),
    }
}

fn parameter(name: &str, spec: &ParamSpec, location: ParameterLocation) -> Parameter {
    Parameter {
        name: name.to_string(),
        location,
        description: spec.description.clone(),
        required: spec.required,
        allow_empty_value: None,
        schema: param_schema(spec),
    }
}

fn param_schema(spec: &ParamSpec) -> Schema {
    let mut schema = match spec.param_type {
        ParamType::String => Schema::of_type("string"),
        ParamType::Boolean => Schema::of_type("boolean"),
        ParamType::Integer => Schema::with_format("integer", "int32"),
        ParamType::Number => Schema::with_format("number", "double"),
        ParamType::Date => Schema::with_format("integer", "int64"),
        ParamType::File => Schema::with_format("string", "binary"),
    };
    schema.minimum = spec.minimum;
    schema.maximum = spec.maximum;
    schema.min_length = spec.min_length;
    schema.max_length = spec.max_length;
    schema.default = spec.default_value.clone().map(serde_json::Value::String);
    schema.enum_values = spec.enumeration.clone();
    schema.pattern = spec.pattern.clone();
    schema.description = spec.description.clone();
    if let Some(example) = spec.example.as_deref().filter(|e| !e.trim().is_empty()) {
        schema.example = Some(serde_json::Value::String(example.to_string()));
    }
    schema
}
