use crate::config::{GeneratorConfig, OpenApiVersion};
use crate::descriptor::{ApiModel, ModelRef};
use crate::error::Result;
use crate::path_walker::PathWalker;
use crate::route::{HttpMethod, Router};
use crate::schema::{Schema, SchemaMap};
use crate::schema_generator::SchemaGenerator;
use crate::serializer::{self, OutputFormat};
use crate::type_resolver::TypeResolver;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON Schema dialect declared by OpenAPI 3.1 documents
pub const JSON_SCHEMA_DIALECT: &str = "https://spec.openapis.org/oas/3.1/dialect/base";

/// Security requirement: scheme name -> scopes
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Server object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// GET operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// OPTIONS operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// PATCH operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// TRACE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// Path item whose summary is initialised from a route name
    pub fn with_summary(summary: Option<String>) -> Self {
        Self {
            summary,
            ..Self::default()
        }
    }

    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    fn slot_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Trace => &mut self.trace,
        }
    }

    /// Register an operation, replacing any previous one for the method
    pub fn set_operation(&mut self, method: HttpMethod, operation: Operation) {
        *self.slot_mut(method) = Some(operation);
    }

    /// All operations with their methods
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> + '_ {
        HttpMethod::ALL
            .into_iter()
            .filter_map(move |method| self.operation(method).map(|op| (method, op)))
    }

    pub fn operations_mut(&mut self) -> impl Iterator<Item = &mut Operation> + '_ {
        [
            &mut self.get,
            &mut self.put,
            &mut self.post,
            &mut self.delete,
            &mut self.options,
            &mut self.head,
            &mut self.patch,
            &mut self.trace,
        ]
        .into_iter()
        .filter_map(Option::as_mut)
    }

    pub fn has_operations(&self) -> bool {
        self.operations().next().is_some()
    }

    /// Merge `other` into this entry; operations and texts of `other` take precedence
    pub fn merge(&mut self, other: PathItem) {
        if other.summary.is_some() {
            self.summary = other.summary.clone();
        }
        if other.description.is_some() {
            self.description = other.description.clone();
        }
        for method in HttpMethod::ALL {
            if let Some(operation) = other.operation(method) {
                self.set_operation(method, operation.clone());
            }
        }
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Security requirements; an empty list disables authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    /// Parameters (query, path)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses
    pub responses: BTreeMap<String, Response>,
}

/// Location of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query, header, cookie)
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter is required
    pub required: bool,
    #[serde(rename = "allowEmptyValue", skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,
    /// Parameter schema
    pub schema: Schema,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Request body description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
    /// Specification extensions (`x-...`)
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: SchemaMap,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    #[serde(rename = "jsonSchemaDialect", skip_serializing_if = "Option::is_none")]
    pub json_schema_dialect: Option<String>,
    /// API info
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// API paths
    pub paths: BTreeMap<String, PathItem>,
    /// Components (schemas, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl OpenApiDocument {
    /// Registered component schemas
    pub fn schemas(&self) -> Option<&SchemaMap> {
        self.components.as_ref().map(|c| &c.schemas)
    }

    /// Rewrite the document into the OpenAPI 3.1 dialect
    pub fn convert_to_v3_1(&mut self) {
        self.openapi = OpenApiVersion::V3_1.as_str().to_string();
        self.json_schema_dialect = Some(JSON_SCHEMA_DIALECT.to_string());

        let mut upgrade = |schema: &mut Schema| {
            if let Some(example) = schema.example.take() {
                schema.examples = Some(vec![example]);
            }
        };
        if let Some(components) = self.components.as_mut() {
            for schema in components.schemas.values_mut() {
                schema.visit_mut(&mut upgrade);
            }
        }
        for item in self.paths.values_mut() {
            for operation in item.operations_mut() {
                for parameter in operation.parameters.iter_mut() {
                    parameter.schema.visit_mut(&mut upgrade);
                }
                let request = operation.request_body.iter_mut().map(|b| &mut b.content);
                let responses = operation.responses.values_mut().filter_map(|r| r.content.as_mut());
                for content in request.chain(responses) {
                    for schema in content.values_mut().filter_map(|m| m.schema.as_mut()) {
                        schema.visit_mut(&mut upgrade);
                    }
                }
            }
        }
    }
}

/// OpenAPI document builder
///
/// Drives the path walker over every `(prefix, router)` pair and collects the component
/// schemas built on the way. Each call to [`OpenApiBuilder::generate`] starts from an empty
/// document.
pub struct OpenApiBuilder {
    config: GeneratorConfig,
    /// Registered type descriptors
    type_resolver: TypeResolver,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder
    pub fn new(config: GeneratorConfig) -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            config,
            type_resolver: TypeResolver::new(),
        }
    }

    /// Use the given registry of type descriptors
    pub fn with_types(mut self, type_resolver: TypeResolver) -> Self {
        self.type_resolver = type_resolver;
        self
    }

    /// Register the descriptor of a Rust domain type
    pub fn register_model<T: ApiModel>(mut self) -> Self {
        self.type_resolver.register_model::<T>();
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Build the document for the given routers, walked in order
    pub fn generate<'r, I, P>(&self, routers: I) -> Result<OpenApiDocument>
    where
        I: IntoIterator<Item = (P, &'r Router)>,
        P: AsRef<str>,
    {
        info!("Starting OpenAPI generation...");

        let extras = self
            .config
            .extra_components
            .as_ref()
            .map(|supplier| supplier())
            .unwrap_or_default();
        let mut type_resolver = self.type_resolver.clone();
        type_resolver.extend(extras.iter().cloned());

        let mut schema_gen = SchemaGenerator::new(type_resolver)
            .with_generic_scope(self.config.generic_scope)
            .with_domain(self.config.domain.clone());
        for extra in &extras {
            if extra.name.trim().is_empty() {
                continue;
            }
            schema_gen.build_component(&ModelRef::named(&extra.name, &extra.module));
        }

        let walker = PathWalker::new(&self.config);
        let mut paths = BTreeMap::new();
        for (prefix, router) in routers {
            debug!("Walking router mounted at '{}'", prefix.as_ref());
            walker.walk(prefix.as_ref(), router, &mut paths, &mut schema_gen)?;
        }

        let schemas = schema_gen.into_schemas();
        let mut document = OpenApiDocument {
            openapi: OpenApiVersion::V3_0.as_str().to_string(),
            json_schema_dialect: None,
            info: Info {
                title: self.config.title.clone(),
                version: self.config.version.clone(),
                description: self.config.description.clone(),
            },
            servers: self
                .config
                .servers
                .iter()
                .map(|url| Server { url: url.clone() })
                .collect(),
            paths,
            components: if schemas.is_empty() {
                None
            } else {
                Some(Components { schemas })
            },
        };
        if self.config.openapi_version == OpenApiVersion::V3_1 {
            document.convert_to_v3_1();
        }

        info!(
            "Generated {} paths and {} component schemas",
            document.paths.len(),
            document.schemas().map_or(0, |s| s.len())
        );
        Ok(document)
    }

    /// Build the document and write it in the requested format
    pub fn generate_string<'r, I, P>(
        &self,
        routers: I,
        format: Option<OutputFormat>,
        pretty: bool,
    ) -> Result<String>
    where
        I: IntoIterator<Item = (P, &'r Router)>,
        P: AsRef<str>,
    {
        let document = self.generate(routers)?;
        serializer::write(&document, format, pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Describe, FieldDef, TypeDef};
    use crate::metadata::RouteMetadata;
    use crate::route::Route;
    use pretty_assertions::assert_eq;

    fn users_router() -> Router {
        Router::new()
            .route(Route::new("/users").method(HttpMethod::Get))
            .route(Route::new("/users/:id").methods([HttpMethod::Get, HttpMethod::Delete]))
    }

    #[test]
    fn test_document_shell() {
        let config = GeneratorConfig::builder()
            .title("Mesh API")
            .version("2.1.0")
            .servers(["https://a.example", "https://b.example"])
            .build()
            .unwrap();
        let document = OpenApiBuilder::new(config)
            .generate([("", &Router::new())])
            .unwrap();

        assert_eq!(document.openapi, "3.0.3");
        assert_eq!(document.info.title, "Mesh API");
        assert_eq!(document.info.version, "2.1.0");
        assert_eq!(
            document.servers,
            vec![
                Server { url: "https://a.example".to_string() },
                Server { url: "https://b.example".to_string() },
            ]
        );
        assert!(document.paths.is_empty());
        assert!(document.components.is_none());
    }

    #[test]
    fn test_generate_is_idempotent() {
        let router = users_router();
        let builder = OpenApiBuilder::new(GeneratorConfig::default());
        let first = builder.generate([("/api", &router)]).unwrap();
        let second = builder.generate([("/api", &router)]).unwrap();
        assert_eq!(first, second);
        assert!(first.paths.contains_key("/api/users/{id}"));
    }

    #[test]
    fn test_routers_sharing_a_path_share_an_entry() {
        let reader = Router::new().route(Route::new("/items").method(HttpMethod::Get));
        let writer = Router::new().route(Route::new("/items").method(HttpMethod::Post));
        let document = OpenApiBuilder::new(GeneratorConfig::default())
            .generate([("/v1", &reader), ("/v1", &writer)])
            .unwrap();

        let item = &document.paths["/v1/items"];
        assert!(item.get.is_some());
        assert!(item.post.is_some());
    }

    #[test]
    fn test_extra_components_are_seeded() {
        let config = GeneratorConfig::builder()
            .extra_components(|| {
                vec![
                    TypeDef::object("GenericMessage", "app::rest")
                        .field(FieldDef::new("message", String::type_ref()).required()),
                    TypeDef::object(" ", "app::rest"),
                ]
            })
            .build()
            .unwrap();
        let document = OpenApiBuilder::new(config)
            .generate([("", &Router::new())])
            .unwrap();

        let schemas = document.schemas().unwrap();
        assert_eq!(schemas.len(), 1);
        assert_eq!(
            schemas["GenericMessage"].required,
            Some(vec!["message".to_string()])
        );
    }

    #[test]
    fn test_version_3_1_output() {
        let config = GeneratorConfig::builder()
            .openapi_version(OpenApiVersion::V3_1)
            .build()
            .unwrap();
        let router = Router::new().route(
            Route::new("/search").metadata(
                RouteMetadata::builder()
                    .query_parameter(
                        "q",
                        crate::metadata::ParamSpec::new("Query").example("mesh"),
                    )
                    .build(),
            ),
        );
        let document = OpenApiBuilder::new(config)
            .generate([("", &router)])
            .unwrap();

        assert_eq!(document.openapi, "3.1.0");
        assert_eq!(
            document.json_schema_dialect.as_deref(),
            Some(JSON_SCHEMA_DIALECT)
        );
        let operation = document.paths["/search"].get.as_ref().unwrap();
        let schema = &operation.parameters[0].schema;
        assert!(schema.example.is_none());
        assert_eq!(schema.examples, Some(vec![serde_json::json!("mesh")]));
    }

    #[test]
    fn test_path_item_merge() {
        let mut item = PathItem::with_summary(Some("first".to_string()));
        item.set_operation(HttpMethod::Get, Operation::default());

        let mut other = PathItem::default();
        other.set_operation(HttpMethod::Trace, Operation::default());
        item.merge(other);

        assert_eq!(item.summary.as_deref(), Some("first"));
        let methods: Vec<HttpMethod> = item.operations().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Trace]);
    }

    #[test]
    fn test_response_extensions_are_flattened() {
        let mut response = Response {
            description: "application/octet-stream".to_string(),
            ..Response::default()
        };
        response
            .extensions
            .insert("x-is-file".to_string(), serde_json::Value::Bool(true));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["x-is-file"], true);
        assert!(json.get("content").is_none());
    }
}
