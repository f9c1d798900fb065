//! Declarative API manifests.
//!
//! A manifest is a YAML or JSON file describing routers, route metadata and model types.
//! It is the input of the command line tool:
//!
//! ```yaml
//! info:
//!   title: Blog API
//!   version: 1.2.0
//! servers: [https://blog.example/api]
//! domain: blog
//! routers:
//!   - prefix: /api/v1
//!     routes:
//!       - path: /posts/:uuid
//!         methods: [GET]
//!         metadata:
//!           description: Load a post
//!           pathParameters:
//!             uuid: { description: Post uuid, example: 2f1c }
//!           produces: [application/json]
//!           exampleResponses:
//!             200: { description: Loaded post, model: Post, example: { title: Hello } }
//! types:
//!   - name: Post
//!     module: blog::model
//!     fields:
//!       - { name: title, type: String, required: true }
//!       - { name: tags, type: Vec<String> }
//! ```
//!
//! Type expressions use Rust syntax and are parsed with [`TypeResolver::parse_type`].

use crate::config::GeneratorConfigBuilder;
use crate::config::GeneratorConfig;
use crate::descriptor::{module_of, simple_name, FieldDef, ModelRef, TypeDef};
use crate::error::{GenerationError, Result};
use crate::metadata::{ParamSpec, RouteMetadata};
use crate::route::{HttpMethod, Route, Router};
use crate::type_resolver::TypeResolver;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Syntax of a manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
}

impl ManifestFormat {
    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(ManifestFormat::Yaml),
            "json" => Some(ManifestFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InfoSpec {
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

/// Raw manifest as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Manifest {
    pub info: Option<InfoSpec>,
    pub servers: Vec<String>,
    pub domain: Option<String>,
    pub blacklist: Option<Vec<String>>,
    pub whitelist: Option<Vec<String>>,
    pub routers: Vec<RouterSpec>,
    pub types: Vec<TypeSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterSpec {
    pub prefix: String,
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteSpec {
    pub path: Option<String>,
    pub name: Option<String>,
    pub methods: Vec<HttpMethod>,
    pub metadata: Option<MetadataSpec>,
    /// Routes of a sub-router mounted under this route
    pub routes: Option<Vec<RouteSpec>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataSpec {
    pub method: Option<HttpMethod>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub insecure: bool,
    pub path_parameters: BTreeMap<String, ParamSpec>,
    pub query_parameters: BTreeMap<String, ParamSpec>,
    pub produces: Vec<String>,
    pub consumes: Vec<String>,
    pub models: Vec<String>,
    pub example_responses: BTreeMap<u16, ExampleResponseSpec>,
    pub example_request: Option<ExampleRequestSpec>,
}

/// Example response; `model`, `json` and `text` are tried in that order
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExampleResponseSpec {
    pub description: String,
    pub model: Option<String>,
    pub example: Option<serde_json::Value>,
    pub json: Option<serde_json::Value>,
    pub text: Option<String>,
}

/// Example request; `model`, `json`, `text` and `form` are tried in that order
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExampleRequestSpec {
    pub model: Option<String>,
    pub example: Option<serde_json::Value>,
    pub json: Option<serde_json::Value>,
    pub text: Option<String>,
    pub form: Option<BTreeMap<String, ParamSpec>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TypeSpec {
    pub name: String,
    pub module: String,
    pub type_params: Vec<String>,
    /// Parent type expression, e.g. `Page<User>`
    pub extends: Option<String>,
    pub implements: Vec<String>,
    /// Enum constants; the type is an object when absent
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<String>>,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub description: Option<String>,
    pub rename: Option<String>,
    pub default: Option<String>,
    pub required: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub deserialize_as: Option<String>,
}

impl Manifest {
    pub fn from_str_as(content: &str, format: ManifestFormat) -> Result<Self> {
        match format {
            ManifestFormat::Yaml => Ok(serde_yaml::from_str(content)?),
            ManifestFormat::Json => Ok(serde_json::from_str(content)?),
        }
    }

    /// Convert the manifest into routers and type descriptors.
    ///
    /// `file` only names the source in error messages.
    pub fn into_definition(self, file: &Path) -> Result<ApiDefinition> {
        let manifest_error = |message: String| GenerationError::Manifest {
            file: file.to_path_buf(),
            message,
        };

        let types = self
            .types
            .iter()
            .map(|spec| spec.to_type_def().map_err(manifest_error))
            .collect::<Result<Vec<_>>>()?;
        let routers = self
            .routers
            .iter()
            .map(|spec| Ok((spec.prefix.clone(), router_from(&spec.routes)?)))
            .collect::<std::result::Result<Vec<_>, String>>()
            .map_err(manifest_error)?;

        Ok(ApiDefinition {
            info: self.info,
            servers: self.servers,
            domain: self.domain,
            blacklist: self.blacklist,
            whitelist: self.whitelist,
            routers,
            types,
        })
    }
}

impl TypeSpec {
    fn to_type_def(&self) -> std::result::Result<TypeDef, String> {
        if self.name.trim().is_empty() {
            return Err("Type without a name".to_string());
        }
        let mut def = match &self.enum_values {
            Some(constants) => TypeDef::enumeration(&self.name, &self.module, constants.clone()),
            None => TypeDef::object(&self.name, &self.module),
        };
        def.type_params = self.type_params.clone();

        if let Some(parent) = &self.extends {
            let parent = TypeResolver::parse_type(parent, &self.type_params)
                .map_err(|e| format!("Invalid parent type `{}` of {}: {}", parent, self.name, e))?;
            def = def.extends(parent);
        }
        for interface in &self.implements {
            def = def.implements(model_ref(interface));
        }
        for field in &self.fields {
            let ty = TypeResolver::parse_type(&field.ty, &self.type_params).map_err(|e| {
                format!(
                    "Invalid type `{}` of field {}.{}: {}",
                    field.ty, self.name, field.name, e
                )
            })?;
            let mut field_def = FieldDef::new(&field.name, ty);
            field_def.description = field.description.clone();
            field_def.rename = field.rename.clone();
            field_def.default_value = field.default.clone();
            field_def.required = field.required;
            field_def.is_static = field.is_static;
            field_def.deserialize_as = field.deserialize_as.as_deref().map(model_ref);
            def = def.field(field_def);
        }
        Ok(def)
    }
}

/// `blog::model::Post` or `Post` -> model reference
fn model_ref(name: &str) -> ModelRef {
    ModelRef::named(simple_name(name), module_of(name))
}

fn router_from(routes: &[RouteSpec]) -> std::result::Result<Router, String> {
    let mut router = Router::new();
    for spec in routes {
        let mut route = match &spec.path {
            Some(path) => Route::new(path),
            None => Route::unmatched(),
        }
        .methods(spec.methods.iter().copied());
        route.name = spec.name.clone();
        if let Some(metadata) = &spec.metadata {
            route = route.metadata(metadata.to_metadata());
        }
        if let Some(children) = &spec.routes {
            route = route.sub_router(router_from(children)?);
        }
        router.push(route);
    }
    Ok(router)
}

impl MetadataSpec {
    fn to_metadata(&self) -> RouteMetadata {
        let mut builder = RouteMetadata::builder().insecure(self.insecure);
        if let Some(method) = self.method {
            builder = builder.method(method);
        }
        if let Some(name) = &self.display_name {
            builder = builder.display_name(name);
        }
        if let Some(description) = &self.description {
            builder = builder.description(description);
        }
        for (name, spec) in &self.path_parameters {
            builder = builder.path_parameter(name, spec.clone().required());
        }
        for (name, spec) in &self.query_parameters {
            builder = builder.query_parameter(name, spec.clone());
        }
        for media_type in &self.produces {
            builder = builder.produces(media_type);
        }
        for media_type in &self.consumes {
            builder = builder.consumes(media_type);
        }
        for model in &self.models {
            builder = builder.model(model_ref(model));
        }
        for (status, example) in &self.example_responses {
            builder = if let Some(model) = &example.model {
                let value = example.example.clone().unwrap_or_else(|| serde_json::json!({}));
                builder.example_response_of(*status, model_ref(model), value, &example.description)
            } else if let Some(json) = &example.json {
                builder.example_response_json(*status, json.clone(), &example.description)
            } else if let Some(text) = &example.text {
                builder.example_response_text(*status, text, &example.description)
            } else {
                builder.example_response(*status, &example.description)
            };
        }
        if let Some(request) = &self.example_request {
            if let Some(model) = &request.model {
                let value = request.example.clone().unwrap_or_else(|| serde_json::json!({}));
                builder = builder.example_request_of(model_ref(model), value);
            } else if let Some(json) = &request.json {
                builder = builder.example_request_json(json.clone());
            } else if let Some(text) = &request.text {
                builder = builder.example_request_text(text);
            } else if let Some(form) = &request.form {
                builder = builder.example_request_form(form.clone());
            }
        }
        builder.build()
    }
}

/// Routers, types and document settings loaded from one or more manifests
#[derive(Debug, Clone, Default)]
pub struct ApiDefinition {
    pub info: Option<InfoSpec>,
    pub servers: Vec<String>,
    pub domain: Option<String>,
    pub blacklist: Option<Vec<String>>,
    pub whitelist: Option<Vec<String>>,
    /// `(prefix, router)` pairs in declaration order
    pub routers: Vec<(String, Router)>,
    pub types: Vec<TypeDef>,
}

impl ApiDefinition {
    /// Merge definitions in order.
    ///
    /// Routers, types, servers and filter patterns are concatenated. The first info block
    /// and the first domain win.
    pub fn merge_all(definitions: impl IntoIterator<Item = ApiDefinition>) -> ApiDefinition {
        definitions
            .into_iter()
            .fold(ApiDefinition::default(), |mut merged, next| {
                merged.info = merged.info.or(next.info);
                merged.domain = merged.domain.or(next.domain);
                merged.servers.extend(next.servers);
                merged.blacklist = concat_patterns(merged.blacklist, next.blacklist);
                merged.whitelist = concat_patterns(merged.whitelist, next.whitelist);
                merged.routers.extend(next.routers);
                merged.types.extend(next.types);
                merged
            })
    }

    /// Registry of every declared type
    pub fn type_resolver(&self) -> TypeResolver {
        let mut resolver = TypeResolver::new();
        resolver.extend(self.types.iter().cloned());
        resolver
    }

    /// Configuration builder pre-filled with the manifest settings
    pub fn config_builder(&self) -> GeneratorConfigBuilder {
        let mut builder = GeneratorConfig::builder().servers(self.servers.iter().cloned());
        if let Some(info) = &self.info {
            if let Some(title) = &info.title {
                builder = builder.title(title);
            }
            if let Some(version) = &info.version {
                builder = builder.version(version);
            }
            if let Some(description) = &info.description {
                builder = builder.description(description);
            }
        }
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain);
        }
        if let Some(blacklist) = &self.blacklist {
            builder = builder.blacklist(blacklist.iter().cloned());
        }
        if let Some(whitelist) = &self.whitelist {
            builder = builder.whitelist(whitelist.iter().cloned());
        }
        builder
    }

    /// Routers as `(prefix, router)` references, ready for generation
    pub fn router_refs(&self) -> Vec<(&str, &Router)> {
        self.routers
            .iter()
            .map(|(prefix, router)| (prefix.as_str(), router))
            .collect()
    }
}

fn concat_patterns(a: Option<Vec<String>>, b: Option<Vec<String>>) -> Option<Vec<String>> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.into_iter().chain(b).flatten().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{TypeDefKind, TypeKind, TypeRef};
    use crate::metadata::{ExampleOrigin, APPLICATION_JSON, MULTIPART_FORM_DATA};
    use std::path::PathBuf;

    const BLOG: &str = r#"
info:
  title: Blog API
  version: 1.2.0
servers: [https://blog.example/api]
domain: blog
blacklist: ["/internal/.*"]
routers:
  - prefix: /api/v1
    routes:
      - path: /posts
        name: posts
        routes:
          - path: /:uuid
            methods: [GET, DELETE]
            metadata:
              method: GET
              displayName: Load post
              description: Load a post
              pathParameters:
                uuid: { description: Post uuid, example: 2f1c }
              produces: [application/json]
              models: [blog::model::Tag]
              exampleResponses:
                200: { description: Loaded post, model: Post, example: { title: Hello } }
                404: { description: Not found }
          - path: /
            methods: [POST]
            metadata:
              method: POST
              exampleRequest:
                form:
                  binary: { type: file, description: Cover image }
types:
  - name: Post
    module: blog::model
    extends: Entity
    fields:
      - { name: title, type: String, required: true }
      - { name: tags, type: "Vec<Tag>" }
      - { name: state, type: State, rename: publishState }
  - name: State
    module: blog::model
    enum: [DRAFT, PUBLISHED]
"#;

    fn load(content: &str) -> ApiDefinition {
        Manifest::from_str_as(content, ManifestFormat::Yaml)
            .unwrap()
            .into_definition(Path::new("blog.yaml"))
            .unwrap()
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ManifestFormat::from_path(Path::new("a/b.YML")), Some(ManifestFormat::Yaml));
        assert_eq!(ManifestFormat::from_path(Path::new("api.json")), Some(ManifestFormat::Json));
        assert_eq!(ManifestFormat::from_path(Path::new("Cargo.toml")), None);
    }

    #[test]
    fn test_routers_are_converted() {
        let definition = load(BLOG);
        assert_eq!(definition.routers.len(), 1);
        let (prefix, router) = &definition.routers[0];
        assert_eq!(prefix, "/api/v1");

        let posts = &router.routes[0];
        assert_eq!(posts.name.as_deref(), Some("posts"));
        assert!(posts.methods.is_empty());
        let children = posts.sub_router.as_ref().unwrap();
        assert_eq!(children.routes.len(), 2);

        let load = &children.routes[0];
        assert_eq!(load.methods, vec![HttpMethod::Get, HttpMethod::Delete]);
        let metadata = load.metadata.as_ref().unwrap();
        assert_eq!(metadata.display_name.as_deref(), Some("Load post"));
        assert!(metadata.path_parameters["uuid"].required);
        assert_eq!(metadata.models, vec![ModelRef::named("Tag", "blog::model")]);

        let ok = &metadata.example_responses[&200];
        assert!(matches!(&ok.origin, Some(ExampleOrigin::Model(m)) if m.name == "Post"));
        let body = ok.body.as_ref().unwrap();
        assert_eq!(body[APPLICATION_JSON].example, Some(serde_json::json!({"title": "Hello"})));
        assert!(metadata.example_responses[&404].body.is_none());

        let create = children.routes[1].metadata.as_ref().unwrap();
        let request = create.example_request.as_ref().unwrap();
        assert!(request.body.contains_key(MULTIPART_FORM_DATA));
    }

    #[test]
    fn test_types_are_converted() {
        let definition = load(BLOG);
        let resolver = definition.type_resolver();

        let post = resolver.lookup("Post").unwrap();
        assert_eq!(post.module, "blog::model");
        assert_eq!(post.parent, Some(TypeRef::named("Entity", "")));
        assert!(post.fields[0].required);
        assert_eq!(post.fields[1].ty.kind, TypeKind::List);
        assert_eq!(post.fields[2].serialized_name(), "publishState");

        let state = resolver.lookup("State").unwrap();
        assert_eq!(
            state.kind,
            TypeDefKind::Enum(vec!["DRAFT".to_string(), "PUBLISHED".to_string()])
        );
    }

    #[test]
    fn test_config_builder_uses_manifest_settings() {
        let config = load(BLOG).config_builder().build().unwrap();
        assert_eq!(config.title, "Blog API");
        assert_eq!(config.version, "1.2.0");
        assert_eq!(config.servers, vec!["https://blog.example/api"]);
        assert_eq!(config.domain.as_deref(), Some("blog"));
        assert!(!config.admits("/internal/metrics"));
    }

    #[test]
    fn test_invalid_type_expression_names_file() {
        let content = r#"
types:
  - name: Broken
    fields:
      - { name: items, type: "Vec<" }
"#;
        let err = Manifest::from_str_as(content, ManifestFormat::Yaml)
            .unwrap()
            .into_definition(Path::new("broken.yaml"))
            .unwrap_err();
        match err {
            GenerationError::Manifest { file, message } => {
                assert_eq!(file, PathBuf::from("broken.yaml"));
                assert!(message.contains("field Broken.items"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_json_manifest() {
        let content = r#"{
            "routers": [{ "prefix": "", "routes": [{ "path": "/ping", "methods": ["GET"] }] }],
            "types": [{ "name": "Pong", "fields": [{ "name": "at", "type": "i64" }] }]
        }"#;
        let definition = Manifest::from_str_as(content, ManifestFormat::Json)
            .unwrap()
            .into_definition(Path::new("api.json"))
            .unwrap();
        assert_eq!(definition.routers[0].1.routes[0].path.as_deref(), Some("/ping"));
        assert_eq!(definition.types[0].name, "Pong");
    }

    #[test]
    fn test_merge_all() {
        let first = ApiDefinition {
            info: Some(InfoSpec {
                title: Some("First".to_string()),
                ..InfoSpec::default()
            }),
            servers: vec!["https://one".to_string()],
            blacklist: Some(vec!["/a".to_string()]),
            routers: vec![("/one".to_string(), Router::new())],
            ..ApiDefinition::default()
        };
        let second = ApiDefinition {
            info: Some(InfoSpec {
                title: Some("Second".to_string()),
                ..InfoSpec::default()
            }),
            servers: vec!["https://two".to_string()],
            blacklist: Some(vec!["/b".to_string()]),
            domain: Some("app".to_string()),
            routers: vec![("/two".to_string(), Router::new())],
            types: vec![TypeDef::object("User", "app")],
            ..ApiDefinition::default()
        };

        let merged = ApiDefinition::merge_all([first, second]);
        assert_eq!(merged.info.unwrap().title.as_deref(), Some("First"));
        assert_eq!(merged.servers, vec!["https://one", "https://two"]);
        assert_eq!(merged.blacklist, Some(vec!["/a".to_string(), "/b".to_string()]));
        assert!(merged.whitelist.is_none());
        assert_eq!(merged.domain.as_deref(), Some("app"));
        let prefixes: Vec<&str> = merged.routers.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(prefixes, vec!["/one", "/two"]);
        assert_eq!(merged.types.len(), 1);
    }
}
