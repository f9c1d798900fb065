//! OpenAPI from routes - OpenAPI documents from HTTP route trees and model descriptors.
//!
//! The library walks a tree of [`route::Router`]s, where each route may carry
//! [`metadata::RouteMetadata`] describing parameters, media types and example payloads, and
//! turns it into an OpenAPI 3.0 or 3.1 document. Request and response models are described
//! statically through [`descriptor::ApiModel`] or declared in manifests, then converted to
//! component schemas with every reachable type registered exactly once.
//!
//! # Architecture
//!
//! 1. [`descriptor`] - Static type descriptors for domain models and built-in types
//! 2. [`type_resolver`] - Registry of descriptors and parser of type expressions
//! 3. [`type_mapper`] - Maps a single type reference to a schema fragment
//! 4. [`schema_generator`] - Builds component schemas for a model and everything it reaches
//! 5. [`path_walker`] - Converts routers and route metadata into path items
//! 6. [`openapi_builder`] - Document model and top-level generation
//! 7. [`serializer`] - Writes the document as YAML or JSON
//!
//! The command line tool reads manifests through [`scanner`], [`parser`] and [`manifest`].
//!
//! # Example Usage
//!
//! ```
//! use openapi_from_routes::config::GeneratorConfig;
//! use openapi_from_routes::descriptor::{ApiModel, FieldDef, TypeDef, TypeRef};
//! use openapi_from_routes::metadata::{ParamSpec, RouteMetadata};
//! use openapi_from_routes::openapi_builder::OpenApiBuilder;
//! use openapi_from_routes::route::{HttpMethod, Route, Router};
//! use openapi_from_routes::serializer::{self, OutputFormat};
//!
//! struct User;
//!
//! impl ApiModel for User {
//!     fn type_def() -> TypeDef {
//!         TypeDef::object_of::<Self>()
//!             .field(FieldDef::new("name", TypeRef::string()).required())
//!     }
//! }
//!
//! let router = Router::new().route(
//!     Route::new("/users/:id").method(HttpMethod::Get).metadata(
//!         RouteMetadata::builder()
//!             .description("Load a user")
//!             .path_parameter("id", ParamSpec::new("User id"))
//!             .produces("application/json")
//!             .model_of::<User>()
//!             .build(),
//!     ),
//! );
//!
//! let config = GeneratorConfig::builder().title("Users").build().unwrap();
//! let doc = OpenApiBuilder::new(config).generate([("/api", &router)]).unwrap();
//! assert!(doc.paths.contains_key("/api/users/{id}"));
//! assert!(doc.schemas().unwrap().contains_key("User"));
//!
//! let yaml = serializer::write(&doc, Some(OutputFormat::Yaml), true).unwrap();
//! println!("{}", yaml);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod openapi_builder;
pub mod parser;
pub mod path_walker;
pub mod route;
pub mod scanner;
pub mod schema;
pub mod schema_generator;
pub mod serializer;
pub mod type_mapper;
pub mod type_resolver;
