//! Serialization module for converting OpenAPI documents to YAML or JSON format.
//!
//! This module provides functions to serialize OpenAPI documents into standard formats
//! and write them to files or return them as strings.

use crate::error::{GenerationError, Result};
use crate::openapi_builder::OpenApiDocument;
use anyhow::Context;
use log::debug;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Output format of a written document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Yaml => f.write_str("YAML"),
            OutputFormat::Json => f.write_str("JSON"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YAML" => Ok(OutputFormat::Yaml),
            "JSON" => Ok(OutputFormat::Json),
            _ => Err(GenerationError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Write a document in the requested format.
///
/// YAML output ignores `pretty`. JSON output is indented when `pretty` is set and compact
/// otherwise.
///
/// # Errors
///
/// Returns [`GenerationError::MissingFormat`] when no format is given.
pub fn write(doc: &OpenApiDocument, format: Option<OutputFormat>, pretty: bool) -> Result<String> {
    match format {
        Some(OutputFormat::Yaml) => serialize_yaml(doc),
        Some(OutputFormat::Json) if pretty => serialize_json(doc),
        Some(OutputFormat::Json) => serialize_json_compact(doc),
        None => Err(GenerationError::MissingFormat),
    }
}

/// Serializes an OpenAPI document to YAML format.
///
/// # Example
///
/// ```
/// use openapi_from_routes::config::GeneratorConfig;
/// use openapi_from_routes::openapi_builder::OpenApiBuilder;
/// use openapi_from_routes::route::Router;
/// use openapi_from_routes::serializer::serialize_yaml;
///
/// let router = Router::new();
/// let doc = OpenApiBuilder::new(GeneratorConfig::default())
///     .generate([("", &router)])
///     .unwrap();
/// let yaml = serialize_yaml(&doc).unwrap();
/// assert!(yaml.contains("openapi: 3.0.3"));
/// ```
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    Ok(serde_yaml::to_string(doc)?)
}

/// Serializes an OpenAPI document to JSON format with pretty printing.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Serializes an OpenAPI document to single-line JSON.
pub fn serialize_json_compact(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to compact JSON");
    Ok(serde_json::to_string(doc)?)
}

/// Writes string content to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does. Missing parent
/// directories are created.
pub fn write_to_file(content: &str, path: &Path) -> anyhow::Result<()> {
    debug!("Writing content to file: {}", path.display());

    // Create parent directories if they don't exist
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
