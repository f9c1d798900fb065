use crate::manifest::{ApiDefinition, Manifest, ManifestFormat};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Parser turning manifest files into API definitions.
///
/// YAML is assumed for files without a recognised extension.
///
/// # Example
///
/// ```no_run
/// use openapi_from_routes::parser::ManifestParser;
/// use std::path::Path;
///
/// let parsed = ManifestParser::parse_file(Path::new("api/users.yaml")).unwrap();
/// println!("Parsed {} routers", parsed.definition.routers.len());
/// ```
pub struct ManifestParser;

/// A successfully parsed manifest
#[derive(Debug)]
pub struct ParsedManifest {
    /// Path to the manifest file
    pub path: PathBuf,
    pub definition: ApiDefinition,
}

impl ManifestParser {
    /// Parses a single manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file is not valid YAML or JSON for its format
    /// - A type expression or route declaration is invalid
    pub fn parse_file(path: &Path) -> Result<ParsedManifest> {
        debug!("Parsing manifest: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let format = ManifestFormat::from_path(path).unwrap_or(ManifestFormat::Yaml);

        let manifest = if content.trim().is_empty() {
            Manifest::default()
        } else {
            Manifest::from_str_as(&content, format)
                .with_context(|| format!("Failed to parse manifest: {}", path.display()))?
        };
        let definition = manifest.into_definition(path)?;

        debug!(
            "Parsed {}: {} routers, {} types",
            path.display(),
            definition.routers.len(),
            definition.types.len()
        );

        Ok(ParsedManifest {
            path: path.to_path_buf(),
            definition,
        })
    }

    /// Parses multiple manifests, continuing even if some fail.
    ///
    /// Returns one result per input path, in input order. Failures are logged as warnings.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedManifest>> {
        debug!("Parsing {} manifests", paths.len());

        let results: Vec<Result<ParsedManifest>> = paths
            .iter()
            .map(|path| {
                Self::parse_file(path).inspect_err(|e| {
                    warn!("Failed to parse {}: {:#}", path.display(), e);
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}
