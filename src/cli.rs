use crate::config::{GenericScope, OpenApiVersion};
use crate::manifest::ApiDefinition;
use crate::openapi_builder::OpenApiBuilder;
use crate::parser::{ManifestParser, ParsedManifest};
use crate::scanner::FileScanner;
use crate::serializer::{self, write_to_file, OutputFormat};
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

/// OpenAPI from routes - Generate OpenAPI documents from declarative route and model manifests
#[derive(Parser, Debug)]
#[command(name = "openapi-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Manifest file, or a directory searched for .yaml, .yml and .json manifests
    #[arg(value_name = "MANIFEST_PATH")]
    pub manifest_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Write JSON on a single line
    #[arg(long = "compact")]
    pub compact: bool,

    /// OpenAPI version of the document (3.0 or 3.1)
    #[arg(long = "openapi-version", default_value = "3.0")]
    pub openapi_version: OpenApiVersion,

    /// Fail when an endpoint lacks descriptions or examples
    #[arg(long = "strict")]
    pub strict: bool,

    /// How generic arguments are tracked while building components (per-field or accumulated)
    #[arg(long = "generic-scope", default_value = "per-field")]
    pub generic_scope: GenericScope,

    /// Document title, overriding the manifest info
    #[arg(long = "title")]
    pub title: Option<String>,

    /// Document version, overriding the manifest info
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// Module prefix of the domain types, overriding the manifest domain
    #[arg(long = "domain")]
    pub domain: Option<String>,

    /// Additional path pattern to exclude (repeatable)
    #[arg(long = "blacklist", value_name = "REGEX")]
    pub blacklist: Vec<String>,

    /// Additional path pattern to include (repeatable)
    #[arg(long = "whitelist", value_name = "REGEX")]
    pub whitelist: Vec<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.manifest_path.exists() {
        anyhow::bail!(
            "Manifest path does not exist: {}",
            args.manifest_path.display()
        );
    }

    info!("Manifest path: {}", args.manifest_path.display());
    info!("Output format: {}", args.output_format);
    info!("OpenAPI version: {}", args.openapi_version);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Load every manifest under the path and merge them in path order
pub fn load_definition(args: &CliArgs) -> Result<ApiDefinition> {
    info!("Scanning for manifests...");
    let scan_result = FileScanner::new(args.manifest_path.clone()).scan()?;
    info!("Found {} manifest files", scan_result.manifest_files.len());

    if scan_result.manifest_files.is_empty() {
        anyhow::bail!("No manifest files found in {}", args.manifest_path.display());
    }

    let parsed: Vec<ParsedManifest> = ManifestParser::parse_files(&scan_result.manifest_files)
        .into_iter()
        .filter_map(|r| match r {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping manifest due to error: {:#}", e);
                None
            }
        })
        .collect();

    info!("Successfully parsed {} manifests", parsed.len());
    if parsed.is_empty() {
        anyhow::bail!("No manifests could be parsed successfully");
    }

    let mut definition = ApiDefinition::merge_all(parsed.into_iter().map(|p| p.definition));
    if let Some(title) = &args.title {
        definition.info.get_or_insert_with(Default::default).title = Some(title.clone());
    }
    if let Some(version) = &args.api_version {
        definition.info.get_or_insert_with(Default::default).version = Some(version.clone());
    }
    if let Some(domain) = &args.domain {
        definition.domain = Some(domain.clone());
    }
    if !args.blacklist.is_empty() {
        definition
            .blacklist
            .get_or_insert_with(Vec::new)
            .extend(args.blacklist.iter().cloned());
    }
    if !args.whitelist.is_empty() {
        definition
            .whitelist
            .get_or_insert_with(Vec::new)
            .extend(args.whitelist.iter().cloned());
    }
    Ok(definition)
}

/// Generate the document text for the given arguments
pub fn generate(args: &CliArgs) -> Result<String> {
    let definition = load_definition(args)?;
    info!(
        "Loaded {} routers and {} types",
        definition.routers.len(),
        definition.types.len()
    );

    let config = definition
        .config_builder()
        .openapi_version(args.openapi_version)
        .generic_scope(args.generic_scope)
        .strict(args.strict)
        .build()
        .context("Invalid generator configuration")?;

    info!("Building OpenAPI document...");
    let builder = OpenApiBuilder::new(config).with_types(definition.type_resolver());
    let document = builder.generate(definition.router_refs())?;
    info!(
        "Built {} paths and {} components",
        document.paths.len(),
        document.schemas().map_or(0, |s| s.len())
    );

    info!("Serializing to {} format...", args.output_format);
    Ok(serializer::write(
        &document,
        Some(args.output_format),
        !args.compact,
    )?)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");
    let content = generate(&args)?;

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["openapi-from-routes", "api"]).unwrap();
        assert_eq!(args.manifest_path, PathBuf::from("api"));
        assert_eq!(args.output_format, OutputFormat::Yaml);
        assert_eq!(args.openapi_version, OpenApiVersion::V3_0);
        assert_eq!(args.generic_scope, GenericScope::PerField);
        assert!(!args.compact);
        assert!(!args.strict);
        assert!(args.output_path.is_none());
    }

    #[test]
    fn test_all_options() {
        let args = CliArgs::try_parse_from([
            "openapi-from-routes",
            "api.yaml",
            "-f",
            "json",
            "-o",
            "out/openapi.json",
            "--compact",
            "--openapi-version",
            "3.1",
            "--strict",
            "--generic-scope",
            "accumulated",
            "--blacklist",
            "/internal/.*",
            "--blacklist",
            "/debug/.*",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        assert_eq!(args.output_path, Some(PathBuf::from("out/openapi.json")));
        assert!(args.compact);
        assert_eq!(args.openapi_version, OpenApiVersion::V3_1);
        assert!(args.strict);
        assert_eq!(args.generic_scope, GenericScope::Accumulated);
        assert_eq!(args.blacklist.len(), 2);
        assert!(args.verbose);
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(CliArgs::try_parse_from(["openapi-from-routes", "api", "-f", "xml"]).is_err());
        assert!(
            CliArgs::try_parse_from(["openapi-from-routes", "api", "--openapi-version", "2.0"])
                .is_err()
        );
    }

    #[test]
    fn test_missing_manifest_path() {
        let args = CliArgs::try_parse_from(["openapi-from-routes", "/nonexistent/api"]).unwrap();
        assert!(parse_args_from_parsed(args).is_err());
    }
}
