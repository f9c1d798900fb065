//! OpenAPI from routes - Command-line tool for generating OpenAPI documents.
//!
//! Reads declarative manifests describing routers, route metadata and model types and
//! writes an OpenAPI 3.0 or 3.1 document.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-routes [OPTIONS] <MANIFEST_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation from a directory of manifests:
//! ```bash
//! openapi-from-routes ./api -o openapi.yaml
//! ```
//!
//! Generate compact OpenAPI 3.1 JSON:
//! ```bash
//! openapi-from-routes ./api/users.yaml -f json --compact --openapi-version 3.1
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! openapi-from-routes ./api -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_routes::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    // Initialize logger based on verbose flag
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI from routes starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
