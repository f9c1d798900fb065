//! Generator configuration.
//!
//! [`GeneratorConfig`] is an immutable value assembled once through
//! [`GeneratorConfigBuilder`]. Path filter patterns are compiled when the configuration is
//! built, so an invalid pattern is reported before any generation starts.

use crate::descriptor::TypeDef;
use crate::error::{GenerationError, Result};
use crate::openapi_builder::PathItem;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Title used when none is configured
pub const DEFAULT_TITLE: &str = "Generated API";

/// How generic arguments are tracked while a component is built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenericScope {
    /// Every field sees only its own arguments, with parent type variables substituted
    #[default]
    PerField,
    /// Arguments accumulate over the whole walk of a type and leak into later fields
    Accumulated,
}

impl FromStr for GenericScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "per-field" | "per_field" | "perfield" => Ok(GenericScope::PerField),
            "accumulated" => Ok(GenericScope::Accumulated),
            other => Err(format!("Unknown generic scope: {}", other)),
        }
    }
}

/// OpenAPI dialect of the written document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenApiVersion {
    #[default]
    V3_0,
    V3_1,
}

impl OpenApiVersion {
    /// Value of the document's `openapi` field
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenApiVersion::V3_0 => "3.0.3",
            OpenApiVersion::V3_1 => "3.1.0",
        }
    }
}

impl fmt::Display for OpenApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpenApiVersion {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "3.0" | "3.0.3" => Ok(OpenApiVersion::V3_0),
            "3.1" | "3.1.0" => Ok(OpenApiVersion::V3_1),
            other => Err(GenerationError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// A set of anchored path patterns; a path matches when any pattern matches it entirely
#[derive(Debug, Clone)]
pub struct PathFilter {
    patterns: Vec<Regex>,
}

impl PathFilter {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
                    GenerationError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Hook that may rewrite a path entry and move it to a new key
pub type PathRewriter = Box<dyn Fn(&str, &mut PathItem) -> String>;

/// Supplier of model types registered as components before any route is walked
pub type ComponentSupplier = Box<dyn Fn() -> Vec<TypeDef>>;

/// Generator configuration
pub struct GeneratorConfig {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    pub servers: Vec<String>,
    pub blacklist: Option<PathFilter>,
    /// When set, only matching paths are documented; an empty whitelist admits nothing
    pub whitelist: Option<PathFilter>,
    /// Module prefix of the application's own types
    pub domain: Option<String>,
    pub generic_scope: GenericScope,
    pub openapi_version: OpenApiVersion,
    /// Validate route metadata and abort on incomplete documentation
    pub strict: bool,
    pub path_rewriter: Option<PathRewriter>,
    pub extra_components: Option<ComponentSupplier>,
}

impl GeneratorConfig {
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::default()
    }

    /// Whether a converted path passes the blacklist and the whitelist
    pub fn admits(&self, path: &str) -> bool {
        if self.blacklist.as_ref().is_some_and(|b| b.matches(path)) {
            return false;
        }
        match &self.whitelist {
            Some(whitelist) => whitelist.matches(path),
            None => true,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            version: "1.0.0".to_string(),
            description: None,
            servers: Vec::new(),
            blacklist: None,
            whitelist: None,
            domain: None,
            generic_scope: GenericScope::default(),
            openapi_version: OpenApiVersion::default(),
            strict: false,
            path_rewriter: None,
            extra_components: None,
        }
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("title", &self.title)
            .field("version", &self.version)
            .field("servers", &self.servers)
            .field("blacklist", &self.blacklist)
            .field("whitelist", &self.whitelist)
            .field("domain", &self.domain)
            .field("generic_scope", &self.generic_scope)
            .field("openapi_version", &self.openapi_version)
            .field("strict", &self.strict)
            .field("path_rewriter", &self.path_rewriter.is_some())
            .field("extra_components", &self.extra_components.is_some())
            .finish()
    }
}

/// Builder for [`GeneratorConfig`]
#[derive(Default)]
pub struct GeneratorConfigBuilder {
    title: Option<String>,
    version: Option<String>,
    description: Option<String>,
    servers: Vec<String>,
    blacklist: Option<Vec<String>>,
    whitelist: Option<Vec<String>>,
    domain: Option<String>,
    generic_scope: GenericScope,
    openapi_version: OpenApiVersion,
    strict: bool,
    path_rewriter: Option<PathRewriter>,
    extra_components: Option<ComponentSupplier>,
}

impl GeneratorConfigBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.servers.push(url.into());
        self
    }

    pub fn servers<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.servers.extend(urls.into_iter().map(Into::into));
        self
    }

    pub fn blacklist<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn whitelist<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn generic_scope(mut self, scope: GenericScope) -> Self {
        self.generic_scope = scope;
        self
    }

    pub fn openapi_version(mut self, version: OpenApiVersion) -> Self {
        self.openapi_version = version;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn path_rewriter<F>(mut self, rewriter: F) -> Self
    where
        F: Fn(&str, &mut PathItem) -> String + 'static,
    {
        self.path_rewriter = Some(Box::new(rewriter));
        self
    }

    pub fn extra_components<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> Vec<TypeDef> + 'static,
    {
        self.extra_components = Some(Box::new(supplier));
        self
    }

    /// Compile the filters and produce the configuration
    pub fn build(self) -> Result<GeneratorConfig> {
        let blacklist = self.blacklist.map(PathFilter::new).transpose()?;
        let whitelist = self.whitelist.map(PathFilter::new).transpose()?;
        Ok(GeneratorConfig {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            version: self.version.unwrap_or_else(|| "1.0.0".to_string()),
            description: self.description,
            servers: self.servers,
            blacklist,
            whitelist,
            domain: self.domain,
            generic_scope: self.generic_scope,
            openapi_version: self.openapi_version,
            strict: self.strict,
            path_rewriter: self.path_rewriter,
            extra_components: self.extra_components,
        })
    }
}
