use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors surfaced by document generation.
///
/// Data-shape problems inside the schema and path walkers never reach this type; they
/// degrade to untyped schema fragments instead. Only configuration problems abort.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Please specify a response format: YAML or JSON")]
    MissingFormat,

    #[error("Unsupported OpenAPI format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid path pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Manifest error {}: {message}", file.display())]
    Manifest { file: PathBuf, message: String },

    #[error("Invalid route metadata: {0}")]
    InvalidMetadata(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::Serialization(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for GenerationError {
    fn from(err: serde_yaml::Error) -> Self {
        GenerationError::Serialization(format!("YAML serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_format_message() {
        let err = GenerationError::MissingFormat;
        assert_eq!(
            err.to_string(),
            "Please specify a response format: YAML or JSON"
        );
    }

    #[test]
    fn test_invalid_pattern_keeps_source() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = GenerationError::InvalidPattern {
            pattern: "(".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid path pattern `(`"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_manifest_error_shows_file() {
        let err = GenerationError::Manifest {
            file: PathBuf::from("routes/api.yaml"),
            message: "missing field `routes`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Manifest error routes/api.yaml: missing field `routes`"
        );
    }
}
