//! Error types for the extractor.
//!
//! `ExportError` covers the whole taxonomy: malformed input and unsupported
//! field types are fatal for the document or table at hand, sink failures
//! are surfaced after retries run out. Unexpected tags are not errors; the
//! classifier reports them as warnings.

use thiserror::Error;

/// Main error type for the extractor library.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Input bytes are not a parseable XML document.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A field type code the formatter does not recognize.
    #[error("Unsupported field type '{0}'. Expected one of s/string, n/number, d/datetime")]
    UnsupportedType(String),

    /// No schema is registered for the tag.
    #[error("No schema registered for tag <{0}>")]
    UnknownSchema(String),

    /// Projection configuration does not fit the schema it targets.
    #[error("Invalid projection for <{tag}>: {reason}")]
    InvalidProjection { tag: String, reason: String },

    /// Container or key that cannot address a blob.
    #[error("Invalid blob location '{0}'")]
    InvalidLocation(String),

    /// Requested blob does not exist.
    #[error("Blob not found: {container}/{key}")]
    NotFound { container: String, key: String },

    /// The egress sink failed to persist a table.
    #[error("Failed to publish {key} after {attempts} attempt(s): {message}")]
    Sink {
        key: String,
        attempts: u32,
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Transient failures kept happening until the retry budget ran out.
    #[error("Giving up after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// Response body larger than the configured limit.
    #[error("Response too large: {size} bytes exceeds limit of {limit} bytes")]
    ResponseTooLarge { size: u64, limit: u64 },

    /// Export stopped between kinds because its deadline passed.
    #[error("Deadline exceeded after publishing {published} table(s)")]
    DeadlineExceeded { published: usize },

    /// A produced table could not be read back.
    #[error("Malformed table: {0}")]
    MalformedTable(String),

    /// A table lacks a column the aggregate needs.
    #[error("Table has no '{0}' column")]
    MissingColumn(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error.
    #[error("YAML parsing failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Whether retrying the same operation could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(_) | Self::Sink { .. } | Self::RetriesExhausted { .. } => true,
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

impl From<roxmltree::Error> for ExportError {
    fn from(e: roxmltree::Error) -> Self {
        Self::MalformedInput(e.to_string())
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        Self::MalformedTable(e.to_string())
    }
}

/// Result type alias for extractor operations.
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExportError::UnsupportedType("x".to_string());
        assert!(err.to_string().contains("'x'"));
        assert!(err.to_string().contains("s/string"));
    }

    #[test]
    fn test_sink_error_display() {
        let err = ExportError::Sink {
            key: "StepCount.csv".to_string(),
            attempts: 3,
            message: "disk full".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to publish StepCount.csv after 3 attempt(s): disk full"
        );
    }

    #[test]
    fn test_xml_error_is_malformed_input() {
        let err: ExportError = roxmltree::Document::parse("<HealthData>")
            .map(|_| ())
            .unwrap_err()
            .into();
        assert!(matches!(err, ExportError::MalformedInput(_)));
    }

    #[test]
    fn test_csv_error_is_malformed_table() {
        let mut reader = csv::Reader::from_reader("a,b\n1\n".as_bytes());
        let err: ExportError = reader.records().next().unwrap().unwrap_err().into();
        assert!(matches!(err, ExportError::MalformedTable(_)));
    }

    #[test]
    fn test_is_transient() {
        let io = ExportError::Io(std::io::Error::other("busy"));
        assert!(io.is_transient());
        assert!(!ExportError::MalformedInput("bad".into()).is_transient());
        assert!(!ExportError::UnsupportedType("q".into()).is_transient());
    }
}
