//! Configuration constants and validation functions for the extractor.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ExportError, Result};
use crate::extract::{ProjectionConfig, TableView};
use crate::store::RetryPolicy;

/// Extension of every published table.
pub const TABLE_EXTENSION: &str = ".csv";

/// Container tables are published to when none is configured.
pub const DEFAULT_CONTAINER: &str = "bites-ai-dev";

/// Directory the CLI publishes into when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "./out";

/// HTTP timeout in seconds.
///
/// Exports of several years run to hundreds of megabytes.
pub const HTTP_TIMEOUT_SECS: u64 = 120;

/// Default maximum HTTP response size in bytes (2 GB).
pub const DEFAULT_MAX_RESPONSE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Attempts per download or publish, including the first.
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff in milliseconds.
pub const RETRY_BASE_DELAY_MS: u64 = 500;

/// Calendar days covered by the daily aggregate.
pub const AGGREGATE_WINDOW_DAYS: u64 = 30;

/// Key used for a kind whose name has no usable characters.
const FALLBACK_KEY_STEM: &str = "unnamed";

const ENV_CONTAINER: &str = "HEALTH_EXPORT_CONTAINER";
const ENV_OUTPUT_DIR: &str = "HEALTH_EXPORT_OUTPUT_DIR";
const ENV_PROJECTION: &str = "HEALTH_EXPORT_PROJECTION";
const ENV_SOURCE_URL: &str = "HEALTH_EXPORT_SOURCE_URL";
const ENV_MAX_RETRIES: &str = "HEALTH_EXPORT_MAX_RETRIES";

/// Validate a container name.
///
/// A container is a single path segment: non-empty, no separators, and not
/// `.` or `..`.
///
/// # Examples
/// ```
/// use health_export::config::validate_container;
///
/// assert!(validate_container("bites-ai-dev").is_ok());
/// assert!(validate_container("..").is_err());
/// assert!(validate_container("a/b").is_err());
/// ```
pub fn validate_container(container: &str) -> Result<()> {
    if container.is_empty()
        || container == "."
        || container == ".."
        || container.contains(['/', '\\', '\0'])
    {
        return Err(ExportError::InvalidLocation(container.to_string()));
    }
    Ok(())
}

/// Validate a blob key.
///
/// Keys may nest with `/`, but every segment must be a real name.
///
/// # Examples
/// ```
/// use health_export::config::validate_key;
///
/// assert!(validate_key("42/export.xml").is_ok());
/// assert!(validate_key("../secret").is_err());
/// assert!(validate_key("/abs.csv").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<()> {
    let bad_segment = key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if key.is_empty() || bad_segment || key.contains(['\\', '\0']) {
        return Err(ExportError::InvalidLocation(key.to_string()));
    }
    Ok(())
}

/// Strip everything outside `[A-Za-z0-9._-]`.
///
/// # Examples
/// ```
/// use health_export::config::sanitize_key_component;
///
/// assert_eq!(sanitize_key_component("StepCount"), "StepCount");
/// assert_eq!(sanitize_key_component("a/b c"), "abc");
/// ```
pub fn sanitize_key_component(component: &str) -> String {
    component
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_' || *c == '.')
        .collect()
}

/// Blob key a kind's table is published under.
///
/// # Examples
/// ```
/// use health_export::config::table_key;
///
/// assert_eq!(table_key("HeartRate"), "HeartRate.csv");
/// assert_eq!(table_key("../"), "unnamed.csv");
/// ```
pub fn table_key(kind_name: &str) -> String {
    let stem = sanitize_key_component(kind_name);
    // A stem of only dots would make a hidden or traversing key
    if stem.chars().all(|c| c == '.') {
        return format!("{FALLBACK_KEY_STEM}{TABLE_EXTENSION}");
    }
    format!("{stem}{TABLE_EXTENSION}")
}

/// Runtime settings for an extraction run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub container: String,
    pub output_dir: PathBuf,
    pub projection_path: Option<PathBuf>,
    pub source_url: Option<String>,
    pub max_retries: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            projection_path: None,
            source_url: None,
            max_retries: MAX_RETRIES,
        }
    }
}

impl ExportConfig {
    /// Read settings from `HEALTH_EXPORT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let container = lookup(ENV_CONTAINER).unwrap_or_else(|| DEFAULT_CONTAINER.into());
        validate_container(&container)
            .map_err(|_| ExportError::Config(format!("{ENV_CONTAINER}={container} is not a valid container")))?;

        let output_dir = lookup(ENV_OUTPUT_DIR)
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.into())
            .into();

        let projection_path = lookup(ENV_PROJECTION).map(PathBuf::from);

        let source_url = lookup(ENV_SOURCE_URL).filter(|url| !url.is_empty());

        let max_retries = lookup(ENV_MAX_RETRIES)
            .and_then(|v| v.parse().ok())
            .filter(|n: &u32| *n > 0)
            .unwrap_or(MAX_RETRIES);

        Ok(Self {
            container,
            output_dir,
            projection_path,
            source_url,
            max_retries,
        })
    }

    #[must_use]
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    #[must_use]
    pub fn with_projection_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.projection_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Retry policy for publishing and downloading.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        }
    }

    /// Table view, loading the projection file if one is configured.
    pub fn table_view(&self) -> Result<TableView> {
        match &self.projection_path {
            Some(path) => Ok(TableView::Projected(ProjectionConfig::from_file(path)?)),
            None => Ok(TableView::Full),
        }
    }
}
