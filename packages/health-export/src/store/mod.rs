//! Blob store boundary.
//!
//! The extractor never reaches out to storage on its own: callers hand it a
//! [`BlobSource`] to read the export from and a [`BlobSink`] to publish
//! tables to. Implementations are injected per invocation; none is global.

mod directory;
mod http;
mod memory;
mod retry;

use std::fmt;

pub use directory::DirectoryStore;
pub use http::{create_client, download_bytes, HttpSource};
pub use memory::MemoryStore;
pub use retry::{publish_with_retry, RetryPolicy};

use crate::config::{validate_container, validate_key};
use crate::error::Result;

/// Address of a blob: a container (bucket, directory) and a key within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobLocation {
    pub container: String,
    pub key: String,
}

impl BlobLocation {
    /// Create a validated location.
    ///
    /// # Errors
    /// `ExportError::InvalidLocation` if the container or key could escape
    /// its namespace or is empty.
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let container = container.into();
        let key = key.into();
        validate_container(&container)?;
        validate_key(&key)?;
        Ok(Self { container, key })
    }

    /// Parse `container/key`.
    ///
    /// # Examples
    /// ```
    /// use health_export::store::BlobLocation;
    ///
    /// let loc = BlobLocation::parse("user-42/export.xml").unwrap();
    /// assert_eq!(loc.container, "user-42");
    /// assert_eq!(loc.key, "export.xml");
    /// assert!(BlobLocation::parse("no-slash").is_err());
    /// ```
    pub fn parse(path: &str) -> Result<Self> {
        let (container, key) = path
            .split_once('/')
            .ok_or_else(|| crate::error::ExportError::InvalidLocation(path.to_string()))?;
        Self::new(container, key)
    }
}

impl fmt::Display for BlobLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

/// Supplies raw document bytes.
pub trait BlobSource: Send + Sync {
    /// Read a whole blob.
    fn fetch(&self, location: &BlobLocation) -> Result<Vec<u8>>;
}

/// Durably stores produced tables.
///
/// `put` must be all-or-nothing: after a failed call no partial blob is
/// visible under the location.
pub trait BlobSink: Send + Sync {
    /// Store a whole blob, replacing any previous one.
    fn put(&self, location: &BlobLocation, bytes: &[u8]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;

    #[test]
    fn test_blob_location_display() {
        let loc = BlobLocation::new("health", "StepCount.csv").unwrap();
        assert_eq!(loc.to_string(), "health/StepCount.csv");
    }

    #[test]
    fn test_blob_location_rejects_traversal() {
        assert!(matches!(
            BlobLocation::new("..", "x.csv"),
            Err(ExportError::InvalidLocation(_))
        ));
        assert!(BlobLocation::new("health", "../x.csv").is_err());
        assert!(BlobLocation::new("", "x.csv").is_err());
    }

    #[test]
    fn test_blob_location_parse_nested_key() {
        let loc = BlobLocation::parse("bites/42/export.xml").unwrap();
        assert_eq!(loc.container, "bites");
        assert_eq!(loc.key, "42/export.xml");
    }
}
