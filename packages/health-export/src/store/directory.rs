//! Filesystem-backed blob store.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{BlobLocation, BlobSink, BlobSource};
use crate::error::{ExportError, Result};

/// Blob store rooted at a directory; containers are subdirectories.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a blob.
    #[must_use]
    pub fn path_for(&self, location: &BlobLocation) -> PathBuf {
        self.root.join(&location.container).join(&location.key)
    }
}

impl BlobSource for DirectoryStore {
    fn fetch(&self, location: &BlobLocation) -> Result<Vec<u8>> {
        match fs::read(self.path_for(location)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ExportError::NotFound {
                container: location.container.clone(),
                key: location.key.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

impl BlobSink for DirectoryStore {
    /// Uses atomic write pattern: writes to a temp file in the target
    /// directory, syncs to disk, then renames over the destination. The
    /// temp file is removed if any step fails.
    fn put(&self, location: &BlobLocation, bytes: &[u8]) -> Result<()> {
        let target = self.path_for(location);
        let dir = target
            .parent()
            .ok_or_else(|| ExportError::InvalidLocation(location.to_string()))?;
        fs::create_dir_all(dir)?;

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;
        staged.persist(&target).map_err(|e| e.error)?;

        Ok(())
    }
}
