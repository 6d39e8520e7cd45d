//! In-process blob store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{BlobLocation, BlobSink, BlobSource};
use crate::error::{ExportError, Result};

/// Blob store kept in memory.
///
/// Each instance is independent; share one by reference between a source
/// and a sink when a round trip is wanted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<BTreeMap<BlobLocation, Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a blob directly.
    pub fn insert(&self, location: BlobLocation, bytes: impl Into<Vec<u8>>) {
        self.lock().insert(location, bytes.into());
    }

    /// Copy of a stored blob.
    #[must_use]
    pub fn get(&self, location: &BlobLocation) -> Option<Vec<u8>> {
        self.lock().get(location).cloned()
    }

    /// All stored locations, sorted.
    #[must_use]
    pub fn locations(&self) -> Vec<BlobLocation> {
        self.lock().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<BlobLocation, Vec<u8>>> {
        // A panic while holding the lock can't leave a half-written map entry
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlobSource for MemoryStore {
    fn fetch(&self, location: &BlobLocation) -> Result<Vec<u8>> {
        self.get(location).ok_or_else(|| ExportError::NotFound {
            container: location.container.clone(),
            key: location.key.clone(),
        })
    }
}

impl BlobSink for MemoryStore {
    fn put(&self, location: &BlobLocation, bytes: &[u8]) -> Result<()> {
        self.insert(location.clone(), bytes);
        Ok(())
    }
}
