//! Backing storage medium for uploaded files.
//!
//! The medium is the system of record for file bytes. The store never writes
//! to it; the upload path places bytes there first and then hands the
//! resulting [`FileMetadata`](crate::FileMetadata) to the store.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::MediumError;

/// Existence checks and best-effort removal against the backing medium
#[async_trait]
pub trait StorageMedium: Send + Sync + 'static {
    /// Checks that the object under `storage_key` is present and readable,
    /// without transferring its bytes.
    async fn verify(&self, storage_key: &str) -> Result<(), MediumError>;

    /// Removes the object under `storage_key`.
    async fn delete(&self, storage_key: &str) -> Result<(), MediumError>;
}

/// A directory on the local filesystem, one file per storage key
#[derive(Debug, Clone)]
pub struct DiskMedium {
    root: PathBuf,
}

impl DiskMedium {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the objects live in
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the object stored under `storage_key`
    ///
    /// Returns `None` for keys that are not a single plain path component,
    /// so a key can never point outside the root.
    pub fn path_for(&self, storage_key: &str) -> Option<PathBuf> {
        is_plain_key(storage_key).then(|| self.root.join(storage_key))
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(['/', '\\', '\0'])
}

#[async_trait]
impl StorageMedium for DiskMedium {
    async fn verify(&self, storage_key: &str) -> Result<(), MediumError> {
        let missing = || MediumError::Missing(storage_key.to_string());
        let path = self.path_for(storage_key).ok_or_else(missing)?;

        // Opening proves readability; nothing is read.
        let file = tokio::fs::File::open(&path).await.map_err(|_| missing())?;
        let metadata = file.metadata().await.map_err(|_| missing())?;
        if metadata.is_file() {
            Ok(())
        } else {
            Err(missing())
        }
    }

    async fn delete(&self, storage_key: &str) -> Result<(), MediumError> {
        let path = self.path_for(storage_key).ok_or_else(|| MediumError::DeleteFailed {
            key: storage_key.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "storage key is not a plain name"),
        })?;

        tokio::fs::remove_file(&path)
            .await
            .map_err(|source| MediumError::DeleteFailed {
                key: storage_key.to_string(),
                source,
            })
    }
}
