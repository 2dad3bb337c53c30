//! Places uploaded bytes on the disk medium before the store is told about them.

use ephemera_core::{DiskMedium, FileMetadata};
use std::io;
use uuid::Uuid;

/// Filename used when the client sends none (or only unusable characters)
const FALLBACK_NAME: &str = "file";

/// Reduces a client-supplied filename to something safe to echo back in headers
///
/// Keeps only the last path component and drops quotes and control characters.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Writes `bytes` under a fresh random storage key and describes the result
pub async fn store_upload(
    medium: &DiskMedium,
    original_name: Option<&str>,
    mime_type: Option<&str>,
    bytes: &[u8],
) -> io::Result<FileMetadata> {
    let storage_key = Uuid::new_v4().simple().to_string();
    let path = medium
        .path_for(&storage_key)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "bad storage key"))?;

    tokio::fs::create_dir_all(medium.root()).await?;
    tokio::fs::write(&path, bytes).await?;
    tracing::debug!("stored {} bytes as {}", bytes.len(), storage_key);

    Ok(FileMetadata {
        storage_key,
        original_name: sanitize_filename(original_name.unwrap_or(FALLBACK_NAME)),
        mime_type: mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or("application/octet-stream")
            .to_string(),
    })
}

/// Removes bytes written by [`store_upload`] when the store refused the record
pub async fn discard_upload(medium: &DiskMedium, storage_key: &str) {
    if let Some(path) = medium.path_for(storage_key) {
        if let Err(err) = tokio::fs::remove_file(&path).await {
            tracing::warn!("could not discard upload {}: {}", storage_key, err);
        }
    }
}
