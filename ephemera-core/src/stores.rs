//! The two concrete stores: short links and hosted files.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::StoreConfig;
use crate::error::{MediumError, StoreError};
use crate::medium::StorageMedium;
use crate::record::{FileMetadata, FileRecord, LinkRecord, LinkTarget};
use crate::table::{GenerationStats, PurgeStats, TokenTable};

/// Truncates a URL for logging
fn truncate_for_log(value: &str) -> String {
    const MAX_LOG_LEN: usize = 48;
    match value.char_indices().nth(MAX_LOG_LEN) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}

/// Token → external URL
#[derive(Clone)]
pub struct LinkStore {
    table: TokenTable<LinkTarget>,
}

impl LinkStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            table: TokenTable::new(config),
        }
    }

    /// Shortens `target_url` under a new token
    pub fn create(
        &self,
        target_url: impl Into<String>,
        ttl: Option<Duration>,
    ) -> Result<(LinkRecord, GenerationStats), StoreError> {
        let target_url = target_url.into();
        tracing::debug!("LINK {}", truncate_for_log(&target_url));
        self.table.create(LinkTarget { target_url }, ttl)
    }

    /// Looks up a link; expired-but-unpurged links are still returned
    pub fn find(&self, token: &str) -> Result<LinkRecord, StoreError> {
        self.table.find(token)
    }

    pub fn purge_at(&self, now: Instant) -> PurgeStats {
        self.table.purge_at(now)
    }

    /// Adapts the token length to the number of live links
    pub fn recalculate_length(&self) -> usize {
        self.table.recalculate_length()
    }

    pub fn table(&self) -> &TokenTable<LinkTarget> {
        &self.table
    }
}

/// Token → uploaded file, reconciled against the backing medium
///
/// The table alone does not prove a file exists: bytes can vanish from the
/// medium behind the store's back, so every lookup re-checks the medium.
pub struct ResourceStore<M> {
    table: TokenTable<FileMetadata>,
    medium: Arc<M>,
    verify_timeout: Duration,
}

impl<M> Clone for ResourceStore<M> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            medium: Arc::clone(&self.medium),
            verify_timeout: self.verify_timeout,
        }
    }
}

impl<M: StorageMedium> ResourceStore<M> {
    pub fn new(config: &StoreConfig, medium: Arc<M>) -> Self {
        Self {
            table: TokenTable::new(config),
            medium,
            verify_timeout: config.verify_timeout,
        }
    }

    /// Registers a file whose bytes are already on the medium
    pub fn create(
        &self,
        metadata: FileMetadata,
        ttl: Option<Duration>,
    ) -> Result<(FileRecord, GenerationStats), StoreError> {
        tracing::debug!(
            "FILE {} ({}, {})",
            metadata.storage_key,
            metadata.original_name,
            metadata.mime_type
        );
        self.table.create(metadata, ttl)
    }

    /// Looks up a file and confirms its bytes are still on the medium
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the token is unknown.
    /// - `StoreError::DanglingReference` if the record exists but the medium
    ///   reports the object missing or does not answer within `verify_timeout`.
    pub async fn find(&self, token: &str) -> Result<FileRecord, StoreError> {
        let record = self.table.find(token)?;
        let storage_key = &record.payload().storage_key;

        let outcome = tokio::time::timeout(self.verify_timeout, self.medium.verify(storage_key))
            .await
            .unwrap_or_else(|_| Err(MediumError::Timeout(storage_key.clone())));

        match outcome {
            Ok(()) => Ok(record),
            Err(err) => {
                if matches!(err, MediumError::Timeout(_)) {
                    tracing::warn!("FIND {}: {}", token, err);
                } else {
                    tracing::debug!("FIND {}: {}", token, err);
                }
                Err(StoreError::DanglingReference {
                    token: token.to_string(),
                    storage_key: storage_key.clone(),
                })
            }
        }
    }

    /// Purges expired files, then asks the medium to drop their bytes
    ///
    /// Removal from the table is final. A failed or timed-out delete is
    /// logged and counted in `delete_failures`, never retried, and does not
    /// stop the rest of the pass.
    pub async fn purge_at(&self, now: Instant) -> PurgeStats {
        let start = Instant::now();
        let (mut stats, removed) = self.table.drain_expired(now);

        for record in removed {
            let storage_key = &record.payload().storage_key;
            let outcome = tokio::time::timeout(self.verify_timeout, self.medium.delete(storage_key))
                .await
                .unwrap_or_else(|_| Err(MediumError::Timeout(storage_key.clone())));

            if let Err(err) = outcome {
                tracing::warn!("purge of {} left its bytes behind: {}", record.token(), err);
                stats.delete_failures += 1;
            }
        }

        stats.elapsed = start.elapsed();
        stats
    }

    pub fn table(&self) -> &TokenTable<FileMetadata> {
        &self.table
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }
}
