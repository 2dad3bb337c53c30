use std::sync::Arc;
use std::time::Duration;

use crate::codec::{ShareAddresses, StandardResult};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::medium::StorageMedium;
use crate::record::{FileMetadata, FileRecord, LinkRecord};
use crate::stores::{LinkStore, ResourceStore};
use crate::sweeper::Sweeper;

/// What a bare token resolved to
#[derive(Debug, Clone)]
pub enum Resolved {
    Link(LinkRecord),
    File(FileRecord),
}

/// Link store, resource store and share addresses behind one handle
///
/// This is the surface the request layer talks to. Every operation returns a
/// [`StandardResult`]; lookup failures never surface as faults.
pub struct Ephemera<M> {
    links: LinkStore,
    files: ResourceStore<M>,
    addresses: ShareAddresses,
}

impl<M> Clone for Ephemera<M> {
    fn clone(&self) -> Self {
        Self {
            links: self.links.clone(),
            files: self.files.clone(),
            addresses: self.addresses.clone(),
        }
    }
}

impl<M: StorageMedium> Ephemera<M> {
    /// Creates both stores, empty, from one configuration
    pub fn new(config: &StoreConfig, medium: Arc<M>, addresses: ShareAddresses) -> Self {
        Self {
            links: LinkStore::new(config),
            files: ResourceStore::new(config, medium),
            addresses,
        }
    }

    pub fn create_link(&self, target_url: impl Into<String>, ttl: Option<Duration>) -> StandardResult {
        let outcome = self.links.create(target_url, ttl).map(|(record, _)| record);
        StandardResult::from_link(&outcome, &self.addresses)
    }

    pub fn resolve_link(&self, token: &str) -> StandardResult {
        StandardResult::from_link(&self.links.find(token), &self.addresses)
    }

    pub fn create_file_record(&self, metadata: FileMetadata, ttl: Option<Duration>) -> StandardResult {
        let outcome = self.files.create(metadata, ttl).map(|(record, _)| record);
        StandardResult::from_file(&outcome, &self.addresses)
    }

    pub async fn resolve_file_record(&self, token: &str) -> StandardResult {
        StandardResult::from_file(&self.files.find(token).await, &self.addresses)
    }

    /// Resolves a token that may name either a link or a file
    ///
    /// Links take precedence. When the token is not a link, the file
    /// lookup's error (not found or dangling) is returned.
    pub async fn resolve(&self, token: &str) -> Result<Resolved, StoreError> {
        if let Ok(link) = self.links.find(token) {
            return Ok(Resolved::Link(link));
        }
        self.files.find(token).await.map(Resolved::File)
    }

    /// A sweeper over both stores, for the periodic trigger
    pub fn sweeper(&self) -> Sweeper<M> {
        Sweeper::new(self.links.clone(), self.files.clone())
    }

    pub fn links(&self) -> &LinkStore {
        &self.links
    }

    pub fn files(&self) -> &ResourceStore<M> {
        &self.files
    }

    pub fn addresses(&self) -> &ShareAddresses {
        &self.addresses
    }
}
