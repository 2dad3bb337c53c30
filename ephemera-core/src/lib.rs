//! # Ephemera Core
//!
//! Token-keyed ephemeral store behind a URL shortener and temporary file host.
//!
//! ## Features
//!
//! - Short tokens from a 36-symbol alphabet whose length grows with the table
//! - Collision-free creation under concurrency (`DashMap` entry API)
//! - Per-record TTL with lazy expiry: records stay resolvable until purged
//! - File lookups reconciled against the backing medium, with a bounded wait
//! - Background sweep that purges both stores and re-sizes link tokens
//!
//! ## Example
//!
//! ```rust,no_run
//! use ephemera_core::{DiskMedium, Ephemera, ShareAddresses, StoreConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = StoreConfig::default();
//!     let service = Ephemera::new(
//!         &config,
//!         Arc::new(DiskMedium::new("uploads")),
//!         ShareAddresses::new("https://sho.rt"),
//!     );
//!
//!     // Sweep expired records every five minutes
//!     let _sweeper = service.sweeper().spawn(config.sweep_interval);
//!
//!     let created = service.create_link("https://example.com", Some(Duration::from_secs(60)));
//!     println!("{}", created.share_address.unwrap_or_default());
//! }
//! ```

mod codec;
mod config;
mod error;
mod medium;
mod record;
mod service;
mod stores;
mod sweeper;
mod table;
pub mod token;

pub use codec::{ReasonCode, RecordFields, ShareAddresses, StandardResult};
pub use config::StoreConfig;
pub use error::{MediumError, StoreError};
pub use medium::{DiskMedium, StorageMedium};
pub use record::{FileMetadata, FileRecord, LinkRecord, LinkTarget, Record};
pub use service::{Ephemera, Resolved};
pub use stores::{LinkStore, ResourceStore};
pub use sweeper::{SweepReport, Sweeper, SweeperHandle};
pub use table::{GenerationStats, PurgeStats, TokenTable, MAX_TTL};

// Re-export defaults for use by the server layer
pub use config::{DEFAULT_MAX_TOKEN_LENGTH, DEFAULT_MIN_TOKEN_LENGTH, DEFAULT_TTL};
