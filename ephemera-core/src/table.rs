use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::record::Record;
use crate::token;

/// TTLs are capped to ~100 years so deadline arithmetic on `Instant` cannot overflow.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Observability data for a single `create` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationStats {
    /// Number of tokens generated before a free one was found
    pub attempts: u32,
    /// Length of the token that was issued
    pub length: usize,
    pub elapsed: Duration,
}

/// Observability data for a single purge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeStats {
    /// Entries visited during the pass
    pub scanned: usize,
    /// Entries removed from the table
    pub deleted: usize,
    /// Backing objects whose removal failed (file tables only)
    pub delete_failures: usize,
    pub elapsed: Duration,
}

/// Internal shared state for the table
struct TableInner<P> {
    data: DashMap<String, Record<P>>,
    /// Length handed to the generator on the next `create`
    length: AtomicUsize,
    default_ttl: Duration,
    min_length: usize,
    max_length: usize,
    max_attempts: u32,
}

/// Token-keyed table of records with TTL semantics
///
/// Backed by `DashMap`. `create` claims a token through the map's entry API,
/// which holds the shard lock across the "is it free" check and the insert,
/// so two concurrent creations can never end up with the same token.
///
/// Expiry is lazy: [`find`](Self::find) never looks at the deadline and a
/// record stays resolvable until [`purge_at`](Self::purge_at) removes it.
///
/// Clones share the same underlying data.
pub struct TokenTable<P> {
    inner: Arc<TableInner<P>>,
}

impl<P> Clone for TokenTable<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Clone> TokenTable<P> {
    /// Creates an empty table configured from `config`
    ///
    /// The first generated tokens are `min_token_length + 1` symbols long.
    pub fn new(config: &StoreConfig) -> Self {
        let inner = TableInner {
            data: DashMap::new(),
            length: AtomicUsize::new(token::length_for(0, config.min_token_length)),
            default_ttl: config.default_ttl,
            min_length: config.min_token_length,
            max_length: config.max_token_length,
            max_attempts: config.max_attempts_per_length,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Resolves the TTL for a new record
    ///
    /// A missing or zero TTL selects the table default.
    fn effective_ttl(&self, ttl: Option<Duration>) -> Duration {
        match ttl {
            Some(ttl) if !ttl.is_zero() => ttl.min(MAX_TTL),
            _ => self.inner.default_ttl.min(MAX_TTL),
        }
    }

    /// Inserts `payload` under a freshly generated, unused token
    ///
    /// Generation retries up to `max_attempts_per_length` times at the
    /// current length. When every attempt collides, the length is bumped by
    /// one (and kept for later calls) until `max_token_length` is reached.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GenerationExhausted` if no free token was found
    /// even at the maximum length.
    pub fn create(
        &self,
        payload: P,
        ttl: Option<Duration>,
    ) -> Result<(Record<P>, GenerationStats), StoreError> {
        let start = Instant::now();
        let ttl = self.effective_ttl(ttl);
        let mut length = self.current_length();
        let mut attempts = 0u32;

        loop {
            for _ in 0..self.inner.max_attempts {
                attempts += 1;
                let candidate = token::generate(length);

                // The entry guard keeps the shard locked until the insert lands.
                if let Entry::Vacant(slot) = self.inner.data.entry(candidate.clone()) {
                    let record = Record::new(candidate, ttl, payload);
                    slot.insert(record.clone());

                    let stats = GenerationStats {
                        attempts,
                        length,
                        elapsed: start.elapsed(),
                    };
                    tracing::debug!(
                        "created {} (tries: {}, time: {:?})",
                        record.token(),
                        attempts,
                        stats.elapsed
                    );
                    return Ok((record, stats));
                }
            }

            if length >= self.inner.max_length {
                tracing::warn!(
                    "token space exhausted at length {} after {} attempts",
                    length,
                    attempts
                );
                return Err(StoreError::GenerationExhausted { length, attempts });
            }

            length += 1;
            self.inner.length.fetch_max(length, Ordering::Relaxed);
            tracing::warn!(
                "{} collisions in a row, forcing token length up to {}",
                attempts,
                length
            );
        }
    }

    /// Looks up the record stored under `token`
    ///
    /// This does not check expiry. A record past its deadline is still
    /// returned until the next purge removes it; that window is accepted
    /// behaviour of the lazy sweep, not a bug.
    pub fn find(&self, token: &str) -> Result<Record<P>, StoreError> {
        self.inner
            .data
            .get(token)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(token.to_string()))
    }

    /// Removes every record that expired before `now` and returns what was removed
    ///
    /// `DashMap::retain` write-locks each shard while scanning it, so a
    /// record inserted mid-pass is either already behind the scan or is
    /// evaluated against `now` like any other record. Nothing is judged from
    /// a stale snapshot.
    pub fn drain_expired(&self, now: Instant) -> (PurgeStats, Vec<Record<P>>) {
        let start = Instant::now();
        let mut scanned = 0usize;
        let mut removed = Vec::new();

        self.inner.data.retain(|_, record| {
            scanned += 1;
            if record.is_expired_at(now) {
                removed.push(record.clone());
                false
            } else {
                true
            }
        });

        let stats = PurgeStats {
            scanned,
            deleted: removed.len(),
            delete_failures: 0,
            elapsed: start.elapsed(),
        };
        (stats, removed)
    }

    /// Removes every record that expired before `now`
    pub fn purge_at(&self, now: Instant) -> PurgeStats {
        self.drain_expired(now).0
    }

    /// Removes every record that has expired by now
    pub fn purge(&self) -> PurgeStats {
        self.purge_at(Instant::now())
    }

    /// Recomputes the generation length from the current table size
    ///
    /// The result replaces any length forced up by collisions, so the length
    /// can shrink again once purges empty the table.
    pub fn recalculate_length(&self) -> usize {
        let length = token::length_for(self.len(), self.inner.min_length);
        self.inner.length.store(length, Ordering::Relaxed);
        length
    }

    /// Length the next generated token will have
    pub fn current_length(&self) -> usize {
        self.inner.length.load(Ordering::Relaxed)
    }

    /// Returns `true` if `token` is held by a record, expired or not
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.inner.data.contains_key(token)
    }

    /// Returns the number of records in the table (including expired ones)
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.data.is_empty()
    }
}
