use std::time::{Duration, Instant, SystemTime};

/// A token-keyed record with its creation time and time-to-live
#[derive(Debug, Clone)]
pub struct Record<P> {
    token: String,
    created: Instant,
    created_at: SystemTime,
    ttl: Duration,
    payload: P,
}

/// Payload of a shortened link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub target_url: String,
}

/// Descriptor of an uploaded file, handed over once its bytes are on the medium
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Key the backing medium stores the bytes under
    pub storage_key: String,
    /// Filename supplied by the uploader
    pub original_name: String,
    pub mime_type: String,
}

pub type LinkRecord = Record<LinkTarget>;
pub type FileRecord = Record<FileMetadata>;

impl<P> Record<P> {
    /// Creates a record stamped with the current time
    pub(crate) fn new(token: String, ttl: Duration, payload: P) -> Self {
        Self {
            token,
            created: Instant::now(),
            created_at: SystemTime::now(),
            ttl,
            payload,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Monotonic creation instant, used for expiry
    pub fn created(&self) -> Instant {
        self.created
    }

    /// Wall-clock creation time, used for display
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Instant after which the record is eligible for purge
    ///
    /// `None` if the deadline is not representable, which only happens for
    /// TTLs far beyond the store's cap.
    pub fn expires_at(&self) -> Option<Instant> {
        self.created.checked_add(self.ttl)
    }

    /// Checks expiry against `now`: a record expires strictly after `created + ttl`
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at().is_some_and(|deadline| now > deadline)
    }
}
