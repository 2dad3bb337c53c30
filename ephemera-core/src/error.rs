//! Error types for the ephemeral store.

use thiserror::Error;

/// Errors produced by token tables and the stores built on them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The token was never issued, or its record has already been purged
    #[error("no record for token `{0}`")]
    NotFound(String),

    /// The table holds a record but the backing medium no longer has its bytes
    #[error("record `{token}` references missing object `{storage_key}`")]
    DanglingReference {
        /// Token of the record that was found
        token: String,
        /// Storage key the medium could not verify
        storage_key: String,
    },

    /// No free token could be generated, even after forced length bumps
    #[error("token space exhausted at length {length} after {attempts} attempts")]
    GenerationExhausted {
        /// Longest token length that was tried
        length: usize,
        /// Total number of generation attempts made
        attempts: u32,
    },
}

impl StoreError {
    /// Returns `true` if retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::GenerationExhausted { .. })
    }
}

/// Errors reported by a [`StorageMedium`](crate::StorageMedium).
#[derive(Error, Debug)]
pub enum MediumError {
    /// The object is absent or unreadable
    #[error("object `{0}` is missing from the medium")]
    Missing(String),

    /// The medium did not answer within the configured bound
    #[error("medium did not respond for `{0}` in time")]
    Timeout(String),

    /// Best-effort removal failed
    #[error("failed to delete `{key}`: {source}")]
    DeleteFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exhaustion_is_retryable() {
        assert!(!StoreError::NotFound("abc".into()).is_retryable());
        assert!(!StoreError::DanglingReference {
            token: "abc".into(),
            storage_key: "k".into(),
        }
        .is_retryable());
        assert!(StoreError::GenerationExhausted { length: 4, attempts: 64 }.is_retryable());
    }

    #[test]
    fn test_display_names_the_token() {
        let err = StoreError::NotFound("x1z".into());
        assert_eq!(err.to_string(), "no record for token `x1z`");
    }
}
