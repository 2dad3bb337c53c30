//! Uniform result shape for every store outcome.
//!
//! Everything here is a pure mapping: no I/O, no side effects. The request
//! layer serialises [`StandardResult`] as-is.

use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::StoreError;
use crate::record::{FileRecord, LinkRecord};

/// Machine-stable reason attached to every result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Success,
    /// The token was never issued or has been purged
    NotFound,
    /// The token is known but its file bytes are gone
    DanglingReference,
    /// No token could be generated; safe to retry
    GenerationExhausted,
    /// The request layer rejected the input before reaching a store
    InvalidRequest,
}

/// Fields of the record a successful result carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecordFields {
    Link {
        token: String,
        target_url: String,
        created_at_ms: u64,
        ttl_ms: u64,
    },
    File {
        token: String,
        storage_key: String,
        original_name: String,
        mime_type: String,
        created_at_ms: u64,
        ttl_ms: u64,
    },
}

/// Output of the codec: `{ ok, reason_code, reason_text?, record?, share_address? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardResult {
    pub ok: bool,
    pub reason_code: ReasonCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_address: Option<String>,
}

/// Builds the public retrieval address for a token
#[derive(Debug, Clone)]
pub struct ShareAddresses {
    base_url: String,
}

impl ShareAddresses {
    /// `base_url` is the public origin, e.g. `https://sho.rt`; a trailing slash is ignored
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn link(&self, token: &str) -> String {
        format!("{}/{}", self.base_url, token)
    }

    pub fn file(&self, token: &str) -> String {
        format!("{}/api/hash/file/{}?dl=0", self.base_url, token)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map(millis).unwrap_or(0)
}

impl RecordFields {
    pub fn from_link(record: &LinkRecord) -> Self {
        RecordFields::Link {
            token: record.token().to_string(),
            target_url: record.payload().target_url.clone(),
            created_at_ms: epoch_millis(record.created_at()),
            ttl_ms: millis(record.ttl()),
        }
    }

    pub fn from_file(record: &FileRecord) -> Self {
        let file = record.payload();
        RecordFields::File {
            token: record.token().to_string(),
            storage_key: file.storage_key.clone(),
            original_name: file.original_name.clone(),
            mime_type: file.mime_type.clone(),
            created_at_ms: epoch_millis(record.created_at()),
            ttl_ms: millis(record.ttl()),
        }
    }
}

impl StandardResult {
    fn success(record: RecordFields, share_address: String) -> Self {
        Self {
            ok: true,
            reason_code: ReasonCode::Success,
            reason_text: None,
            record: Some(record),
            share_address: Some(share_address),
        }
    }

    fn failure(reason_code: ReasonCode, reason_text: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason_code,
            reason_text: Some(reason_text.into()),
            record: None,
            share_address: None,
        }
    }

    /// Maps the outcome of a link operation
    pub fn from_link(outcome: &Result<LinkRecord, StoreError>, addresses: &ShareAddresses) -> Self {
        match outcome {
            Ok(record) => Self::success(RecordFields::from_link(record), addresses.link(record.token())),
            Err(err) => Self::from_error(err),
        }
    }

    /// Maps the outcome of a file operation
    pub fn from_file(outcome: &Result<FileRecord, StoreError>, addresses: &ShareAddresses) -> Self {
        match outcome {
            Ok(record) => Self::success(RecordFields::from_file(record), addresses.file(record.token())),
            Err(err) => Self::from_error(err),
        }
    }

    pub fn from_error(err: &StoreError) -> Self {
        let (code, text) = match err {
            StoreError::NotFound(_) => (ReasonCode::NotFound, "Nothing associated with that token."),
            StoreError::DanglingReference { .. } => (
                ReasonCode::DanglingReference,
                "The file could not be found on the storage medium, but there is a reference to it.",
            ),
            StoreError::GenerationExhausted { .. } => (
                ReasonCode::GenerationExhausted,
                "No free token could be generated right now. Try again later.",
            ),
        };
        Self::failure(code, text)
    }

    /// Result for input rejected before any store was consulted
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::failure(ReasonCode::InvalidRequest, reason)
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FileMetadata, LinkTarget, Record};
    use serde_json::json;

    fn link_record() -> LinkRecord {
        Record::new(
            "k3x".to_string(),
            Duration::from_millis(1000),
            LinkTarget {
                target_url: "https://example.com".to_string(),
            },
        )
    }

    #[test]
    fn test_share_addresses_strip_trailing_slash() {
        let addresses = ShareAddresses::new("https://sho.rt//");
        assert_eq!(addresses.base_url(), "https://sho.rt");
        assert_eq!(addresses.link("abc"), "https://sho.rt/abc");
        assert_eq!(addresses.file("abc"), "https://sho.rt/api/hash/file/abc?dl=0");
    }

    #[test]
    fn test_link_success_shape() {
        let addresses = ShareAddresses::new("https://sho.rt");
        let result = StandardResult::from_link(&Ok(link_record()), &addresses);

        assert!(result.is_ok());
        assert_eq!(result.reason_code, ReasonCode::Success);
        assert_eq!(result.share_address.as_deref(), Some("https://sho.rt/k3x"));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["ok"], json!(true));
        assert_eq!(value["reason_code"], json!("success"));
        assert_eq!(value["record"]["token"], json!("k3x"));
        assert_eq!(value["record"]["target_url"], json!("https://example.com"));
        assert_eq!(value["record"]["ttl_ms"], json!(1000));
        assert!(value.get("reason_text").is_none());
    }

    #[test]
    fn test_file_success_carries_metadata() {
        let record: FileRecord = Record::new(
            "f00".to_string(),
            Duration::from_secs(60),
            FileMetadata {
                storage_key: "9d1c".to_string(),
                original_name: "cat.png".to_string(),
                mime_type: "image/png".to_string(),
            },
        );
        let result = StandardResult::from_file(&Ok(record), &ShareAddresses::new("http://h"));

        match result.record {
            Some(RecordFields::File { storage_key, original_name, mime_type, .. }) => {
                assert_eq!(storage_key, "9d1c");
                assert_eq!(original_name, "cat.png");
                assert_eq!(mime_type, "image/png");
            }
            other => panic!("unexpected record: {other:?}"),
        }
        assert_eq!(result.share_address.as_deref(), Some("http://h/api/hash/file/f00?dl=0"));
    }

    #[test]
    fn test_errors_map_to_distinct_codes() {
        let addresses = ShareAddresses::new("http://h");
        let not_found = StandardResult::from_file(&Err(StoreError::NotFound("a".into())), &addresses);
        let dangling = StandardResult::from_file(
            &Err(StoreError::DanglingReference {
                token: "a".into(),
                storage_key: "k".into(),
            }),
            &addresses,
        );
        let exhausted = StandardResult::from_link(
            &Err(StoreError::GenerationExhausted { length: 3, attempts: 9 }),
            &addresses,
        );

        assert_eq!(not_found.reason_code, ReasonCode::NotFound);
        assert_eq!(dangling.reason_code, ReasonCode::DanglingReference);
        assert_eq!(exhausted.reason_code, ReasonCode::GenerationExhausted);
        for result in [&not_found, &dangling, &exhausted] {
            assert!(!result.ok);
            assert!(result.record.is_none());
            assert!(result.share_address.is_none());
            assert!(result.reason_text.is_some());
        }
    }

    #[test]
    fn test_error_serialises_without_record() {
        let result = StandardResult::invalid_request("No link present in query.");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "ok": false,
                "reason_code": "invalid_request",
                "reason_text": "No link present in query."
            })
        );
    }
}
