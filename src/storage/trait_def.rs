use crate::models::VisitEvent;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("visit log '{key}' could not be decoded: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Key-value store holding one serialized visit log per key.
///
/// Every write replaces the whole log stored under the key. There is no
/// merging: when two writers interleave, the last write wins.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn init(&self) -> Result<()>;

    /// Read the full log stored under `key`; an absent key is an empty log
    async fn read(&self, key: &str) -> StorageResult<Vec<VisitEvent>>;

    /// Replace the log stored under `key`
    async fn write(&self, key: &str, events: &[VisitEvent]) -> StorageResult<()>;

    /// Remove the log stored under `key`, returning whether one existed
    async fn clear(&self, key: &str) -> StorageResult<bool>;

    /// Read the log, treating any storage failure as an empty log
    async fn read_or_empty(&self, key: &str) -> Vec<VisitEvent> {
        match self.read(key).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Visit log '{}' is unreadable, treating as empty: {}", key, e);
                Vec::new()
            }
        }
    }
}

/// Serialize a log into its single-line stored form
pub fn encode_log(events: &[VisitEvent]) -> StorageResult<String> {
    serde_json::to_string(events).map_err(|e| StorageError::Other(e.into()))
}

/// Decode a stored blob; a blank blob or JSON `null` is an empty log
pub fn decode_log(key: &str, payload: &str) -> StorageResult<Vec<VisitEvent>> {
    if payload.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str::<Option<Vec<VisitEvent>>>(payload)
        .map(Option::unwrap_or_default)
        .map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_blank_and_null_payloads() {
        assert!(decode_log("k", "").unwrap().is_empty());
        assert!(decode_log("k", "null").unwrap().is_empty());
        assert!(decode_log("k", "[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_corrupt_payload() {
        let err = decode_log("site", "{not json").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == "site"));
    }

    #[test]
    fn test_encoded_log_is_single_line() {
        let events = vec![VisitEvent::new(1, "/a"), VisitEvent::new(2, "/b")];
        let payload = encode_log(&events).unwrap();

        assert!(!payload.contains('\n'));
        assert_eq!(decode_log("k", &payload).unwrap(), events);
    }
}
