use crate::models::VisitEvent;
use crate::storage::{decode_log, encode_log, LogStore, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

/// Process-local store keeping logs in their serialized form
#[derive(Default)]
pub struct MemoryStorage {
    blobs: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw blob under `key`, bypassing serialization
    pub fn insert_raw(&self, key: &str, payload: impl Into<String>) {
        self.blobs.insert(key.to_string(), payload.into());
    }

    /// Raw blob stored under `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        self.blobs.get(key).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl LogStore for MemoryStorage {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<VisitEvent>> {
        match self.blobs.get(key) {
            Some(entry) => decode_log(key, entry.value()),
            None => Ok(Vec::new()),
        }
    }

    async fn write(&self, key: &str, events: &[VisitEvent]) -> StorageResult<()> {
        let payload = encode_log(events)?;
        self.blobs.insert(key.to_string(), payload);
        Ok(())
    }

    async fn clear(&self, key: &str) -> StorageResult<bool> {
        Ok(self.blobs.remove(key).is_some())
    }
}
