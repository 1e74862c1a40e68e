pub mod memory;
pub mod postgres;
pub mod sqlite;
pub mod trait_def;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;
pub use sqlite::SqliteStorage;
pub use trait_def::{decode_log, encode_log, LogStore, StorageError, StorageResult};

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};

/// Open and initialize the configured log store
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn LogStore>> {
    let storage: Arc<dyn LogStore> = match config.backend {
        StorageBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.url);
            Arc::new(SqliteStorage::new(&config.url, config.max_connections).await?)
        }
        StorageBackend::Postgres => {
            info!("Using PostgreSQL storage");
            Arc::new(PostgresStorage::new(&config.url, config.max_connections).await?)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; nothing will persist after exit");
            Arc::new(MemoryStorage::new())
        }
    };

    storage.init().await?;
    Ok(storage)
}
