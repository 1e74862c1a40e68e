use crate::models::VisitEvent;
use crate::storage::{decode_log, encode_log, LogStore, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl LogStore for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS visit_logs (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<VisitEvent>> {
        let payload = sqlx::query_scalar::<_, String>(
            r#"
            SELECT payload FROM visit_logs
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        match payload {
            Some(payload) => decode_log(key, &payload),
            None => Ok(Vec::new()),
        }
    }

    async fn write(&self, key: &str, events: &[VisitEvent]) -> StorageResult<()> {
        let payload = encode_log(events)?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO visit_logs (key, payload, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(payload)
        .bind(now)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(())
    }

    async fn clear(&self, key: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM visit_logs WHERE key = ?")
            .bind(key)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| StorageError::Other(e.into()))?;

        Ok(result.rows_affected() > 0)
    }
}
