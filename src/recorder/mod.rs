//! Visit capture and persistence
//!
//! Every save is a read-modify-write of the entire stored log: read the
//! snapshot, append the event, prune it to the retention window, write the
//! snapshot back. Concurrent writers are not coordinated.

pub mod environment;
pub mod session;

pub use environment::{Environment, PageContext, PageEnvironment};
pub use session::VisitSession;

use std::sync::Arc;
use tracing::{debug, info};

use crate::analytics::RetentionPolicy;
use crate::config::SiteConfig;
use crate::models::VisitEvent;
use crate::storage::{LogStore, StorageResult};

pub struct VisitRecorder {
    store: Arc<dyn LogStore>,
    env: Arc<dyn Environment>,
    storage_key: String,
    retention: RetentionPolicy,
}

impl VisitRecorder {
    pub fn new(store: Arc<dyn LogStore>, env: Arc<dyn Environment>, site: &SiteConfig) -> Self {
        Self {
            store,
            env,
            storage_key: site.storage_key.clone(),
            retention: RetentionPolicy::new(site.days_to_keep, site.clock_zone),
        }
    }

    /// Start tracking a page view in the recorder's environment
    pub fn begin(&self) -> VisitSession {
        VisitSession::begin(self.env.as_ref())
    }

    /// Save the session once the page has loaded
    pub async fn record_load(
        &self,
        session: &mut VisitSession,
        load_time_ms: u64,
    ) -> StorageResult<usize> {
        let event = session.loaded(load_time_ms);
        self.save(event).await
    }

    /// Save the session again when the viewer leaves
    pub async fn record_unload(&self, session: &mut VisitSession) -> StorageResult<usize> {
        let event = session.unloaded(self.env.as_ref());
        self.save(event).await
    }

    /// Append `event` to the stored log and prune expired entries.
    ///
    /// Returns the number of events stored afterwards.
    pub async fn save(&self, event: VisitEvent) -> StorageResult<usize> {
        let mut log = self.store.read_or_empty(&self.storage_key).await;
        log.push(event);

        let removed = self.retention.retain(&mut log, self.env.now_ms());
        if removed > 0 {
            debug!("Pruned {} expired visit events", removed);
        }

        self.store.write(&self.storage_key, &log).await?;
        Ok(log.len())
    }

    /// Apply the retention window without adding anything.
    ///
    /// Returns the number of events removed.
    pub async fn prune(&self) -> StorageResult<usize> {
        let mut log = self.store.read_or_empty(&self.storage_key).await;
        let removed = self.retention.retain(&mut log, self.env.now_ms());

        if removed > 0 {
            self.store.write(&self.storage_key, &log).await?;
            info!("Pruned {} expired visit events, {} remain", removed, log.len());
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::ClockZone;
    use crate::storage::MemoryStorage;

    const DAY: i64 = 86_400_000;
    const NOW: i64 = 1_742_040_000_000;

    fn site() -> SiteConfig {
        SiteConfig {
            days_to_keep: 30,
            clock_zone: ClockZone::Utc,
            ..SiteConfig::default()
        }
    }

    #[tokio::test]
    async fn test_save_prunes_old_events() {
        let store = Arc::new(MemoryStorage::new());
        store
            .write(
                "site_traffic_data",
                &[
                    VisitEvent::new(NOW - 31 * DAY, "/old"),
                    VisitEvent::new(NOW - DAY, "/recent"),
                ],
            )
            .await
            .unwrap();

        let env = Arc::new(PageEnvironment::new(PageContext::default(), NOW));
        let recorder = VisitRecorder::new(store.clone(), env, &site());

        let stored = recorder.save(VisitEvent::new(NOW, "/new")).await.unwrap();
        assert_eq!(stored, 2);

        let paths: Vec<String> = store
            .read("site_traffic_data")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(paths, vec!["/recent", "/new"]);
    }

    #[tokio::test]
    async fn test_save_over_corrupt_log_starts_fresh() {
        let store = Arc::new(MemoryStorage::new());
        store.insert_raw("site_traffic_data", "not json");

        let env = Arc::new(PageEnvironment::new(PageContext::default(), NOW));
        let recorder = VisitRecorder::new(store.clone(), env, &site());

        assert_eq!(recorder.save(VisitEvent::new(NOW, "/")).await.unwrap(), 1);
        assert_eq!(store.read("site_traffic_data").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prune_without_expired_events_does_not_write() {
        let store = Arc::new(MemoryStorage::new());
        let env = Arc::new(PageEnvironment::new(PageContext::default(), NOW));
        let recorder = VisitRecorder::new(store.clone(), env, &site());

        assert_eq!(recorder.prune().await.unwrap(), 0);
        assert!(store.raw("site_traffic_data").is_none());
    }
}
