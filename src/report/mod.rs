//! Statistics reports over the stored visit log
//!
//! Every entry point checks the viewer's secret before the log is read or
//! aggregated.

pub mod export;
pub mod gate;
pub mod html;

pub use export::{export_csv, export_filename};
pub use gate::AccessGate;
pub use html::{render_empty, render_report};

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::analytics::{aggregate, StatsSummary};
use crate::config::SiteConfig;
use crate::storage::{LogStore, StorageError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("incorrect password")]
    AccessDenied,
    #[error("no report password is configured")]
    MissingSecret,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

pub struct ReportService {
    store: Arc<dyn LogStore>,
    gate: AccessGate,
    storage_key: String,
    days_to_keep: u32,
}

impl ReportService {
    pub fn new(store: Arc<dyn LogStore>, site: &SiteConfig) -> ReportResult<Self> {
        let secret = site.password.as_deref().ok_or(ReportError::MissingSecret)?;

        Ok(Self {
            store,
            gate: AccessGate::new(secret),
            storage_key: site.storage_key.clone(),
            days_to_keep: site.days_to_keep,
        })
    }

    fn authorize(&self, supplied: &str) -> ReportResult<()> {
        if self.gate.check(supplied) {
            Ok(())
        } else {
            warn!("Rejected report access with an incorrect password");
            Err(ReportError::AccessDenied)
        }
    }

    /// Summary of the stored log, or `None` when nothing has been recorded
    pub async fn summary(&self, supplied: &str) -> ReportResult<Option<StatsSummary>> {
        self.authorize(supplied)?;

        let log = self.store.read_or_empty(&self.storage_key).await;
        if log.is_empty() {
            return Ok(None);
        }

        Ok(Some(aggregate(&log)))
    }

    /// HTML statistics page, or the "no data yet" page for an empty log
    pub async fn html(&self, supplied: &str) -> ReportResult<String> {
        Ok(match self.summary(supplied).await? {
            Some(stats) => render_report(&stats, self.days_to_keep),
            None => render_empty(),
        })
    }

    /// Summary as pretty-printed JSON; `null` for an empty log
    pub async fn json(&self, supplied: &str) -> ReportResult<String> {
        let summary = self.summary(supplied).await?;
        Ok(serde_json::to_string_pretty(&summary)?)
    }

    /// Raw log as CSV, `None` when the log is empty
    pub async fn csv(&self, supplied: &str) -> ReportResult<Option<String>> {
        self.authorize(supplied)?;

        let log = self.store.read_or_empty(&self.storage_key).await;
        Ok(export_csv(&log)?)
    }

    /// Delete every stored event
    pub async fn clear(&self, supplied: &str) -> ReportResult<bool> {
        self.authorize(supplied)?;

        let existed = self.store.clear(&self.storage_key).await?;
        info!("Cleared visit log '{}'", self.storage_key);
        Ok(existed)
    }
}
