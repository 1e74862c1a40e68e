use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::analytics::ClockZone;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Postgres,
    Memory,
}

/// Settings shared by the recorder and the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Key the visit log is stored under
    pub storage_key: String,

    /// Shared secret the report viewer must present.
    /// Reports are refused while this is unset.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Days of history kept when the log is saved
    pub days_to_keep: u32,

    /// Zone used to step back calendar days for the retention cutoff
    pub clock_zone: ClockZone,
}

impl SiteConfig {
    pub const DEFAULT_STORAGE_KEY: &'static str = "site_traffic_data";
    pub const DEFAULT_DAYS_TO_KEEP: u32 = 30;
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            storage_key: Self::DEFAULT_STORAGE_KEY.to_string(),
            password: None,
            days_to_keep: Self::DEFAULT_DAYS_TO_KEEP,
            clock_zone: ClockZone::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "sqlite".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            "sqlite" => StorageBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown STORAGE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres, memory"
                );
                StorageBackend::Sqlite
            }
        };

        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./visitlog.db?mode=rwc".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let storage_key = std::env::var("VISITLOG_STORAGE_KEY")
            .unwrap_or_else(|_| SiteConfig::DEFAULT_STORAGE_KEY.to_string());

        let password = std::env::var("VISITLOG_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());

        let days_to_keep = match std::env::var("VISITLOG_DAYS_TO_KEEP") {
            Ok(v) => v
                .parse::<u32>()
                .context("VISITLOG_DAYS_TO_KEEP must be a non-negative integer")?,
            Err(_) => SiteConfig::DEFAULT_DAYS_TO_KEEP,
        };

        let clock_zone = match std::env::var("VISITLOG_CLOCK_ZONE")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "utc" => ClockZone::Utc,
            "local" => ClockZone::Local,
            other => {
                tracing::warn!(
                    "Unknown VISITLOG_CLOCK_ZONE '{other}', falling back to 'local'. Supported values: utc, local"
                );
                ClockZone::Local
            }
        };

        Ok(Config {
            storage: StorageConfig {
                backend,
                url,
                max_connections,
            },
            site: SiteConfig {
                storage_key,
                password,
                days_to_keep,
                clock_zone,
            },
        })
    }
}
