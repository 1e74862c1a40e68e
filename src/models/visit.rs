use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded page view.
///
/// Field names serialize in camelCase so the stored blob keeps the layout the
/// collector has always written. Field order is significant: CSV export uses it
/// for the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitEvent {
    /// Milliseconds since the Unix epoch. Never changes after creation.
    pub timestamp: i64,

    /// Calendar date (`YYYY-MM-DD`) of `timestamp`, in UTC
    pub date: String,

    /// Absolute referrer URL, or `"direct"`
    #[serde(default)]
    pub referrer: String,

    #[serde(default)]
    pub user_agent: String,

    /// Viewport size as `WIDTHxHEIGHT`
    #[serde(default)]
    pub screen_size: String,

    #[serde(default)]
    pub language: String,

    pub path: String,

    /// Raw query string including the leading `?`, empty when there is none
    #[serde(default)]
    pub query_params: String,

    /// Page load time in milliseconds; 0 means not measured
    #[serde(default)]
    pub load_time: u64,

    /// Seconds spent on the page, known only once the visit ended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_on_page: Option<u64>,
}

impl VisitEvent {
    /// Create an event for `path` at `timestamp`, deriving `date` from it.
    pub fn new(timestamp: i64, path: impl Into<String>) -> Self {
        Self {
            timestamp,
            date: utc_date(timestamp),
            referrer: "direct".to_string(),
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Format the UTC calendar date of a millisecond timestamp as `YYYY-MM-DD`.
///
/// Timestamps outside chrono's representable range yield an empty string.
pub fn utc_date(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
