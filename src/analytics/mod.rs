//! Visit analytics
//!
//! Pure functions over an in-memory visit log: the retention filter that
//! prunes old events, the classifiers that bucket referrers and user agents,
//! and the aggregator that turns a log into summary statistics.

pub mod aggregator;
pub mod classify;
pub mod models;
pub mod retention;

pub use aggregator::{aggregate, StatsAggregator};
pub use classify::{detect_device, extract_domain, format_referrer};
pub use models::{DeviceClass, RankedCounts, StatsSummary};
pub use retention::{filter, ClockZone, RetentionPolicy};
