//! Data models for visit statistics

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Device class inferred from a user-agent string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "Mobile",
            DeviceClass::Tablet => "Tablet",
            DeviceClass::Desktop => "Desktop",
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label -> count table kept in a fixed rank order
///
/// Serializes as a JSON object whose keys appear in rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedCounts(Vec<(String, u64)>);

impl RankedCounts {
    pub fn entries(&self) -> &[(String, u64)] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(label, count)| (label.as_str(), *count))
    }

    /// Count recorded for `label`, if present
    pub fn get(&self, label: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, count)| *count)
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, u64)>> for RankedCounts {
    fn from(entries: Vec<(String, u64)>) -> Self {
        Self(entries)
    }
}

impl Serialize for RankedCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// Summary statistics derived from a visit log
///
/// Built fresh for every report and never persisted.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    /// Number of events aggregated
    pub total_visits: u64,

    /// Visits per calendar date, newest date first
    pub visits_by_date: RankedCounts,

    /// Visits per referrer domain, most frequent first
    pub referrers: RankedCounts,

    /// Visits per page path, most frequent first
    pub pages: RankedCounts,

    /// Visits per device class, most frequent first
    pub devices: RankedCounts,

    /// Mean seconds on page over visits that reported it
    pub average_time_on_page: f64,

    /// Mean load time in milliseconds over visits that measured it
    pub average_load_time: f64,

    pub average_daily_visits: f64,
}

impl StatsSummary {
    /// Share of all visits that `count` represents, in percent
    pub fn percentage(&self, count: u64) -> f64 {
        if self.total_visits == 0 {
            return 0.0;
        }
        count as f64 / self.total_visits as f64 * 100.0
    }
}
