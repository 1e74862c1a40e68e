//! Visit log aggregation
//!
//! Events are folded into per-dimension tallies in a single pass, then each
//! tally is drained into a ranked table. Ranking uses a stable sort, so labels
//! with equal counts keep the order in which they were first seen.

use std::collections::HashMap;

use crate::analytics::classify::{detect_device, extract_domain};
use crate::analytics::models::{RankedCounts, StatsSummary};
use crate::models::VisitEvent;

/// Insertion-ordered label counter
#[derive(Debug, Default)]
struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl Tally {
    fn increment(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push((label.to_string(), 1));
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Most frequent first
    fn rank_by_count(self) -> RankedCounts {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        RankedCounts::from(entries)
    }

    /// Greatest label first
    fn rank_by_label_desc(self) -> RankedCounts {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        RankedCounts::from(entries)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct RunningMean {
    sum: u64,
    count: u64,
}

impl RunningMean {
    fn add(&mut self, value: u64) {
        self.sum = self.sum.saturating_add(value);
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64
    }
}

/// Accumulates visit events into a [`StatsSummary`]
#[derive(Debug, Default)]
pub struct StatsAggregator {
    total_visits: u64,
    by_date: Tally,
    referrers: Tally,
    pages: Tally,
    devices: Tally,
    time_on_page: RunningMean,
    load_time: RunningMean,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into every dimension
    pub fn record(&mut self, event: &VisitEvent) {
        self.total_visits += 1;

        self.by_date.increment(&event.date);
        self.referrers.increment(&extract_domain(&event.referrer));
        self.pages.increment(&event.path);
        self.devices.increment(detect_device(&event.user_agent).as_str());

        // Zero means "not reported" for both timings
        if let Some(seconds) = event.time_on_page.filter(|&s| s > 0) {
            self.time_on_page.add(seconds);
        }
        if event.load_time > 0 {
            self.load_time.add(event.load_time);
        }
    }

    /// Number of events recorded so far
    pub fn len(&self) -> u64 {
        self.total_visits
    }

    pub fn is_empty(&self) -> bool {
        self.total_visits == 0
    }

    /// Rank every dimension and compute the averages
    pub fn finish(self) -> StatsSummary {
        let distinct_dates = self.by_date.len();
        let average_daily_visits = if distinct_dates > 0 {
            self.total_visits as f64 / distinct_dates as f64
        } else {
            self.total_visits as f64
        };

        StatsSummary {
            total_visits: self.total_visits,
            visits_by_date: self.by_date.rank_by_label_desc(),
            referrers: self.referrers.rank_by_count(),
            pages: self.pages.rank_by_count(),
            devices: self.devices.rank_by_count(),
            average_time_on_page: self.time_on_page.mean(),
            average_load_time: self.load_time.mean(),
            average_daily_visits,
        }
    }
}

/// Aggregate a visit log into summary statistics
pub fn aggregate(events: &[VisitEvent]) -> StatsSummary {
    let mut aggregator = StatsAggregator::new();
    for event in events {
        aggregator.record(event);
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(date: &str, path: &str, referrer: &str, user_agent: &str) -> VisitEvent {
        VisitEvent {
            date: date.to_string(),
            path: path.to_string(),
            referrer: referrer.to_string(),
            user_agent: user_agent.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_aggregate_empty_log() {
        let stats = aggregate(&[]);

        assert_eq!(stats, StatsSummary::default());
        assert_eq!(stats.total_visits, 0);
        assert!(stats.visits_by_date.is_empty());
        assert_eq!(stats.average_daily_visits, 0.0);
    }

    #[test]
    fn test_aggregate_two_visits_same_day() {
        let events = vec![
            VisitEvent {
                load_time: 100,
                time_on_page: Some(30),
                ..visit(
                    "2025-01-02",
                    "/a",
                    "direct",
                    "Mozilla/5.0 (iPhone; CPU iPhone OS)",
                )
            },
            VisitEvent {
                load_time: 200,
                time_on_page: Some(10),
                ..visit(
                    "2025-01-02",
                    "/a",
                    "https://google.com",
                    "Mozilla/5.0 (Windows NT 10.0)",
                )
            },
        ];

        let stats = aggregate(&events);

        assert_eq!(stats.total_visits, 2);
        assert_eq!(stats.visits_by_date.entries(), &[("2025-01-02".to_string(), 2)]);
        assert_eq!(stats.pages.entries(), &[("/a".to_string(), 2)]);
        assert_eq!(
            stats.devices.entries(),
            &[("Mobile".to_string(), 1), ("Desktop".to_string(), 1)]
        );
        assert_eq!(
            stats.referrers.entries(),
            &[("direct".to_string(), 1), ("google.com".to_string(), 1)]
        );
        assert_eq!(stats.average_time_on_page, 20.0);
        assert_eq!(stats.average_load_time, 150.0);
        assert_eq!(stats.average_daily_visits, 2.0);
    }

    #[test]
    fn test_dates_sorted_newest_first() {
        let events = vec![
            visit("2025-01-02", "/", "direct", ""),
            visit("2025-01-10", "/", "direct", ""),
            visit("2024-12-31", "/", "direct", ""),
            visit("2025-01-10", "/", "direct", ""),
        ];

        let stats = aggregate(&events);
        let dates: Vec<&str> = stats.visits_by_date.iter().map(|(d, _)| d).collect();

        assert_eq!(dates, vec!["2025-01-10", "2025-01-02", "2024-12-31"]);
        assert_eq!(stats.average_daily_visits, 4.0 / 3.0);
    }

    #[test]
    fn test_counts_ranked_descending_with_stable_ties() {
        let events = vec![
            visit("2025-01-01", "/b", "direct", ""),
            visit("2025-01-01", "/c", "direct", ""),
            visit("2025-01-01", "/a", "direct", ""),
            visit("2025-01-01", "/a", "direct", ""),
            visit("2025-01-01", "/d", "direct", ""),
        ];

        let stats = aggregate(&events);
        let pages: Vec<&str> = stats.pages.iter().map(|(p, _)| p).collect();

        assert_eq!(pages, vec!["/a", "/b", "/c", "/d"]);
    }

    #[test]
    fn test_zero_load_time_is_treated_as_unmeasured() {
        let events = vec![
            VisitEvent {
                load_time: 0,
                ..visit("2025-01-01", "/", "direct", "")
            },
            VisitEvent {
                load_time: 300,
                ..visit("2025-01-01", "/", "direct", "")
            },
        ];

        let stats = aggregate(&events);
        assert_eq!(stats.average_load_time, 300.0);
        // No event reported time on page
        assert_eq!(stats.average_time_on_page, 0.0);
    }

    #[test]
    fn test_zero_time_on_page_is_excluded_from_average() {
        let events = vec![
            VisitEvent {
                time_on_page: Some(0),
                ..visit("2025-01-01", "/", "direct", "")
            },
            VisitEvent {
                time_on_page: Some(12),
                ..visit("2025-01-01", "/", "direct", "")
            },
        ];

        assert_eq!(aggregate(&events).average_time_on_page, 12.0);
    }

    #[test]
    fn test_every_dimension_sums_to_total() {
        let agents = ["iPhone", "iPad", "Windows NT", "Android", "X11; Linux"];
        let referrers = ["direct", "", "https://bing.com/x", "garbage", "https://t.co/abc"];
        let events: Vec<VisitEvent> = (0..25)
            .map(|i| {
                visit(
                    &format!("2025-01-{:02}", i % 7 + 1),
                    &format!("/page/{}", i % 4),
                    referrers[i % referrers.len()],
                    agents[(i * 3) % agents.len()],
                )
            })
            .collect();

        let stats = aggregate(&events);

        assert_eq!(stats.total_visits, 25);
        assert_eq!(stats.visits_by_date.total(), 25);
        assert_eq!(stats.referrers.total(), 25);
        assert_eq!(stats.pages.total(), 25);
        assert_eq!(stats.devices.total(), 25);
        // "" and "direct" collapse into one bucket
        assert_eq!(stats.referrers.get("direct"), Some(10));
    }

    #[test]
    fn test_duplicate_saves_are_counted_twice() {
        let first = VisitEvent {
            load_time: 80,
            ..visit("2025-01-01", "/", "direct", "")
        };
        let second = VisitEvent {
            time_on_page: Some(40),
            ..first.clone()
        };

        let stats = aggregate(&[first, second]);
        assert_eq!(stats.total_visits, 2);
        assert_eq!(stats.average_load_time, 80.0);
        assert_eq!(stats.average_time_on_page, 40.0);
    }

    #[test]
    fn test_incremental_recording_matches_batch() {
        let events = vec![
            visit("2025-01-01", "/x", "https://www.google.com/", "iPhone"),
            visit("2025-01-02", "/y", "direct", "Windows"),
        ];

        let mut aggregator = StatsAggregator::new();
        assert!(aggregator.is_empty());
        for event in &events {
            aggregator.record(event);
        }
        assert_eq!(aggregator.len(), 2);

        assert_eq!(aggregator.finish(), aggregate(&events));
    }
}
