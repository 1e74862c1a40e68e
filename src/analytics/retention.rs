//! Retention window for the stored visit log
//!
//! The cutoff is computed by stepping the calendar date back in a clock zone
//! while keeping the wall-clock time, not by subtracting a fixed number of
//! 24 hour periods. Across a daylight-saving change the two differ by the
//! size of the shift.

use chrono::{
    DateTime, Days, Local, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

use crate::models::VisitEvent;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Clock zone used for calendar arithmetic on timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockZone {
    Utc,
    /// The host's local time zone
    #[default]
    Local,
}

impl ClockZone {
    /// Earliest timestamp still inside a window of `days_to_keep` days ending at `now_ms`
    pub fn cutoff(self, now_ms: i64, days_to_keep: u32) -> i64 {
        match self {
            ClockZone::Utc => calendar_cutoff(&Utc, now_ms, days_to_keep),
            ClockZone::Local => calendar_cutoff(&Local, now_ms, days_to_keep),
        }
    }
}

fn calendar_cutoff<Tz: TimeZone>(tz: &Tz, now_ms: i64, days_to_keep: u32) -> i64 {
    let fallback = now_ms.saturating_sub(i64::from(days_to_keep) * MILLIS_PER_DAY);

    let LocalResult::Single(now) = tz.timestamp_millis_opt(now_ms) else {
        return fallback;
    };

    now.naive_local()
        .checked_sub_days(Days::new(u64::from(days_to_keep)))
        .and_then(|wall| resolve_wall_clock(tz, wall))
        .map(|cutoff| cutoff.timestamp_millis())
        .unwrap_or(fallback)
}

/// Map a wall-clock time to an instant the way platform date APIs do:
/// a repeated hour resolves to its first occurrence, and a skipped hour is read
/// with the offset in force before the transition (landing after the gap).
fn resolve_wall_clock<Tz: TimeZone>(tz: &Tz, wall: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&wall) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            let day_before = wall.checked_sub_signed(TimeDelta::days(1))?;
            let offset = tz.from_local_datetime(&day_before).earliest()?.offset().fix();
            let utc = wall.checked_sub_signed(TimeDelta::seconds(i64::from(
                offset.local_minus_utc(),
            )))?;
            Some(tz.from_utc_datetime(&utc))
        }
    }
}

/// Retention settings applied every time the log is saved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub days_to_keep: u32,
    pub zone: ClockZone,
}

impl RetentionPolicy {
    pub fn new(days_to_keep: u32, zone: ClockZone) -> Self {
        Self { days_to_keep, zone }
    }

    pub fn cutoff(&self, now_ms: i64) -> i64 {
        self.zone.cutoff(now_ms, self.days_to_keep)
    }

    /// Drop expired events in place, returning how many were removed
    pub fn retain(&self, events: &mut Vec<VisitEvent>, now_ms: i64) -> usize {
        let cutoff = self.cutoff(now_ms);
        let before = events.len();
        events.retain(|event| event.timestamp >= cutoff);
        before - events.len()
    }
}

/// Events recorded within `days_to_keep` days of `now_ms`, in their original order
pub fn filter(
    events: &[VisitEvent],
    now_ms: i64,
    days_to_keep: u32,
    zone: ClockZone,
) -> Vec<VisitEvent> {
    let cutoff = zone.cutoff(now_ms, days_to_keep);
    events
        .iter()
        .filter(|event| event.timestamp >= cutoff)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use chrono_tz::America::New_York;

    // 2025-03-15T12:00:00Z
    const NOW: i64 = 1_742_040_000_000;

    fn event_at(timestamp: i64) -> VisitEvent {
        VisitEvent::new(timestamp, "/")
    }

    #[test]
    fn test_filter_empty_log() {
        assert!(filter(&[], NOW, 30, ClockZone::Utc).is_empty());
    }

    #[test]
    fn test_filter_zero_days_keeps_same_instant_only() {
        let events = vec![event_at(NOW - 1), event_at(NOW), event_at(NOW + 5)];
        let kept = filter(&events, NOW, 0, ClockZone::Utc);

        assert_eq!(kept, vec![event_at(NOW), event_at(NOW + 5)]);
    }

    #[test]
    fn test_filter_keeps_boundary_and_order() {
        let cutoff = NOW - 30 * MILLIS_PER_DAY;
        let events = vec![
            event_at(NOW - 2),
            event_at(cutoff - 1),
            event_at(cutoff),
            event_at(NOW - 40 * MILLIS_PER_DAY),
            event_at(NOW - 10),
        ];

        let kept = filter(&events, NOW, 30, ClockZone::Utc);
        let stamps: Vec<i64> = kept.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![NOW - 2, cutoff, NOW - 10]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let events: Vec<VisitEvent> = (0..60)
            .map(|day| event_at(NOW - day * MILLIS_PER_DAY / 2))
            .collect();

        let once = filter(&events, NOW, 7, ClockZone::Utc);
        let twice = filter(&once, NOW, 7, ClockZone::Utc);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_cutoff_in_fixed_offset_zone_keeps_wall_clock() {
        let tz = FixedOffset::east_opt(-3 * 3600).unwrap();
        assert_eq!(calendar_cutoff(&tz, NOW, 2), NOW - 2 * MILLIS_PER_DAY);
    }

    #[test]
    fn test_resolve_wall_clock_unambiguous() {
        let wall = NaiveDateTime::parse_from_str("2025-03-13 12:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let resolved = resolve_wall_clock(&Utc, wall).unwrap();
        assert_eq!(resolved.timestamp_millis(), NOW - 2 * MILLIS_PER_DAY);
    }

    fn utc_ms(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn test_cutoff_into_spring_forward_gap_lands_after_it() {
        // 02:30 on 2025-03-09 does not exist in New York; read with the EST offset
        let now = utc_ms(2025, 3, 10, 6, 30);
        assert_eq!(calendar_cutoff(&New_York, now, 1), utc_ms(2025, 3, 9, 7, 30));
    }

    #[test]
    fn test_cutoff_into_fall_back_overlap_takes_earlier_instant() {
        // 01:30 on 2025-11-02 happens twice in New York (05:30Z and 06:30Z)
        let now = utc_ms(2025, 11, 3, 6, 30);
        assert_eq!(calendar_cutoff(&New_York, now, 1), utc_ms(2025, 11, 2, 5, 30));
    }

    #[test]
    fn test_window_across_dst_change_keeps_wall_clock() {
        // Noon EDT on 2025-03-20, thirty calendar days back is noon EST
        let now = utc_ms(2025, 3, 20, 16, 0);
        let cutoff = calendar_cutoff(&New_York, now, 30);

        assert_eq!(cutoff, utc_ms(2025, 2, 18, 17, 0));
        assert_eq!(cutoff - (now - 30 * MILLIS_PER_DAY), 3_600_000);
    }

    #[test]
    fn test_resolve_wall_clock_branches_in_dst_zone() {
        let gap = NaiveDateTime::parse_from_str("2025-03-09 02:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let overlap = NaiveDateTime::parse_from_str("2025-11-02 01:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();

        assert!(matches!(New_York.from_local_datetime(&gap), LocalResult::None));
        assert!(matches!(
            New_York.from_local_datetime(&overlap),
            LocalResult::Ambiguous(_, _)
        ));

        let after_gap = resolve_wall_clock(&New_York, gap).unwrap();
        assert_eq!(after_gap.timestamp_millis(), utc_ms(2025, 3, 9, 7, 30));
        assert_eq!(after_gap.naive_local().to_string(), "2025-03-09 03:30:00");

        let first_pass = resolve_wall_clock(&New_York, overlap).unwrap();
        assert_eq!(first_pass.timestamp_millis(), utc_ms(2025, 11, 2, 5, 30));
    }

    #[test]
    fn test_retention_policy_reports_removed_count() {
        let policy = RetentionPolicy::new(1, ClockZone::Utc);
        let mut events = vec![
            event_at(NOW - 3 * MILLIS_PER_DAY),
            event_at(NOW),
            event_at(NOW - 2 * MILLIS_PER_DAY),
        ];

        assert_eq!(policy.retain(&mut events, NOW), 2);
        assert_eq!(events, vec![event_at(NOW)]);
    }
}
