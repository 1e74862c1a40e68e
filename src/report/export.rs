//! CSV export of the raw visit log
//!
//! The header is the field list of the first record. Each row lists the
//! values of its own record, so a record carrying a field the first one lacks
//! produces a longer row. Strings containing a comma are wrapped in double
//! quotes; embedded quotes are left as they are.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::VisitEvent;

fn fields(event: &VisitEvent) -> serde_json::Result<Map<String, Value>> {
    match serde_json::to_value(event)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains(',') => format!("\"{s}\""),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Render the log as CSV, or `None` when there is nothing to export
pub fn export_csv(events: &[VisitEvent]) -> serde_json::Result<Option<String>> {
    let Some(first) = events.first() else {
        return Ok(None);
    };

    let header = fields(first)?
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = Vec::with_capacity(events.len() + 1);
    lines.push(header);
    for event in events {
        let row = fields(event)?
            .values()
            .map(cell)
            .collect::<Vec<_>>()
            .join(",");
        lines.push(row);
    }

    Ok(Some(lines.join("\n")))
}

/// Download name for an export made at `now_ms`
pub fn export_filename(now_ms: i64) -> String {
    let date = DateTime::<Utc>::from_timestamp_millis(now_ms)
        .unwrap_or_default()
        .format("%Y-%m-%d");
    format!("traffic_data_{date}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_empty_log() {
        assert_eq!(export_csv(&[]).unwrap(), None);
    }

    #[test]
    fn test_export_quotes_values_with_commas() {
        let event = VisitEvent {
            user_agent: "Mozilla/5.0 (KHTML, like Gecko)".to_string(),
            screen_size: "1920x1080".to_string(),
            language: "en-US".to_string(),
            load_time: 120,
            ..VisitEvent::new(1_735_776_000_000, "/a")
        };

        let csv = export_csv(&[event]).unwrap().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "timestamp,date,referrer,userAgent,screenSize,language,path,queryParams,loadTime"
        );
        assert_eq!(
            lines[1],
            "1735776000000,2025-01-02,direct,\"Mozilla/5.0 (KHTML, like Gecko)\",1920x1080,en-US,/a,,120"
        );
    }

    #[test]
    fn test_embedded_quotes_are_not_escaped() {
        let event = VisitEvent {
            path: "/say \"hi\", then leave".to_string(),
            ..VisitEvent::new(0, "/")
        };

        let csv = export_csv(&[event]).unwrap().unwrap();
        assert!(csv.contains("\"/say \"hi\", then leave\""));
    }

    #[test]
    fn test_rows_follow_their_own_fields() {
        let first = VisitEvent::new(1, "/a");
        let second = VisitEvent {
            time_on_page: Some(9),
            ..VisitEvent::new(2, "/b")
        };

        let csv = export_csv(&[first, second]).unwrap().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(!lines[0].contains("timeOnPage"));
        assert_eq!(lines[1].split(',').count(), 9);
        assert_eq!(lines[2].split(',').count(), 10);
        assert!(lines[2].ends_with(",0,9"));
    }

    #[test]
    fn test_export_filename_uses_utc_date() {
        assert_eq!(export_filename(1_735_862_399_999), "traffic_data_2025-01-02.csv");
    }
}
