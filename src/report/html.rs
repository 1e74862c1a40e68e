//! HTML rendering of visit statistics

use crate::analytics::{format_referrer, RankedCounts, StatsSummary};

const PAGE_STYLE: &str =
    "max-width: 1200px; margin: 0 auto; padding: 20px; font-family: Arial, sans-serif;";
const CARD_STYLE: &str =
    "flex: 1; min-width: 200px; background: #f5f5f5; padding: 15px; border-radius: 8px;";
const VALUE_STYLE: &str = "font-size: 24px; font-weight: bold;";
const TABLE_STYLE: &str = "width: 100%; border-collapse: collapse;";
const CELL_STYLE: &str = "padding: 8px; border-bottom: 1px solid #ddd;";
const HEAD_LEFT: &str = "text-align: left; padding: 8px; border-bottom: 1px solid #ddd;";
const HEAD_RIGHT: &str = "text-align: right; padding: 8px; border-bottom: 1px solid #ddd;";
const NUMBER_CELL: &str = "text-align: right; padding: 8px; border-bottom: 1px solid #ddd;";

/// Escape text for use in element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Format with `digits` decimals, rounding exact halves up (`2.25` -> `2.3`)
pub fn to_fixed(value: f64, digits: usize) -> String {
    let scale = 10f64.powi(digits as i32);
    let rounded = (value * scale).round() / scale;
    format!("{rounded:.digits$}")
}

fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Traffic Analysis</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

/// Page shown while no visits have been recorded
pub fn render_empty() -> String {
    document("<h1>Traffic Analysis</h1>\n<p>No data collected yet.</p>")
}

fn card(out: &mut String, title: &str, value: &str) {
    out.push_str(&format!(
        "<div style=\"{CARD_STYLE}\"><h3>{title}</h3>\
         <p style=\"{VALUE_STYLE}\">{value}</p></div>\n"
    ));
}

/// Two- or three-column table; `share_of` adds a percentage column
fn table(
    out: &mut String,
    title: &str,
    label_heading: &str,
    counts: &RankedCounts,
    label: impl Fn(&str) -> String,
    share_of: Option<&StatsSummary>,
) {
    out.push_str(&format!(
        "<h2>{title}</h2>\n<table style=\"{TABLE_STYLE}\">\n\
         <tr><th style=\"{HEAD_LEFT}\">{label_heading}</th><th style=\"{HEAD_RIGHT}\">Visits</th>"
    ));
    if share_of.is_some() {
        out.push_str(&format!("<th style=\"{HEAD_RIGHT}\">%</th>"));
    }
    out.push_str("</tr>\n");

    for (key, count) in counts.iter() {
        out.push_str(&format!(
            "<tr><td style=\"{CELL_STYLE}\">{}</td><td style=\"{NUMBER_CELL}\">{count}</td>",
            escape_html(&label(key))
        ));
        if let Some(stats) = share_of {
            out.push_str(&format!(
                "<td style=\"{NUMBER_CELL}\">{}%</td>",
                to_fixed(stats.percentage(count), 1)
            ));
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</table>\n");
}

/// Full statistics page for a non-empty log
pub fn render_report(stats: &StatsSummary, days_to_keep: u32) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<div style=\"{PAGE_STYLE}\">\n\
         <h1>Traffic Analysis - {} visits in the last {} days</h1>\n",
        stats.total_visits, days_to_keep
    ));

    body.push_str(
        "<div style=\"display: flex; flex-wrap: wrap; gap: 20px; margin-bottom: 30px;\">\n",
    );
    card(
        &mut body,
        "Daily Visits (Average)",
        &to_fixed(stats.average_daily_visits, 1),
    );
    card(
        &mut body,
        "Average Time on Page",
        &format!("{} seconds", to_fixed(stats.average_time_on_page, 1)),
    );
    card(
        &mut body,
        "Load Time",
        &format!("{} ms", to_fixed(stats.average_load_time, 0)),
    );
    body.push_str("</div>\n");

    body.push_str(
        "<div style=\"display: flex; flex-wrap: wrap; gap: 20px;\">\n\
         <div style=\"flex: 1; min-width: 300px;\">\n",
    );
    table(
        &mut body,
        "Visits per Day",
        "Date",
        &stats.visits_by_date,
        str::to_string,
        None,
    );
    body.push_str("</div>\n<div style=\"flex: 1; min-width: 300px;\">\n");
    table(
        &mut body,
        "Traffic Sources",
        "Source",
        &stats.referrers,
        format_referrer,
        Some(stats),
    );
    body.push_str("</div>\n</div>\n");

    body.push_str("<div style=\"margin-top: 30px;\">\n");
    table(
        &mut body,
        "Most Visited Pages",
        "Page",
        &stats.pages,
        str::to_string,
        Some(stats),
    );
    body.push_str("</div>\n<div style=\"margin-top: 30px;\">\n");
    table(
        &mut body,
        "Devices",
        "Type",
        &stats.devices,
        str::to_string,
        Some(stats),
    );
    body.push_str("</div>\n</div>");

    document(&body)
}
