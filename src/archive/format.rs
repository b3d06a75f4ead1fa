//! Display strings for call durations and archive recency.

use chrono::{DateTime, Utc};

/// In-call clock, zero-padded: `05:07`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Archive list duration: `5:07`.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Vietnamese relative time for an archived call, falling back to a
/// `d/m/yyyy` date after a week.
pub fn format_recency(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(at);
    let mins = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if mins < 60 {
        format!("{} phút trước", mins.max(0))
    } else if hours < 24 {
        format!("{} giờ trước", hours)
    } else if days == 1 {
        "Hôm qua".to_string()
    } else if days < 7 {
        format!("{} ngày trước", days)
    } else {
        at.format("%-d/%-m/%Y").to_string()
    }
}
