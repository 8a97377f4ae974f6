//! Mapping from UTC timestamps to grid coordinates.
//!
//! Every grid lookup, lock and release goes through [`day_of`] so the day
//! label a meeting is scored under is the one it gets locked under.

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};

use crate::models::Day;

/// Start labels of the daytime menu, 9 AM to 5 PM
pub const SLOT_MENU: [&str; 9] = [
    "9:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00",
];

/// End of the scoring day
pub const DAY_END_LABEL: &str = "18:00";

pub fn day_of(ts: DateTime<Utc>) -> Day {
    match ts.weekday() {
        Weekday::Mon => Day::Monday,
        Weekday::Tue => Day::Tuesday,
        Weekday::Wed => Day::Wednesday,
        Weekday::Thu => Day::Thursday,
        Weekday::Fri => Day::Friday,
        Weekday::Sat => Day::Saturday,
        Weekday::Sun => Day::Sunday,
    }
}

/// "9:00", "17:00"
pub fn hour_label(hour: u32) -> String {
    format!("{}:00", hour)
}

/// Label of the exact start minute, e.g. "9:00" or "9:30"
pub fn exact_slot_label(ts: DateTime<Utc>) -> String {
    format!("{}:{:02}", ts.hour(), ts.minute())
}

/// Whole hours of the start day overlapped by `[start, end)`.
///
/// A meeting ending exactly on the hour does not touch that hour. A meeting
/// running past midnight is cut at the end of its start day.
pub fn hours_touched(start: DateTime<Utc>, end: DateTime<Utc>) -> std::ops::Range<u32> {
    let first = start.hour();
    if end <= start {
        return first..first;
    }

    let last_exclusive = if end.date_naive() > start.date_naive() {
        24
    } else if end.minute() > 0 || end.second() > 0 || end.nanosecond() > 0 {
        end.hour() + 1
    } else {
        end.hour()
    };

    first..last_exclusive.max(first + 1)
}

/// "Monday, March 3, 2025"
pub fn format_display_date(ts: DateTime<Utc>) -> String {
    ts.format("%A, %B %-d, %Y").to_string()
}

/// "9:00 UTC"
pub fn format_display_time(label: &str) -> String {
    format!("{} UTC", label)
}

/// Parse a meeting date like "2025-03-03" (midnight UTC) or an RFC 3339 timestamp
pub fn parse_meeting_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(dt.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }

    anyhow::bail!("Invalid date format. Use: YYYY-MM-DD or RFC3339")
}
