//! `lastmod` date parsing and formatting.
//!
//! Sidecars and content collections carry either a plain `YYYY-MM-DD` date
//! or a full RFC 3339 timestamp. Sitemaps only need the calendar date, so
//! both are reduced to a [`NaiveDate`] (in UTC for timestamps).

use chrono::{DateTime, NaiveDate, Utc};

/// Format used in sitemap `<lastmod>` elements.
pub const LASTMOD_FORMAT: &str = "%Y-%m-%d";

/// Parse from "YYYY-MM-DD" or an RFC 3339 timestamp.
pub fn parse_lastmod(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, LASTMOD_FORMAT) {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

/// Format a date for a sitemap `<lastmod>`.
pub fn format_lastmod(date: NaiveDate) -> String {
    date.format(LASTMOD_FORMAT).to_string()
}
