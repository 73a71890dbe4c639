//! Timestamp utilities

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Partition date for a moment: the UTC calendar day
pub fn partition_date(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// `YYYY-MM-DD`
pub fn ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// RFC 3339 with whole seconds, `Z` suffix
pub fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
