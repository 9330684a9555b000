//! Form value normalization
//!
//! The spreadsheet backend hands back dates as full timestamps, times as
//! `H:MM:SS`, phone numbers as JSON numbers and flags as `"Yes"`/`"No"`.
//! These helpers fold all of that into the plain strings and booleans the
//! form works with.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer};

/// Normalize a date value to the form's `YYYY-MM-DD` representation.
///
/// Accepts plain dates and RFC 3339 timestamps. Anything unparseable
/// becomes an empty string.
pub fn normalize_date_input(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return timestamp.date_naive().format("%Y-%m-%d").to_string();
    }
    String::new()
}

/// Normalize a time-of-day value to `HH:MM`.
///
/// Accepts `H:MM`, `HH:MM:SS` and RFC 3339 timestamps.
pub fn normalize_time_input(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    for pattern in ["%H:%M", "%H:%M:%S"] {
        if let Ok(time) = NaiveTime::parse_from_str(value, pattern) {
            return format!("{:02}:{:02}", time.hour(), time.minute());
        }
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return format!("{:02}:{:02}", timestamp.hour(), timestamp.minute());
    }
    String::new()
}

/// Split the accompanying-teachers text into names, dropping blank segments
pub fn split_names(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|name| !name.is_empty())
}

/// Lenient deserializers for loosely typed backend payloads
pub(crate) mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    /// String field that tolerates `null` and numbers
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Option::<Loose>::deserialize(deserializer)? {
            None => String::new(),
            Some(Loose::Text(text)) => text,
            Some(Loose::Int(n)) => n.to_string(),
            Some(Loose::Float(n)) => n.to_string(),
            Some(Loose::Bool(b)) => b.to_string(),
        })
    }

    /// Timestamp field; unparseable or missing values become `None`
    pub fn timestamp<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = match Option::<Loose>::deserialize(deserializer)? {
            Some(Loose::Text(text)) => text,
            _ => return Ok(None),
        };
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw.trim()) {
            return Ok(Some(timestamp.with_timezone(&Utc)));
        }
        Ok(NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc()))
    }

    /// Boolean field that also accepts `"Yes"`/`"No"`, `"true"`/`"false"` and 0/1
    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Option::<Loose>::deserialize(deserializer)? {
            None => false,
            Some(Loose::Bool(b)) => b,
            Some(Loose::Int(n)) => n != 0,
            Some(Loose::Float(n)) => n != 0.0,
            Some(Loose::Text(text)) => matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "yes" | "y" | "true" | "1"
            ),
        })
    }
}
