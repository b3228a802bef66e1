//! Folder view "last modified" date normalization
//!
//! The embedded folder view renders modification dates in one of two shapes:
//! - `MM/DD/YY` for entries outside the current year
//! - `Mon D` (e.g. `Jan 27`) for entries within the current year
//!
//! Both are normalized to midnight UTC of the named day. Two-digit years are
//! read as `20YY`; word-form dates take the year from the supplied clock.

use adx_common::Clock;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use thiserror::Error;

/// Date normalization errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unrecognized month: {0:?}")]
    UnrecognizedMonth(String),

    #[error("invalid date: {0:?}")]
    InvalidDate(String),
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Normalize a folder view date label to a UTC timestamp
pub fn normalize(text: &str, clock: &dyn Clock) -> Result<DateTime<Utc>, NormalizeError> {
    let text = text.trim();
    let invalid = || NormalizeError::InvalidDate(text.to_string());

    let date = if text.contains('/') {
        let mut parts = text.split('/');
        let (Some(month), Some(day), Some(year), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let month = parse_number(month).ok_or_else(invalid)?;
        let day = parse_number(day).ok_or_else(invalid)?;
        let year = parse_number(year)
            .and_then(|yy| i32::try_from(yy).ok())
            .and_then(|yy| yy.checked_add(2000))
            .ok_or_else(invalid)?;

        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?
    } else {
        let (month, day) = text.split_once(' ').ok_or_else(invalid)?;

        let month = MONTHS
            .iter()
            .position(|m| *m == month)
            .ok_or_else(|| NormalizeError::UnrecognizedMonth(month.to_string()))?;
        let day = parse_number(day.trim()).ok_or_else(invalid)?;

        NaiveDate::from_ymd_opt(clock.now().year(), month as u32 + 1, day).ok_or_else(invalid)?
    };

    date.and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .ok_or_else(invalid)
}

fn parse_number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
