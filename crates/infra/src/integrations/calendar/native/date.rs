//! Parsing of the scripting bridge's localized date strings.
//!
//! The bridge renders dates as `"<Weekday>, <day> <month> <year> at
//! <HH>.<MM>.<SS>"`. Normalization strips the weekday prefix, replaces
//! `" at "` with a space and turns the dotted time into a colon-separated one
//! before trying a small set of formats. The result is interpreted in the
//! supplied time zone (the host's local zone in production).

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use daybrief_domain::{DayBriefError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

const FORMATS: &[&str] = &[
    "%d %B %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%d %b %Y %H:%M",
    "%d %B %Y %I:%M:%S %p",
    "%d %B %Y %I:%M %p",
];

#[allow(clippy::expect_used)]
static DOTTED_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})\.(\d{2})(?:\.(\d{2}))?\b").expect("valid dotted time regex")
});

/// Normalize a bridge date into a `chrono` friendly string.
fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_weekday = match trimmed.split_once(", ") {
        Some((prefix, rest)) if prefix.chars().all(char::is_alphabetic) => rest,
        _ => trimmed,
    };
    let spaced = without_weekday.replace(" at ", " ");

    DOTTED_TIME
        .replace_all(&spaced, |caps: &regex::Captures<'_>| match caps.get(3) {
            Some(seconds) => format!("{}:{}:{}", &caps[1], &caps[2], seconds.as_str()),
            None => format!("{}:{}", &caps[1], &caps[2]),
        })
        .into_owned()
}

/// Parse a bridge date in `tz`.
///
/// # Errors
/// `ParseError` when no supported format matches or the local time does not
/// exist in `tz`. Never falls back to a default instant.
pub fn parse_bridge_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let normalized = normalize(raw);

    let naive = FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .ok_or_else(|| DayBriefError::ParseError(format!("unrecognized calendar date: {raw:?}")))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            DayBriefError::ParseError(format!("calendar date {raw:?} does not exist locally"))
        })
}
