//! Calendar discovery and selection types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_tag_conversions;

/// Kind of backing store for a native calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarType {
    Local,
    Subscribed,
    Exchange,
    Caldav,
    Unknown,
}

impl_domain_tag_conversions!(CalendarType {
    Local => "local",
    Subscribed => "subscribed",
    Exchange => "exchange",
    Caldav => "caldav",
    Unknown => "unknown",
});

impl CalendarType {
    /// Lenient mapping used for bridge output; anything unrecognized is
    /// `Unknown`.
    #[must_use]
    pub fn from_bridge(kind: &str) -> Self {
        kind.parse().unwrap_or(Self::Unknown)
    }
}

/// A calendar as exposed by discovery.
///
/// For the native source the display name doubles as the identifier because
/// the scripting bridge exposes no stable UID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMetadata {
    pub id: String,
    pub name: String,
    pub visible: bool,
    pub color: String,
    #[serde(rename = "type")]
    pub calendar_type: CalendarType,
}

/// Valid calendars plus itemized diagnostics for malformed bridge entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    pub calendars: Vec<CalendarMetadata>,
    pub errors: Vec<String>,
}

/// The user's saved choice of native calendars to extract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSelection {
    pub selected: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CalendarSelection {
    pub fn new(selected: Vec<String>, updated_at: DateTime<Utc>) -> Self {
        Self { selected, updated_at: Some(updated_at) }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.iter().all(|name| name.trim().is_empty())
    }
}
