//! On-disk layout of the settings store.

use daybrief_domain::{CalendarEvent, CalendarSelection};
use serde::{Deserialize, Serialize};

/// Every key the engine persists.
///
/// Unknown keys written by other components are preserved across rewrites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsDocument {
    pub calendar_events: Vec<CalendarEvent>,
    pub calendar_selection: CalendarSelection,
    pub google_calendar_connected: bool,
    pub google_calendar_refresh_token: Option<String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}
