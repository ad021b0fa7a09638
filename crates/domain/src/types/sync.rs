//! Sync status and meeting detection result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::CalendarEvent;
use crate::constants::{NO_CALENDARS_CONNECTED, SYNC_ALREADY_IN_PROGRESS};

/// Scheduler state exposed to the UI.
///
/// `error` is always present in the serialized form (`null` when clear).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub enabled: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub next_scheduled: Option<DateTime<Utc>>,
    pub running: bool,
    pub error: Option<String>,
}

/// Outcome of a manual sync. Failures are encoded here, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSyncResult {
    pub success: bool,
    pub events_count: usize,
    pub error: Option<String>,
}

impl ManualSyncResult {
    pub fn succeeded(events_count: usize) -> Self {
        Self { success: true, events_count, error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, events_count: 0, error: Some(message.into()) }
    }

    pub fn already_running() -> Self {
        Self { success: true, events_count: 0, error: Some(SYNC_ALREADY_IN_PROGRESS.to_string()) }
    }

    pub fn not_connected() -> Self {
        Self { success: true, events_count: 0, error: Some(NO_CALENDARS_CONNECTED.to_string()) }
    }
}

/// Today's meetings as derived by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaysMeetings {
    pub meetings: Vec<CalendarEvent>,
    pub detected_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl TodaysMeetings {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_serializes_as_null() {
        let json = serde_json::to_value(ManualSyncResult::succeeded(3)).unwrap();
        assert!(json.get("error").is_some());
        assert!(json["error"].is_null());

        let status = serde_json::to_value(SyncStatus::default()).unwrap();
        assert!(status["error"].is_null());
        assert!(status["lastSync"].is_null());
    }

    #[test]
    fn short_circuit_results_carry_messages() {
        assert_eq!(
            ManualSyncResult::already_running().error.as_deref(),
            Some("Sync already in progress")
        );
        assert_eq!(ManualSyncResult::not_connected().error.as_deref(), Some("No calendars connected"));
        assert!(!ManualSyncResult::failed("boom").success);
    }
}
