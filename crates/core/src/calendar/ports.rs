//! Port interfaces for calendar acquisition
//!
//! These traits define the boundaries between the synchronization logic and
//! the adapters, scripting bridge and persistence implemented in infra.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use daybrief_domain::{
    CalendarEvent, CalendarImportResult, CalendarSelection, DiscoveryResult, EventSourceKind,
    Result,
};

/// A strategy that turns source-specific raw data into canonical events.
#[async_trait]
pub trait EventSource: Send + Sync {
    fn kind(&self) -> EventSourceKind;

    /// Whether this source can run on the current host.
    fn is_supported(&self) -> bool {
        true
    }

    /// Extract today's events.
    ///
    /// `selected` restricts extraction to the named calendars; an empty slice
    /// means every calendar the source exposes.
    async fn extract(&self, selected: &[String]) -> Result<CalendarImportResult>;
}

/// Read-only listing of the calendars a source exposes.
#[async_trait]
pub trait CalendarDiscovery: Send + Sync {
    async fn discover(&self) -> Result<DiscoveryResult>;
}

/// Executes a staged script file against the native calendar application.
///
/// Implementations must kill the process and return `Timeout` once `timeout`
/// elapses, and map authorization refusals to `PermissionDenied`.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &Path, timeout: Duration) -> Result<String>;
}

/// Opaque key-value persistence boundary.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_events(&self) -> Result<Vec<CalendarEvent>>;

    async fn set_events(&self, events: &[CalendarEvent]) -> Result<()>;

    async fn get_calendar_selection(&self) -> Result<CalendarSelection>;

    async fn set_calendar_selection(&self, selection: CalendarSelection) -> Result<()>;

    async fn google_calendar_connected(&self) -> Result<bool>;

    async fn google_calendar_refresh_token(&self) -> Result<Option<String>>;
}

/// Read access to the synchronizer's stored event set.
#[async_trait]
pub trait StoredEvents: Send + Sync {
    async fn stored_events(&self) -> Result<Vec<CalendarEvent>>;
}
