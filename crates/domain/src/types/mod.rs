//! Domain types and models

pub mod calendar;
pub mod event;
pub mod sync;

pub use calendar::{CalendarMetadata, CalendarSelection, CalendarType, DiscoveryResult};
pub use event::{CalendarEvent, CalendarImportResult, EventDraft, EventSourceKind};
pub use sync::{ManualSyncResult, SyncStatus, TodaysMeetings};
