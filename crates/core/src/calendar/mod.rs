//! Calendar acquisition: ports, the synchronizer, and the meeting detector.

pub mod detector;
pub mod ports;
pub mod synchronizer;

pub use detector::MeetingDetector;
pub use ports::{
    CalendarDiscovery, EventSource, ScriptRunner, SettingsStore, StoredEvents,
};
pub use synchronizer::CalendarSynchronizer;
