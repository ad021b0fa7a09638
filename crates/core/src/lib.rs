//! # DayBrief Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for event sources, the scripting bridge, settings
//!   persistence, job registration and power signals
//! - The calendar synchronizer (coalescing + freshness cache + persistence)
//! - The meeting detector ("today's meetings")
//! - The sync scheduler (daily + manual sync)
//!
//! ## Architecture Principles
//! - Only depends on `daybrief-domain`
//! - No process, file or network code; timers only through ports and Tokio
//! - All external dependencies via traits

pub mod calendar;
pub mod clock;
pub mod scheduling;

pub use calendar::{
    CalendarDiscovery, CalendarSynchronizer, EventSource, MeetingDetector, ScriptRunner,
    SettingsStore, StoredEvents,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use scheduling::{JobHandle, JobRegistrar, PowerEvent, PowerSignal, ScheduledJob, SyncScheduler};
