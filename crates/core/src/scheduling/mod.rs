//! Sync scheduling: daily job registration, manual sync, resume re-arming.

pub mod ports;
pub mod service;

pub use ports::{JobHandle, JobRegistrar, PowerEvent, PowerSignal, ScheduledJob};
pub use service::SyncScheduler;
