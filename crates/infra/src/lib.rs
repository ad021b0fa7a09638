//! # DayBrief Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - Calendar source adapters (native script, `.ics` file, Google Calendar)
//! - The `osascript` runner and the resume-detecting power signal
//! - The cron-backed daily job registrar
//! - Settings persistence (JSON file, in-memory)
//! - Configuration loading and tracing setup
//! - The runtime composition root
//!
//! ## Architecture
//! - Implements traits defined in `daybrief-core`
//! - Contains all "impure" code (processes, files, HTTP, timers)

pub mod config;
pub mod errors;
pub mod integrations;
pub mod logging;
pub mod platform;
pub mod runtime;
pub mod scheduling;
pub mod settings;

// Re-export commonly used items
pub use errors::InfraError;
pub use integrations::calendar::{CloudApiAdapter, FileImportAdapter, NativeScriptAdapter};
pub use logging::{init_tracing, LogFormat};
pub use platform::{ClockJumpPowerSignal, OsascriptRunner};
pub use runtime::DayBriefRuntime;
pub use scheduling::CronJobRegistrar;
pub use settings::{JsonSettingsStore, MemorySettingsStore};
