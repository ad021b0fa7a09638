//! Platform-specific implementations
//!
//! # Platform Support
//!
//! - **macOS**: `osascript` drives Calendar.app for the native source
//! - **Other platforms**: the runner still exists (scripts fail to execute)
//!   and the native adapter reports itself unsupported
//!
//! The power signal is portable; it infers resumes from wall-clock jumps.

pub mod applescript;
pub mod power;

pub use applescript::OsascriptRunner;
pub use power::ClockJumpPowerSignal;
