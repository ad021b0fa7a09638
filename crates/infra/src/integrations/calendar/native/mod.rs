//! Native desktop calendar source.
//!
//! Extraction and discovery run generated AppleScript through the
//! [`ScriptRunner`](daybrief_core::ScriptRunner) port and parse the bridge's
//! single-line output.

pub mod adapter;
pub mod date;
pub mod output;
pub mod script;

pub use adapter::NativeScriptAdapter;
