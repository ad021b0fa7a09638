//! External integrations

pub mod calendar;

pub use calendar::{CloudApiAdapter, FileImportAdapter, NativeScriptAdapter};
