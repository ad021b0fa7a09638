//! Settings persistence adapters.

mod document;
pub mod json_store;
pub mod memory_store;

pub use json_store::JsonSettingsStore;
pub use memory_store::MemorySettingsStore;
