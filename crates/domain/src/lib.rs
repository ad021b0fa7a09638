//! # DayBrief Domain
//!
//! Business domain types and models for the DayBrief calendar engine.
//!
//! This crate contains:
//! - The canonical calendar event model and import results
//! - Discovery, selection and sync status types
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other DayBrief crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::day_window::DayWindow;
