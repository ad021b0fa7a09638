//! Shared domain helpers

pub mod day_window;

pub use day_window::{is_local_midnight, local_midnight, DayWindow};
