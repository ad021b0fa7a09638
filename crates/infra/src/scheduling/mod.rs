//! Scheduling infrastructure: cron-backed daily job registration.

pub mod cron_registrar;
pub mod error;

pub use cron_registrar::CronJobRegistrar;
pub use error::{SchedulerError, SchedulerResult};
