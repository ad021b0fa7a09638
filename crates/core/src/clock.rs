//! Wall-clock abstraction for freshness checks, day windows and detection
//! timestamps.
//!
//! # Examples
//!
//! ```
//! use chrono::{Duration, Local, TimeZone};
//! use daybrief_core::clock::{Clock, FixedClock};
//!
//! let start = Local.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).single().unwrap();
//! let clock = FixedClock::new(start);
//! clock.advance(Duration::minutes(3));
//! assert_eq!(clock.now(), start + Duration::minutes(3));
//! ```

use chrono::{DateTime, Duration, Local, Utc};
use parking_lot::Mutex;

/// Source of "now" in the host's local time zone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Manually driven clock for deterministic tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Local>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}
