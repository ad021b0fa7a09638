//! Local-day window arithmetic.
//!
//! Every component queries "today" as `[start-of-local-day,
//! start-of-next-local-day)`. Keeping the computation in one place keeps the
//! adapters' query window and the detector's filter in agreement.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};

/// Half-open UTC interval covering one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Window for the local day containing `now`.
    pub fn containing<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::for_date(now.date_naive(), &now.timezone())
    }

    /// Window for `date` interpreted in `tz`.
    pub fn for_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        Self { start: local_midnight(date, tz), end: local_midnight(next, tz) }
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Start of `date` in `tz`.
///
/// Where midnight is skipped by a DST transition the earliest valid instant of
/// the day is used.
pub fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let mut naive = date.and_time(chrono::NaiveTime::MIN);
    for _ in 0..4 {
        if let Some(local) = tz.from_local_datetime(&naive).earliest() {
            return local.with_timezone(&Utc);
        }
        naive += chrono::Duration::minutes(30);
    }
    naive.and_utc()
}

/// Whether `instant` falls exactly on a local midnight in `tz`.
pub fn is_local_midnight<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> bool {
    let local = instant.with_timezone(tz);
    local_midnight(local.date_naive(), tz) == instant
}
