//! Meeting detector
//!
//! Derives "today's meetings" from the synchronizer's stored events. It never
//! triggers an extraction itself, and it does not watch the store: callers
//! that know the stored set changed (a completed sync, a file import) must call
//! [`MeetingDetector::invalidate_cache`].

use std::sync::Arc;

use chrono::NaiveDate;
use daybrief_domain::{CalendarConfig, DayWindow, Result, TodaysMeetings};
use moka::future::Cache;
use tracing::{debug, instrument, warn};

use super::ports::StoredEvents;
use crate::clock::Clock;

/// Filters stored events to the current local day, with a short TTL cache.
///
/// Results are keyed by local date so a cached answer never leaks across
/// midnight. Empty results are cached exactly like non-empty ones.
pub struct MeetingDetector {
    events: Arc<dyn StoredEvents>,
    clock: Arc<dyn Clock>,
    cache: Cache<NaiveDate, Arc<TodaysMeetings>>,
}

impl MeetingDetector {
    pub fn new(events: Arc<dyn StoredEvents>, clock: Arc<dyn Clock>, config: &CalendarConfig) -> Self {
        Self {
            events,
            clock,
            cache: Cache::builder().time_to_live(config.meeting_cache_ttl()).max_capacity(4).build(),
        }
    }

    /// Today's meetings, sorted by start.
    ///
    /// A failed read degrades to an empty result with a valid detection
    /// timestamp; that degraded result is not cached.
    #[instrument(skip(self))]
    pub async fn get_todays_meetings(&self) -> TodaysMeetings {
        let now = self.clock.now();
        let today = now.date_naive();
        let window = DayWindow::containing(&now);

        let lookup = self.cache.try_get_with(today, self.detect(window)).await;
        match lookup {
            Ok(meetings) => meetings.as_ref().clone(),
            Err(err) => {
                warn!(error = %err, "reading stored events failed; reporting no meetings");
                TodaysMeetings {
                    meetings: Vec::new(),
                    detected_at: self.clock.now_utc(),
                    window_start: window.start,
                    window_end: window.end,
                }
            }
        }
    }

    pub async fn has_todays_meetings(&self) -> bool {
        !self.get_todays_meetings().await.is_empty()
    }

    /// Drop every cached result.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }

    async fn detect(&self, window: DayWindow) -> Result<Arc<TodaysMeetings>> {
        let stored = self.events.stored_events().await?;
        let total = stored.len();

        let mut meetings: Vec<_> =
            stored.into_iter().filter(|event| event.overlaps(window.start, window.end)).collect();
        meetings.sort_by_key(|event| event.start_date);

        debug!(total, today = meetings.len(), "filtered stored events to today");

        Ok(Arc::new(TodaysMeetings {
            meetings,
            detected_at: self.clock.now_utc(),
            window_start: window.start,
            window_end: window.end,
        }))
    }
}
