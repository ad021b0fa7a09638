//! Calendar synchronizer
//!
//! Orchestrates the configured event source, coalesces concurrent extraction
//! requests into one underlying invocation, serves recent results from a
//! short freshness window, and persists the canonical event set.
//!
//! # Extraction generations
//!
//! At most one extraction runs at a time. The running extraction is a single
//! [`Shared`] future stored in the synchronizer state; callers that arrive
//! while it is pending attach to that handle instead of starting a new one.
//! The handle is removed by an [`InFlightGuard`] before the outcome reaches
//! any waiter, on success, failure and cancellation alike.
//!
//! The stored event set is not transactional: a `clear_events` racing with
//! the completion of an extraction is last-writer-wins.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use daybrief_domain::{
    CalendarConfig, CalendarEvent, CalendarImportResult, CalendarSelection, DayBriefError,
    DiscoveryResult, EventSourceKind, Result,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use super::ports::{CalendarDiscovery, EventSource, SettingsStore, StoredEvents};
use crate::clock::Clock;

type SharedExtraction = Shared<BoxFuture<'static, Result<Arc<CalendarImportResult>>>>;

#[derive(Default)]
struct ExtractionState {
    generation: u64,
    in_flight: Option<(u64, SharedExtraction)>,
    last_success: Option<DateTime<Utc>>,
}

struct SynchronizerInner {
    source: Arc<dyn EventSource>,
    discovery: Option<Arc<dyn CalendarDiscovery>>,
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    freshness_window: Duration,
    state: Mutex<ExtractionState>,
}

/// Releases the in-flight slot of one extraction generation when dropped.
struct InFlightGuard {
    inner: Arc<SynchronizerInner>,
    generation: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        // The released handle is dropped outside the lock.
        let _released = {
            let mut state = self.inner.state.lock();
            match state.in_flight {
                Some((generation, _)) if generation == self.generation => state.in_flight.take(),
                _ => None,
            }
        };
    }
}

enum Plan {
    Attach(SharedExtraction),
    ServeStored(DateTime<Utc>),
}

/// Coalescing, caching front for calendar extraction.
#[derive(Clone)]
pub struct CalendarSynchronizer {
    inner: Arc<SynchronizerInner>,
}

impl CalendarSynchronizer {
    /// Create a synchronizer extracting from `source`.
    ///
    /// `discovery` is only available for the native source.
    pub fn new(
        source: Arc<dyn EventSource>,
        discovery: Option<Arc<dyn CalendarDiscovery>>,
        store: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
        config: &CalendarConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SynchronizerInner {
                source,
                discovery,
                store,
                clock,
                freshness_window: config.freshness_window(),
                state: Mutex::new(ExtractionState::default()),
            }),
        }
    }

    /// Extract today's events, coalescing concurrent callers.
    ///
    /// `selected` overrides the persisted calendar selection for this call.
    ///
    /// 1. While an extraction is in flight every caller receives the same
    ///    pending result.
    /// 2. Within the freshness window the stored events are returned without
    ///    touching the source.
    /// 3. Otherwise a new extraction generation starts; on success its events
    ///    replace the stored set.
    #[instrument(skip(self), fields(source = %self.inner.source.kind()))]
    pub async fn extract(
        &self,
        selected: Option<Vec<String>>,
    ) -> Result<Arc<CalendarImportResult>> {
        let plan = {
            let mut state = self.inner.state.lock();
            let now = self.inner.clock.now_utc();

            if let Some((generation, pending)) = &state.in_flight {
                debug!(generation, "attaching to in-flight extraction");
                Plan::Attach(pending.clone())
            } else if let Some(completed) =
                state.last_success.filter(|at| self.is_fresh(*at, now))
            {
                Plan::ServeStored(completed)
            } else {
                state.generation += 1;
                let generation = state.generation;
                let guard = InFlightGuard { inner: self.inner.clone(), generation };
                let pending = Self::run_extraction(guard, selected).boxed().shared();
                state.in_flight = Some((generation, pending.clone()));
                debug!(generation, "starting extraction");
                Plan::Attach(pending)
            }
        };

        match plan {
            Plan::Attach(pending) => pending.await,
            Plan::ServeStored(completed) => {
                debug!(%completed, "serving stored events within freshness window");
                let events = self.inner.store.get_events().await?;
                Ok(Arc::new(CalendarImportResult::new(
                    events,
                    self.inner.source.kind(),
                    completed,
                    Vec::new(),
                )))
            }
        }
    }

    async fn run_extraction(
        guard: InFlightGuard,
        selected: Option<Vec<String>>,
    ) -> Result<Arc<CalendarImportResult>> {
        let inner = guard.inner.clone();

        let selected = match selected {
            Some(names) => names,
            None => inner.store.get_calendar_selection().await?.selected,
        };

        let result = match inner.source.extract(&selected).await {
            Ok(result) => result,
            Err(err) => {
                warn!(code = err.code(), error = %err, "extraction failed");
                drop(guard);
                return Err(err);
            }
        };

        inner.store.set_events(&result.events).await?;
        let completed = inner.clock.now_utc();
        inner.state.lock().last_success = Some(completed);

        info!(
            events = result.total_count,
            skipped = result.errors.as_ref().map_or(0, Vec::len),
            "extraction completed"
        );

        drop(guard);
        Ok(Arc::new(result))
    }

    /// List the calendars exposed by the native source.
    #[instrument(skip(self))]
    pub async fn discover_calendars(&self) -> Result<DiscoveryResult> {
        let discovery = self.inner.discovery.as_ref().ok_or_else(|| {
            DayBriefError::PlatformUnsupported(format!(
                "calendar discovery is not available for the {} source",
                self.inner.source.kind()
            ))
        })?;

        let result = discovery.discover().await?;
        if !result.errors.is_empty() {
            warn!(malformed = result.errors.len(), "discovery skipped malformed calendars");
        }
        Ok(result)
    }

    pub async fn get_stored_events(&self) -> Result<Vec<CalendarEvent>> {
        self.inner.store.get_events().await
    }

    pub async fn clear_events(&self) -> Result<()> {
        self.inner.store.set_events(&[]).await
    }

    /// Forget the freshness timestamp so the next `extract` hits the source.
    pub fn invalidate_cache(&self) {
        self.inner.state.lock().last_success = None;
    }

    /// Whether the held source is the native calendar and this host can
    /// run it.
    pub fn is_native_source_supported(&self) -> bool {
        self.inner.source.kind() == EventSourceKind::Native && self.inner.source.is_supported()
    }

    /// Persist a batch produced outside `extract` (for example a file import)
    /// with the same full-replace semantics.
    pub async fn replace_events(&self, result: &CalendarImportResult) -> Result<()> {
        self.inner.store.set_events(&result.events).await?;
        self.inner.state.lock().last_success = Some(self.inner.clock.now_utc());
        info!(events = result.total_count, source = %result.source, "stored events replaced");
        Ok(())
    }

    pub async fn save_selection(&self, selected: Vec<String>) -> Result<()> {
        let selection = CalendarSelection::new(selected, self.inner.clock.now_utc());
        self.inner.store.set_calendar_selection(selection).await?;
        self.invalidate_cache();
        Ok(())
    }

    /// Whether the held source is connected.
    ///
    /// The native source needs host support and a non-empty saved selection;
    /// the cloud source needs the stored Google connection flag. File imports
    /// bypass `extract`, so a file source never counts as connected.
    pub async fn has_connected_source(&self) -> bool {
        let connected = match self.inner.source.kind() {
            EventSourceKind::Native => {
                if !self.inner.source.is_supported() {
                    return false;
                }
                self.inner.store.get_calendar_selection().await.map(|s| !s.is_empty())
            }
            EventSourceKind::Cloud => self.inner.store.google_calendar_connected().await,
            EventSourceKind::File => Ok(false),
        };

        connected.unwrap_or_else(|err| {
            warn!(error = %err, "failed to read connection state");
            false
        })
    }

    fn is_fresh(&self, completed: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        (now - completed).to_std().is_ok_and(|age| age < self.inner.freshness_window)
    }
}

#[async_trait]
impl StoredEvents for CalendarSynchronizer {
    async fn stored_events(&self) -> Result<Vec<CalendarEvent>> {
        self.get_stored_events().await
    }
}
