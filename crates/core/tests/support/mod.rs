//! Shared test helpers for `daybrief-core` integration tests.
//!
//! Lightweight in-memory doubles for the core ports so the synchronizer,
//! detector and scheduler tests can focus on behaviour.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use daybrief_core::{
    Clock, EventSource, FixedClock, JobHandle, JobRegistrar, PowerEvent, PowerSignal,
    ScheduledJob, SettingsStore, StoredEvents,
};
use daybrief_domain::{
    CalendarEvent, CalendarImportResult, CalendarSelection, DayBriefError, EventDraft,
    EventSourceKind, Result,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Local wall-clock instant on 6 January 2026.
pub fn local(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 1, 6, hour, minute, 0).single().expect("unambiguous local time")
}

pub fn fixed_clock(hour: u32, minute: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(local(hour, minute)))
}

/// Event spanning `[start, end)` in local time.
pub fn event(title: &str, start: DateTime<Local>, end: DateTime<Local>) -> CalendarEvent {
    EventDraft::new(start.with_timezone(&Utc), end.with_timezone(&Utc))
        .title(title)
        .calendar("Work")
        .into_event(EventSourceKind::Native)
        .expect("valid event")
}

/// In-memory `SettingsStore` counting event reads.
#[derive(Default)]
pub struct MemoryStore {
    events: Mutex<Vec<CalendarEvent>>,
    selection: Mutex<CalendarSelection>,
    google_connected: AtomicBool,
    event_reads: AtomicUsize,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_selection(names: &[&str]) -> Arc<Self> {
        let store = Self::default();
        store.selection.lock().selected = names.iter().map(ToString::to_string).collect();
        Arc::new(store)
    }

    pub fn seed(&self, events: Vec<CalendarEvent>) {
        *self.events.lock() = events;
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.lock().clone()
    }

    pub fn event_reads(&self) -> usize {
        self.event_reads.load(Ordering::SeqCst)
    }

    pub fn set_google_connected(&self, connected: bool) {
        self.google_connected.store(connected, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_events(&self) -> Result<Vec<CalendarEvent>> {
        self.event_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DayBriefError::Storage("settings unavailable".into()));
        }
        Ok(self.events.lock().clone())
    }

    async fn set_events(&self, events: &[CalendarEvent]) -> Result<()> {
        *self.events.lock() = events.to_vec();
        Ok(())
    }

    async fn get_calendar_selection(&self) -> Result<CalendarSelection> {
        Ok(self.selection.lock().clone())
    }

    async fn set_calendar_selection(&self, selection: CalendarSelection) -> Result<()> {
        *self.selection.lock() = selection;
        Ok(())
    }

    async fn google_calendar_connected(&self) -> Result<bool> {
        Ok(self.google_connected.load(Ordering::SeqCst))
    }

    async fn google_calendar_refresh_token(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// `StoredEvents` backed directly by a `MemoryStore`.
pub struct StoreEvents(pub Arc<MemoryStore>);

#[async_trait]
impl StoredEvents for StoreEvents {
    async fn stored_events(&self) -> Result<Vec<CalendarEvent>> {
        self.0.get_events().await
    }
}

/// Event source that sleeps, counts invocations and returns scripted events.
pub struct ScriptedSource {
    events: Mutex<Vec<CalendarEvent>>,
    delay: Duration,
    calls: AtomicUsize,
    failure: Mutex<Option<DayBriefError>>,
    last_selection: Mutex<Option<Vec<String>>>,
    kind: Mutex<EventSourceKind>,
    clock: Arc<dyn Clock>,
}

impl ScriptedSource {
    pub fn new(events: Vec<CalendarEvent>, delay: Duration, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(events),
            delay,
            calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
            last_selection: Mutex::new(None),
            kind: Mutex::new(EventSourceKind::Native),
            clock,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, err: Option<DayBriefError>) {
        *self.failure.lock() = err;
    }

    pub fn set_events(&self, events: Vec<CalendarEvent>) {
        *self.events.lock() = events;
    }

    pub fn last_selection(&self) -> Option<Vec<String>> {
        self.last_selection.lock().clone()
    }

    pub fn set_kind(&self, kind: EventSourceKind) {
        *self.kind.lock() = kind;
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    fn kind(&self) -> EventSourceKind {
        *self.kind.lock()
    }

    async fn extract(&self, selected: &[String]) -> Result<CalendarImportResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_selection.lock() = Some(selected.to_vec());
        tokio::time::sleep(self.delay).await;

        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        let events = self.events.lock().clone();
        Ok(CalendarImportResult::new(events, self.kind(), self.clock.now_utc(), Vec::new()))
    }
}

/// `JobRegistrar` that records registrations and fires jobs on demand.
#[derive(Default)]
pub struct ManualRegistrar {
    jobs: Mutex<Vec<(JobHandle, NaiveTime, ScheduledJob)>>,
    registered: AtomicUsize,
    cancelled: AtomicUsize,
}

impl ManualRegistrar {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn registered(&self) -> usize {
        self.registered.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Fire every active job once and wait for them.
    pub async fn fire_all(&self) {
        let jobs: Vec<ScheduledJob> = self.jobs.lock().iter().map(|(_, _, job)| job.clone()).collect();
        for job in jobs {
            job().await;
        }
    }
}

#[async_trait]
impl JobRegistrar for ManualRegistrar {
    async fn register_daily(&self, at: NaiveTime, job: ScheduledJob) -> Result<JobHandle> {
        let handle = JobHandle(Uuid::new_v4());
        self.jobs.lock().push((handle, at, job));
        self.registered.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }

    async fn cancel(&self, handle: JobHandle) -> Result<()> {
        self.jobs.lock().retain(|(h, _, _)| *h != handle);
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Power signal driven explicitly by the test.
pub struct ManualPower {
    sender: broadcast::Sender<PowerEvent>,
}

impl ManualPower {
    pub fn new() -> Arc<Self> {
        let (sender, _) = broadcast::channel(8);
        Arc::new(Self { sender })
    }

    pub fn resume(&self) {
        let _ = self.sender.send(PowerEvent::Resumed);
    }
}

impl PowerSignal for ManualPower {
    fn subscribe(&self) -> broadcast::Receiver<PowerEvent> {
        self.sender.subscribe()
    }
}

/// Poll `check` until it holds or a second elapses.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
