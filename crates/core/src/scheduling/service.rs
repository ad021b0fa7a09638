//! Sync scheduler - daily and manual calendar synchronization.
//!
//! Drives the [`CalendarSynchronizer`] on a daily wall-clock job and on
//! demand. It never touches events directly; it only tracks status scalars.
//!
//! A single sync attempt moves `Idle -> Running -> {Succeeded, Failed} ->
//! Idle`. A call that finds another attempt running short-circuits without
//! entering `Running`.
//!
//! Wall-clock timers do not fire while the host sleeps, so the scheduler
//! re-arms its job whenever the [`PowerSignal`] reports a resume and catches up
//! a daily sync that was missed in the meantime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Days, Local, TimeZone, Utc};
use daybrief_domain::{ManualSyncResult, Result, SchedulerConfig, SyncStatus};
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::ports::{JobHandle, JobRegistrar, PowerEvent, PowerSignal, ScheduledJob};
use crate::calendar::{CalendarSynchronizer, MeetingDetector};
use crate::clock::Clock;

const LISTENER_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Holds the manual-sync running flag for the lifetime of one attempt.
///
/// Dropping the guard clears the flag, so every exit path of an attempt
/// (return, error, panic unwind, cancellation) releases it.
struct RunningGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Default)]
struct StatusFields {
    enabled: bool,
    last_sync: Option<DateTime<Utc>>,
    next_scheduled: Option<DateTime<Utc>>,
    error: Option<String>,
}

#[derive(Default)]
struct Registration {
    job: Option<JobHandle>,
    resume_listener: Option<(CancellationToken, JoinHandle<()>)>,
    catch_up: Option<JoinHandle<()>>,
}

/// Daily and manual synchronization with mutual exclusion.
pub struct SyncScheduler {
    synchronizer: CalendarSynchronizer,
    detector: Arc<MeetingDetector>,
    registrar: Arc<dyn JobRegistrar>,
    power: Arc<dyn PowerSignal>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    running: AtomicBool,
    status: Mutex<StatusFields>,
    registration: AsyncMutex<Registration>,
}

impl SyncScheduler {
    pub fn new(
        synchronizer: CalendarSynchronizer,
        detector: Arc<MeetingDetector>,
        registrar: Arc<dyn JobRegistrar>,
        power: Arc<dyn PowerSignal>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            synchronizer,
            detector,
            registrar,
            power,
            clock,
            config,
            running: AtomicBool::new(false),
            status: Mutex::new(StatusFields::default()),
            registration: AsyncMutex::new(Registration::default()),
        })
    }

    /// Register the recurring daily sync.
    ///
    /// Idempotent while enabled. On first registration an out-of-band sync is
    /// spawned when nothing has synced yet today; the caller is not blocked on
    /// it.
    #[instrument(skip(self))]
    pub async fn start_daily_sync(self: &Arc<Self>) -> Result<()> {
        let mut registration = self.registration.lock().await;
        if registration.job.is_some() {
            debug!("daily sync already registered");
            return Ok(());
        }

        let handle = self.registrar.register_daily(self.config.daily_sync_time, self.job()).await?;
        registration.job = Some(handle);
        registration.resume_listener = Some(self.spawn_resume_listener());

        {
            let mut status = self.status.lock();
            status.enabled = true;
            status.next_scheduled = Some(self.next_run_after(self.clock.now()));
        }

        info!(at = %self.config.daily_sync_time, job = %handle.0, "daily sync registered");

        if !self.synced_today() {
            registration.catch_up = Some(self.spawn_catch_up("initial"));
        }

        Ok(())
    }

    /// Cancel the recurring job and the resume listener.
    #[instrument(skip(self))]
    pub async fn stop_daily_sync(&self) -> Result<()> {
        let (job, listener) = {
            let mut registration = self.registration.lock().await;
            (registration.job.take(), registration.resume_listener.take())
        };

        {
            let mut status = self.status.lock();
            status.enabled = false;
            status.next_scheduled = None;
        }

        if let Some((token, handle)) = listener {
            token.cancel();
            if tokio::time::timeout(LISTENER_JOIN_TIMEOUT, handle).await.is_err() {
                warn!("resume listener did not exit in time");
            }
        }

        match job {
            Some(job) => {
                self.registrar.cancel(job).await?;
                info!(job = %job.0, "daily sync stopped");
            }
            None => debug!("daily sync was not registered"),
        }
        Ok(())
    }

    /// Explicit shutdown invoked by the owning process lifecycle.
    pub async fn dispose(&self) {
        if let Err(err) = self.stop_daily_sync().await {
            error!(error = %err, "failed to stop daily sync during dispose");
        }
        if let Some(catch_up) = self.registration.lock().await.catch_up.take() {
            catch_up.abort();
        }
    }

    /// Run one synchronization now.
    ///
    /// Never fails outward; every outcome is encoded in the result.
    #[instrument(skip(self))]
    pub async fn perform_manual_sync(&self) -> ManualSyncResult {
        let Some(_running) = RunningGuard::acquire(&self.running) else {
            debug!("sync requested while another sync is running");
            return ManualSyncResult::already_running();
        };

        if !self.synchronizer.has_connected_source().await {
            debug!("no calendar source connected; skipping sync");
            return ManualSyncResult::not_connected();
        }

        self.synchronizer.invalidate_cache();
        match self.synchronizer.extract(None).await {
            Ok(result) => {
                self.detector.invalidate_cache();
                let mut status = self.status.lock();
                status.last_sync = Some(self.clock.now_utc());
                status.error = None;
                info!(events = result.total_count, "calendar sync succeeded");
                ManualSyncResult::succeeded(result.total_count)
            }
            Err(err) => {
                let message = err.to_string();
                warn!(code = err.code(), error = %message, "calendar sync failed");
                self.status.lock().error = Some(message.clone());
                ManualSyncResult::failed(message)
            }
        }
    }

    pub fn get_sync_status(&self) -> SyncStatus {
        let status = self.status.lock();
        SyncStatus {
            enabled: status.enabled,
            last_sync: status.last_sync,
            next_scheduled: status.next_scheduled,
            running: self.running.load(Ordering::Acquire),
            error: status.error.clone(),
        }
    }

    fn job(self: &Arc<Self>) -> ScheduledJob {
        let weak = Arc::downgrade(self);
        Arc::new(move || {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(scheduler) = weak.upgrade() {
                    scheduler.run_scheduled().await;
                }
            })
        })
    }

    async fn run_scheduled(&self) {
        let outcome = self.perform_manual_sync().await;
        self.status.lock().next_scheduled = Some(self.next_run_after(self.clock.now()));
        debug!(success = outcome.success, error = ?outcome.error, "scheduled sync finished");
    }

    fn spawn_catch_up(self: &Arc<Self>, reason: &'static str) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = scheduler.perform_manual_sync().await;
            debug!(reason, success = outcome.success, error = ?outcome.error, "catch-up sync finished");
        })
    }

    fn spawn_resume_listener(self: &Arc<Self>) -> (CancellationToken, JoinHandle<()>) {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let mut events = self.power.subscribe();
        let weak: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(PowerEvent::Resumed) => {
                            let Some(scheduler) = weak.upgrade() else { break };
                            scheduler.rearm().await;
                        }
                        Ok(PowerEvent::Suspended) => debug!("host suspending"),
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "power events lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("resume listener exited");
        });

        (token, handle)
    }

    /// Re-register the daily job after the host resumed.
    async fn rearm(self: &Arc<Self>) {
        let mut registration = self.registration.lock().await;
        let Some(previous) = registration.job.take() else {
            debug!("resume observed while daily sync disabled");
            return;
        };

        if let Err(err) = self.registrar.cancel(previous).await {
            warn!(error = %err, "failed to cancel daily job before re-arming");
        }

        match self.registrar.register_daily(self.config.daily_sync_time, self.job()).await {
            Ok(handle) => {
                registration.job = Some(handle);
                self.status.lock().next_scheduled = Some(self.next_run_after(self.clock.now()));
                info!(job = %handle.0, "daily sync re-armed after resume");
            }
            Err(err) => {
                error!(error = %err, "failed to re-arm daily sync after resume");
                let mut status = self.status.lock();
                status.enabled = false;
                status.next_scheduled = None;
                status.error = Some(err.to_string());
                return;
            }
        }

        if self.missed_todays_run() {
            registration.catch_up = Some(self.spawn_catch_up("resume"));
        }
    }

    fn synced_today(&self) -> bool {
        let today = self.clock.now().date_naive();
        self.status
            .lock()
            .last_sync
            .is_some_and(|at| at.with_timezone(&Local).date_naive() == today)
    }

    fn missed_todays_run(&self) -> bool {
        let now = self.clock.now();
        now.time() >= self.config.daily_sync_time && !self.synced_today()
    }

    fn next_run_after(&self, now: DateTime<Local>) -> DateTime<Utc> {
        let at = self.config.daily_sync_time;
        let today = now.date_naive();
        let candidate = |date: chrono::NaiveDate| {
            Local
                .from_local_datetime(&date.and_time(at))
                .earliest()
                .map(|local| local.with_timezone(&Utc))
        };

        match candidate(today).filter(|run| *run > now.with_timezone(&Utc)) {
            Some(run) => run,
            None => today
                .checked_add_days(Days::new(1))
                .and_then(candidate)
                .unwrap_or_else(|| now.with_timezone(&Utc) + chrono::Duration::days(1)),
        }
    }
}
