//! Composition root wiring adapters, services and platform hooks together.
//!
//! The native script source is used wherever the host supports it; other
//! hosts fall back to the Google Calendar source. Calendar files are imported
//! on demand and replace the stored event set.

use std::path::Path;
use std::sync::Arc;

use daybrief_core::{
    CalendarDiscovery, CalendarSynchronizer, Clock, EventSource, JobRegistrar, MeetingDetector,
    PowerSignal, SettingsStore, StoredEvents, SyncScheduler, SystemClock,
};
use daybrief_domain::{CalendarImportResult, Config, Result};
use tracing::{info, instrument, warn};

use crate::integrations::calendar::{CloudApiAdapter, FileImportAdapter, NativeScriptAdapter};
use crate::platform::{ClockJumpPowerSignal, OsascriptRunner};
use crate::scheduling::CronJobRegistrar;
use crate::settings::JsonSettingsStore;

/// Fully wired engine.
pub struct DayBriefRuntime {
    config: Config,
    store: Arc<dyn SettingsStore>,
    synchronizer: CalendarSynchronizer,
    detector: Arc<MeetingDetector>,
    scheduler: Arc<SyncScheduler>,
    registrar: Arc<CronJobRegistrar>,
    power: Arc<ClockJumpPowerSignal>,
    file_import: FileImportAdapter,
}

impl DayBriefRuntime {
    /// Load configuration and open the JSON settings store it names.
    pub async fn load() -> Result<Self> {
        Self::open(crate::config::load()?).await
    }

    /// Open the JSON settings store named by `config`.
    pub async fn open(config: Config) -> Result<Self> {
        let store = JsonSettingsStore::open(&config.storage.settings_path).await?;
        Self::with_store(config, Arc::new(store), Arc::new(SystemClock))
    }

    /// Wire the engine around an existing store and clock.
    ///
    /// Must be called inside a Tokio runtime; the resume monitor is spawned
    /// immediately.
    #[instrument(skip_all)]
    pub fn with_store(
        config: Config,
        store: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let native = Arc::new(NativeScriptAdapter::new(
            Arc::new(OsascriptRunner::new()),
            clock.clone(),
            &config.calendar,
        ));

        let (source, discovery) = if native.is_supported() {
            let discovery = native.clone() as Arc<dyn CalendarDiscovery>;
            (native as Arc<dyn EventSource>, Some(discovery))
        } else {
            let cloud = CloudApiAdapter::new(store.clone(), clock.clone(), config.cloud.clone());
            (Arc::new(cloud) as Arc<dyn EventSource>, None)
        };
        info!(source = %source.kind(), "calendar source selected");

        let synchronizer = CalendarSynchronizer::new(
            source,
            discovery,
            store.clone(),
            clock.clone(),
            &config.calendar,
        );
        let stored: Arc<dyn StoredEvents> = Arc::new(synchronizer.clone());
        let detector = Arc::new(MeetingDetector::new(stored, clock.clone(), &config.calendar));

        let registrar = Arc::new(CronJobRegistrar::new());
        let power = Arc::new(ClockJumpPowerSignal::new(config.scheduler.resume_poll_interval()));
        power.start();

        let scheduler = SyncScheduler::new(
            synchronizer.clone(),
            detector.clone(),
            registrar.clone() as Arc<dyn JobRegistrar>,
            power.clone() as Arc<dyn PowerSignal>,
            clock.clone(),
            config.scheduler.clone(),
        );

        let file_import = FileImportAdapter::new(clock, &config.calendar)?;

        Ok(Self { config, store, synchronizer, detector, scheduler, registrar, power, file_import })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    pub fn synchronizer(&self) -> &CalendarSynchronizer {
        &self.synchronizer
    }

    pub fn detector(&self) -> &Arc<MeetingDetector> {
        &self.detector
    }

    pub fn scheduler(&self) -> &Arc<SyncScheduler> {
        &self.scheduler
    }

    /// Report a host resume observed by the embedding application.
    pub fn notify_resumed(&self) {
        self.power.notify_resumed();
    }

    /// Import a calendar file and make its events the stored set.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn import_file(&self, path: &Path) -> Result<CalendarImportResult> {
        let result = self.file_import.import_file(path).await?;
        self.synchronizer.replace_events(&result).await?;
        self.detector.invalidate_cache();
        Ok(result)
    }

    /// Stop the daily job, the resume monitor and the cron scheduler.
    #[instrument(skip(self))]
    pub async fn dispose(&self) {
        self.scheduler.dispose().await;
        self.power.shutdown().await;
        if let Err(err) = self.registrar.shutdown().await {
            warn!(error = %err, "failed to stop cron scheduler");
        }
        info!("runtime disposed");
    }
}
