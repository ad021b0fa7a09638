//! Daily job registration on `tokio-cron-scheduler`.
//!
//! One [`JobScheduler`] instance backs every registration. It is created and
//! started lazily on the first registration and shut down explicitly through
//! [`CronJobRegistrar::shutdown`]. Every call into the scheduler is wrapped in
//! a timeout.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveTime, Timelike};
use daybrief_core::{JobHandle, JobRegistrar, ScheduledJob};
use daybrief_domain::Result;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

const OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// [`JobRegistrar`] running jobs in the host's local time zone.
#[derive(Default)]
pub struct CronJobRegistrar {
    scheduler: Mutex<Option<JobScheduler>>,
}

impl CronJobRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the underlying scheduler, dropping every registered job.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        let Some(mut scheduler) = self.scheduler.lock().await.take() else {
            return Ok(());
        };

        with_timeout(scheduler.shutdown())
            .await?
            .map_err(|source| SchedulerError::StopFailed { source })?;
        info!("cron scheduler stopped");
        Ok(())
    }

    async fn ensure_started(&self) -> SchedulerResult<JobScheduler> {
        let mut slot = self.scheduler.lock().await;
        if let Some(scheduler) = slot.as_ref() {
            return Ok(scheduler.clone());
        }

        let scheduler = with_timeout(JobScheduler::new())
            .await?
            .map_err(|source| SchedulerError::CreationFailed { source })?;
        with_timeout(scheduler.start())
            .await?
            .map_err(|source| SchedulerError::StartFailed { source })?;

        debug!("cron scheduler started");
        *slot = Some(scheduler.clone());
        Ok(scheduler)
    }
}

/// Six-field cron expression (with seconds) firing daily at `at`.
pub fn daily_cron_expression(at: NaiveTime) -> String {
    format!("{} {} {} * * *", at.second(), at.minute(), at.hour())
}

#[async_trait]
impl JobRegistrar for CronJobRegistrar {
    #[instrument(skip(self, job))]
    async fn register_daily(&self, at: NaiveTime, job: ScheduledJob) -> Result<JobHandle> {
        let scheduler = self.ensure_started().await?;
        let expression = daily_cron_expression(at);

        let definition = Job::new_async_tz(expression.as_str(), Local, move |_id, _lock| job())
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        let id = with_timeout(scheduler.add(definition))
            .await?
            .map_err(|source| SchedulerError::JobRegistrationFailed { source })?;

        debug!(cron = %expression, job_id = %id, "registered daily job");
        Ok(JobHandle(id))
    }

    #[instrument(skip(self))]
    async fn cancel(&self, handle: JobHandle) -> Result<()> {
        let scheduler = self.scheduler.lock().await.clone();
        let Some(scheduler) = scheduler else {
            warn!(job_id = %handle.0, "cancel requested before any job was registered");
            return Ok(());
        };

        with_timeout(scheduler.remove(&handle.0))
            .await?
            .map_err(|source| SchedulerError::JobCancellationFailed { source })?;
        debug!(job_id = %handle.0, "cancelled daily job");
        Ok(())
    }
}

async fn with_timeout<F: std::future::Future>(future: F) -> SchedulerResult<F::Output> {
    tokio::time::timeout(OPERATION_TIMEOUT, future)
        .await
        .map_err(|_| SchedulerError::Timeout { duration: OPERATION_TIMEOUT })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn daily_expression_includes_seconds_field() {
        let at = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
        assert_eq!(daily_cron_expression(at), "0 0 7 * * *");

        let at = NaiveTime::from_hms_opt(18, 45, 30).unwrap();
        assert_eq!(daily_cron_expression(at), "30 45 18 * * *");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn register_and_cancel_round_trip() {
        let registrar = CronJobRegistrar::new();
        let job: ScheduledJob = Arc::new(|| Box::pin(async {}));

        let handle = registrar
            .register_daily(NaiveTime::from_hms_opt(7, 0, 0).unwrap(), job)
            .await
            .unwrap();
        registrar.cancel(handle).await.unwrap();
        registrar.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn cancel_without_registration_is_a_no_op() {
        let registrar = CronJobRegistrar::new();
        registrar.cancel(JobHandle(uuid::Uuid::new_v4())).await.unwrap();
    }
}
