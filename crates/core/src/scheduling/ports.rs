//! Port interfaces for sync scheduling
//!
//! The scheduler owns no timers or OS hooks itself; it registers jobs and
//! listens for resume notifications through these traits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveTime;
use daybrief_domain::Result;
use futures::future::BoxFuture;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Work executed each time a recurring job fires.
pub type ScheduledJob = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Identifier of a registered recurring job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle(pub Uuid);

/// Registers recurring jobs at a fixed local wall-clock time.
#[async_trait]
pub trait JobRegistrar: Send + Sync {
    /// Run `job` every day at `at` (local time).
    async fn register_daily(&self, at: NaiveTime, job: ScheduledJob) -> Result<JobHandle>;

    async fn cancel(&self, handle: JobHandle) -> Result<()>;
}

/// Host power transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    Suspended,
    Resumed,
}

/// Subscription to host power transitions.
pub trait PowerSignal: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<PowerEvent>;
}
