//! Host power signal.
//!
//! Wall-clock timers do not fire while the host is asleep. The
//! [`ClockJumpPowerSignal`] detects a sleep after the fact: it ticks on a
//! monotonic interval and compares how far the wall clock moved against how far
//! the monotonic clock moved. Monotonic time does not advance while suspended,
//! so a wall-clock lead larger than one poll interval means the host slept and
//! has just resumed.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use daybrief_core::{PowerEvent, PowerSignal};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 16;
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Resume detector based on wall-clock jumps, plus manual notification.
pub struct ClockJumpPowerSignal {
    sender: broadcast::Sender<PowerEvent>,
    poll_interval: Duration,
    cancellation: CancellationToken,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl ClockJumpPowerSignal {
    pub fn new(poll_interval: Duration) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            poll_interval,
            cancellation: CancellationToken::new(),
            monitor: Mutex::new(None),
        }
    }

    /// Spawn the monitoring task. Calling it again while running is a no-op.
    pub fn start(&self) {
        let mut monitor = self.monitor.lock();
        if monitor.is_some() {
            return;
        }

        let sender = self.sender.clone();
        let cancel = self.cancellation.clone();
        let interval = self.poll_interval;

        *monitor = Some(tokio::spawn(async move {
            Self::monitor_task(sender, cancel, interval).await;
        }));
        debug!(poll_secs = interval.as_secs(), "power monitor started");
    }

    /// Stop the monitoring task and wait for it to exit.
    pub async fn shutdown(&self) {
        self.cancellation.cancel();
        let handle = self.monitor.lock().take();
        if let Some(handle) = handle {
            if tokio::time::timeout(JOIN_TIMEOUT, handle).await.is_err() {
                warn!("power monitor did not exit in time");
            }
        }
    }

    /// Broadcast a resume observed by the host integration (for example an OS
    /// wake notification).
    pub fn notify_resumed(&self) {
        info!("host resume reported");
        let _ = self.sender.send(PowerEvent::Resumed);
    }

    async fn monitor_task(
        sender: broadcast::Sender<PowerEvent>,
        cancel: CancellationToken,
        interval: Duration,
    ) {
        let mut last_wall = Utc::now();
        let mut last_mono = Instant::now();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("power monitor cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let (wall, mono) = (Utc::now(), Instant::now());
                    if slept_between(last_wall, wall, mono.duration_since(last_mono), interval) {
                        info!(%last_wall, %wall, "wall clock jumped; host resumed");
                        let _ = sender.send(PowerEvent::Resumed);
                    }
                    last_wall = wall;
                    last_mono = mono;
                }
            }
        }
    }
}

impl PowerSignal for ClockJumpPowerSignal {
    fn subscribe(&self) -> broadcast::Receiver<PowerEvent> {
        self.sender.subscribe()
    }
}

impl Drop for ClockJumpPowerSignal {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

/// Whether the wall clock advanced more than `threshold` beyond the
/// monotonic clock between two samples.
fn slept_between(
    previous_wall: DateTime<Utc>,
    wall: DateTime<Utc>,
    mono_elapsed: Duration,
    threshold: Duration,
) -> bool {
    let Ok(wall_elapsed) = (wall - previous_wall).to_std() else {
        return false;
    };
    wall_elapsed.saturating_sub(mono_elapsed) > threshold
}
