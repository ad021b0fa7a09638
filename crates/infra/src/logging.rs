//! Tracing subscriber setup for hosts embedding the engine.
//!
//! The filter is read from `DAYBRIEF_LOG`, then `RUST_LOG`, defaulting to
//! `info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Build the env filter from `DAYBRIEF_LOG` / `RUST_LOG`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("DAYBRIEF_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// Returns `false` when a global subscriber was already installed, which
/// happens when the host set up its own.
pub fn init_tracing(format: LogFormat) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter());

    let installed = match format {
        LogFormat::Json => {
            registry.with(fmt::layer().json().with_target(true).with_thread_ids(false)).try_init()
        }
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    installed.is_ok()
}
