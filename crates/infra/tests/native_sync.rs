//! Synchronizer coalescing over the native adapter and a counting runner.

mod support;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use daybrief_core::{CalendarSynchronizer, ScriptRunner};
use daybrief_domain::{CalendarConfig, Result};
use daybrief_infra::{MemorySettingsStore, NativeScriptAdapter};
use futures::future::join_all;

use support::fixed_clock;

const BRIDGE_OUTPUT: &str = "Standup|Tuesday, 6 January 2026 at 09.30.00|Tuesday, 6 January 2026 at 09.45.00|Work";

#[derive(Default)]
struct CountingRunner {
    runs: AtomicUsize,
}

#[async_trait]
impl ScriptRunner for CountingRunner {
    async fn run(&self, _script: &Path, _timeout: Duration) -> Result<String> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(BRIDGE_OUTPUT.to_string())
    }
}

#[tokio::test]
async fn concurrent_extracts_run_the_script_once() {
    let clock = fixed_clock();
    let config = CalendarConfig::default();
    let runner = Arc::new(CountingRunner::default());
    let adapter = NativeScriptAdapter::new(runner.clone(), clock.clone(), &config)
        .with_platform_support(true);

    let synchronizer = CalendarSynchronizer::new(
        Arc::new(adapter),
        None,
        Arc::new(MemorySettingsStore::new()),
        clock,
        &config,
    );

    let results = join_all((0..8).map(|_| synchronizer.extract(None))).await;

    assert_eq!(runner.runs.load(Ordering::SeqCst), 1);
    let first = results[0].as_ref().unwrap();
    assert_eq!(first.total_count, 1);
    assert_eq!(first.events[0].title, "Standup");
    for result in &results {
        assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
    }

    synchronizer.extract(None).await.unwrap();
    assert_eq!(runner.runs.load(Ordering::SeqCst), 1);
}
