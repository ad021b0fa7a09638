//! Native calendar adapter driven through the scripting bridge.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use daybrief_core::{CalendarDiscovery, Clock, EventSource, ScriptRunner};
use daybrief_domain::constants::{SCRIPT_FILE_PREFIX, SCRIPT_FILE_SUFFIX};
use daybrief_domain::utils::day_window::is_local_midnight;
use daybrief_domain::{
    CalendarConfig, CalendarEvent, CalendarImportResult, CalendarMetadata, CalendarType, DayBriefError,
    DiscoveryResult, EventDraft, EventSourceKind, Result,
};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use super::date::parse_bridge_date;
use super::output::{parse_output, FieldDelimiter, RawRecord};
use super::script::{discovery_script, extraction_script};
use crate::errors::InfraError;

/// Event source backed by the desktop calendar application.
///
/// Scripts are staged in a uniquely named temporary file that is removed when
/// the handle drops, on every exit path.
pub struct NativeScriptAdapter {
    runner: Arc<dyn ScriptRunner>,
    clock: Arc<dyn Clock>,
    extraction_timeout: Duration,
    discovery_timeout: Duration,
    supported: bool,
}

impl NativeScriptAdapter {
    pub fn new(runner: Arc<dyn ScriptRunner>, clock: Arc<dyn Clock>, config: &CalendarConfig) -> Self {
        Self {
            runner,
            clock,
            extraction_timeout: config.extraction_timeout(),
            discovery_timeout: config.discovery_timeout(),
            supported: cfg!(target_os = "macos"),
        }
    }

    /// Override host platform detection.
    #[must_use]
    pub fn with_platform_support(mut self, supported: bool) -> Self {
        self.supported = supported;
        self
    }

    fn ensure_supported(&self) -> Result<()> {
        if self.supported {
            Ok(())
        } else {
            Err(DayBriefError::PlatformUnsupported(
                "the native calendar source requires macOS".into(),
            ))
        }
    }

    async fn run_staged(&self, body: &str, timeout: Duration) -> Result<String> {
        let staged = stage_script(body)?;
        debug!(path = %staged.path().display(), "staged calendar script");
        self.runner.run(staged.path(), timeout).await
    }

    fn to_events(&self, records: Vec<RawRecord>) -> Result<Vec<CalendarEvent>> {
        records
            .into_iter()
            .map(|RawRecord([title, start, end, calendar])| {
                let start = parse_bridge_date(&start, &Local)?;
                let end = parse_bridge_date(&end, &Local)?;
                let all_day =
                    is_local_midnight(start, &Local) && end - start == chrono::Duration::hours(24);

                let mut draft = EventDraft::new(start, end).title(title).all_day(all_day);
                if !calendar.is_empty() {
                    draft = draft.calendar(calendar);
                }
                draft.into_event(EventSourceKind::Native)
            })
            .collect()
    }
}

fn stage_script(body: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(SCRIPT_FILE_PREFIX)
        .suffix(SCRIPT_FILE_SUFFIX)
        .tempfile()
        .map_err(InfraError::from)?;
    file.write_all(body.as_bytes()).map_err(InfraError::from)?;
    file.flush().map_err(InfraError::from)?;
    Ok(file)
}

#[async_trait]
impl EventSource for NativeScriptAdapter {
    fn kind(&self) -> EventSourceKind {
        EventSourceKind::Native
    }

    fn is_supported(&self) -> bool {
        self.supported
    }

    #[instrument(skip(self), fields(calendars = selected.len()))]
    async fn extract(&self, selected: &[String]) -> Result<CalendarImportResult> {
        self.ensure_supported()?;

        let today = self.clock.now().date_naive();
        let raw = self.run_staged(&extraction_script(today, selected), self.extraction_timeout).await?;

        let parsed = parse_output(&raw, FieldDelimiter::Pipe);
        let events = self.to_events(parsed.records)?;

        info!(events = events.len(), skipped = parsed.errors.len(), "native extraction parsed");
        Ok(CalendarImportResult::new(events, EventSourceKind::Native, self.clock.now_utc(), parsed.errors))
    }
}

#[async_trait]
impl CalendarDiscovery for NativeScriptAdapter {
    #[instrument(skip(self))]
    async fn discover(&self) -> Result<DiscoveryResult> {
        self.ensure_supported()?;

        let raw = self.run_staged(&discovery_script(), self.discovery_timeout).await?;
        let parsed = parse_output(&raw, FieldDelimiter::Tab);

        let mut result = DiscoveryResult { calendars: Vec::new(), errors: parsed.errors };
        for RawRecord([name, writable, color, kind]) in parsed.records {
            if name.is_empty() {
                result.errors.push("Calendar entry without a name skipped".into());
                continue;
            }
            let Some(color) = parse_color(&color) else {
                warn!(calendar = %name, color = %color, "unparsable calendar color");
                result.errors.push(format!("Calendar {name:?} has an unparsable color {color:?}"));
                continue;
            };

            result.calendars.push(CalendarMetadata {
                id: name.clone(),
                name,
                visible: writable.eq_ignore_ascii_case("true"),
                color,
                calendar_type: CalendarType::from_bridge(&kind),
            });
        }

        debug!(calendars = result.calendars.len(), skipped = result.errors.len(), "discovery parsed");
        Ok(result)
    }
}

/// Convert a bridge `r/g/b` triple (16-bit channels) into `#RRGGBB`.
fn parse_color(raw: &str) -> Option<String> {
    let channels: Vec<u32> = raw
        .split('/')
        .map(|part| part.trim().parse::<u32>().ok().filter(|value| *value <= u32::from(u16::MAX)))
        .collect::<Option<_>>()?;

    match channels.as_slice() {
        [r, g, b] => Some(format!("#{:02X}{:02X}{:02X}", r >> 8, g >> 8, b >> 8)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use chrono::{Datelike, TimeZone, Timelike};
    use daybrief_core::FixedClock;
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingRunner {
        output: String,
        failure: Option<DayBriefError>,
        seen: Mutex<Vec<(PathBuf, String, Duration)>>,
    }

    #[async_trait]
    impl ScriptRunner for RecordingRunner {
        async fn run(&self, script: &Path, timeout: Duration) -> Result<String> {
            let body = std::fs::read_to_string(script).unwrap();
            self.seen.lock().push((script.to_path_buf(), body, timeout));
            match &self.failure {
                Some(err) => Err(err.clone()),
                None => Ok(self.output.clone()),
            }
        }
    }

    fn adapter(runner: Arc<RecordingRunner>) -> NativeScriptAdapter {
        let clock = Local.with_ymd_and_hms(2026, 1, 6, 8, 0, 0).single().unwrap();
        NativeScriptAdapter::new(runner, Arc::new(FixedClock::new(clock)), &CalendarConfig::default())
            .with_platform_support(true)
    }

    fn runner(output: &str) -> Arc<RecordingRunner> {
        Arc::new(RecordingRunner { output: output.into(), ..Default::default() })
    }

    #[tokio::test]
    async fn extracts_events_and_removes_the_staged_script() {
        let runner = runner(
            "Standup|Tuesday, 6 January 2026 at 09.30.00|Tuesday, 6 January 2026 at 09.45.00|Work, \
             Broken|record",
        );
        let result = adapter(runner.clone()).extract(&["Work".into()]).await.unwrap();

        assert_eq!(result.total_count, 1);
        let event = &result.events[0];
        assert_eq!(event.title, "Standup");
        assert_eq!(event.calendar_name.as_deref(), Some("Work"));
        let start = event.start_date.with_timezone(&Local);
        assert_eq!((start.year(), start.month(), start.day(), start.hour()), (2026, 1, 6, 9));
        assert_eq!(result.errors.as_ref().map(Vec::len), Some(1));

        let seen = runner.seen.lock();
        let (path, body, timeout) = &seen[0];
        assert!(!path.exists());
        let file_name = path.file_name().unwrap().to_string_lossy();
        assert!(file_name.starts_with(SCRIPT_FILE_PREFIX));
        assert!(file_name.ends_with(SCRIPT_FILE_SUFFIX));
        assert!(body.contains(r#"set wanted to {"Work"}"#));
        assert_eq!(*timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn unparsable_date_fails_the_extraction() {
        let runner = runner("Standup|someday|Tuesday, 6 January 2026 at 09.45.00|Work");
        let err = adapter(runner).extract(&[]).await.unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[tokio::test]
    async fn runner_failure_still_removes_the_staged_script() {
        let runner = Arc::new(RecordingRunner {
            failure: Some(DayBriefError::Timeout("calendar script exceeded 30s".into())),
            ..Default::default()
        });
        let err = adapter(runner.clone()).extract(&[]).await.unwrap_err();

        assert_eq!(err.code(), "TIMEOUT");
        assert!(!runner.seen.lock()[0].0.exists());
    }

    #[tokio::test]
    async fn unsupported_platform_stages_nothing() {
        let runner = runner("");
        let adapter = adapter(runner.clone()).with_platform_support(false);

        assert!(!adapter.is_supported());
        assert_eq!(adapter.extract(&[]).await.unwrap_err().code(), "PLATFORM_UNSUPPORTED");
        assert_eq!(adapter.discover().await.unwrap_err().code(), "PLATFORM_UNSUPPORTED");
        assert!(runner.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn discovery_maps_calendars_and_itemizes_bad_entries() {
        let runner = runner(
            "Work\ttrue\t65535/0/0\tlocal, Holidays\tfalse\t0/32896/65535\tSubscribed, \
             Broken\ttrue\tred\tlocal",
        );
        let result = adapter(runner.clone()).discover().await.unwrap();

        assert_eq!(result.calendars.len(), 2);
        let work = &result.calendars[0];
        assert_eq!((work.id.as_str(), work.name.as_str()), ("Work", "Work"));
        assert!(work.visible);
        assert_eq!(work.color, "#FF0000");
        assert_eq!(work.calendar_type, CalendarType::Local);
        let holidays = &result.calendars[1];
        assert!(!holidays.visible);
        assert_eq!(holidays.color, "#0080FF");
        assert_eq!(holidays.calendar_type, CalendarType::Subscribed);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(runner.seen.lock()[0].2, Duration::from_secs(10));
    }

    #[test]
    fn color_requires_three_sixteen_bit_channels() {
        assert_eq!(parse_color("65535/65535/65535").as_deref(), Some("#FFFFFF"));
        assert_eq!(parse_color("1/2"), None);
        assert_eq!(parse_color("70000/0/0"), None);
    }
}
