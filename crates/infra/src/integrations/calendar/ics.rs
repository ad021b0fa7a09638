//! Calendar file (`.ics`) import.
//!
//! ## Validation order
//! 1. No `..` component and no absolute path outside the base directory
//! 2. `.ics` extension (case-insensitive)
//! 3. File exists
//! 4. Size within the configured limit
//!
//! Every validation failure is `INVALID_FILE`. Only events starting inside
//! today's local window are kept.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use daybrief_core::Clock;
use daybrief_domain::constants::CALENDAR_FILE_EXTENSION;
use daybrief_domain::utils::day_window::{is_local_midnight, local_midnight};
use daybrief_domain::{
    CalendarConfig, CalendarEvent, CalendarImportResult, DayBriefError, DayWindow, EventDraft,
    EventSourceKind, Result,
};
use icalendar::parser::{read_calendar, unfold, Component as IcsComponent, Property};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use tracing::{debug, info, instrument, warn};

use crate::errors::InfraError;

/// Imports today's events from a user-supplied calendar file.
pub struct FileImportAdapter {
    clock: Arc<dyn Clock>,
    base_dir: PathBuf,
    max_file_bytes: u64,
}

impl FileImportAdapter {
    /// Create an adapter resolving relative paths against the configured
    /// import directory, or the current working directory.
    pub fn new(clock: Arc<dyn Clock>, config: &CalendarConfig) -> Result<Self> {
        let base_dir = match &config.import_base_dir {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir().map_err(InfraError::from)?,
        };
        Ok(Self { clock, base_dir, max_file_bytes: config.max_import_file_bytes })
    }

    /// Resolve and confine paths to `base_dir` instead of the working
    /// directory.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Validate, read and parse `path`.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn import_file(&self, path: &Path) -> Result<CalendarImportResult> {
        let resolved = self.validate_path(path)?;

        let metadata = tokio::fs::metadata(&resolved).await.map_err(|_| {
            DayBriefError::InvalidFile(format!("file not found: {}", path.display()))
        })?;
        if !metadata.is_file() {
            return Err(DayBriefError::InvalidFile(format!("not a file: {}", path.display())));
        }
        if metadata.len() > self.max_file_bytes {
            return Err(DayBriefError::InvalidFile(format!(
                "file is {} bytes; the limit is {} bytes",
                metadata.len(),
                self.max_file_bytes
            )));
        }

        let content = tokio::fs::read_to_string(&resolved).await.map_err(|e| {
            DayBriefError::InvalidFile(format!("unreadable calendar file: {e}"))
        })?;

        let window = DayWindow::containing(&self.clock.now());
        let (events, errors) = parse_calendar(&content, window, &Local)?;

        info!(events = events.len(), skipped = errors.len(), "calendar file imported");
        Ok(CalendarImportResult::new(events, EventSourceKind::File, self.clock.now_utc(), errors))
    }

    fn validate_path(&self, path: &Path) -> Result<PathBuf> {
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            warn!("rejected calendar file path with parent components");
            return Err(DayBriefError::InvalidFile(format!(
                "path traversal is not allowed: {}",
                path.display()
            )));
        }

        let resolved = if path.is_absolute() { path.to_path_buf() } else { self.base_dir.join(path) };
        if !resolved.starts_with(&self.base_dir) {
            warn!("rejected calendar file outside the base directory");
            return Err(DayBriefError::InvalidFile(format!(
                "path traversal outside {} is not allowed: {}",
                self.base_dir.display(),
                path.display()
            )));
        }

        let has_calendar_extension = resolved
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(CALENDAR_FILE_EXTENSION));
        if !has_calendar_extension {
            return Err(DayBriefError::InvalidFile(format!(
                "expected a .{CALENDAR_FILE_EXTENSION} file: {}",
                path.display()
            )));
        }

        Ok(resolved)
    }
}

/// Parse `content` and keep the events starting inside `window`.
///
/// Returns the kept events plus diagnostics for skipped components.
///
/// # Errors
/// `ParseError` if the content is not an iCalendar document at all.
pub fn parse_calendar<Tz: TimeZone>(
    content: &str,
    window: DayWindow,
    tz: &Tz,
) -> Result<(Vec<CalendarEvent>, Vec<String>)> {
    let header = content.trim_start_matches('\u{feff}').trim_start();
    if !header.get(..15).is_some_and(|h| h.eq_ignore_ascii_case("BEGIN:VCALENDAR")) {
        return Err(DayBriefError::ParseError("not a calendar file: missing BEGIN:VCALENDAR".into()));
    }

    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded)
        .map_err(|e| DayBriefError::ParseError(format!("not a valid calendar file: {e}")))?;

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    let mut events = Vec::new();
    let mut errors = Vec::new();
    for (index, vevent) in vevents.into_iter().enumerate() {
        match to_event(vevent, tz) {
            Ok(event) if window.contains(event.start_date) => events.push(event),
            Ok(_) => {}
            Err(reason) => {
                debug!(index, %reason, "skipping calendar file event");
                errors.push(format!("Event {}: {reason}", index + 1));
            }
        }
    }

    events.sort_by_key(|event| event.start_date);
    Ok((events, errors))
}

fn collect_vevents<'a, 'c>(components: &'c [IcsComponent<'a>], out: &mut Vec<&'c IcsComponent<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            out.push(component);
        } else {
            collect_vevents(&component.components, out);
        }
    }
}

fn to_event<Tz: TimeZone>(vevent: &IcsComponent<'_>, tz: &Tz) -> std::result::Result<CalendarEvent, String> {
    let dtstart = vevent.find_prop("DTSTART").ok_or("missing DTSTART")?;
    let (start, start_is_date) = resolve(
        DatePerhapsTime::try_from(dtstart).map_err(|_| "unparsable DTSTART".to_string())?,
        tz,
    );

    let end = match vevent.find_prop("DTEND") {
        Some(prop) => {
            resolve(
                DatePerhapsTime::try_from(prop).map_err(|_| "unparsable DTEND".to_string())?,
                tz,
            )
            .0
        }
        None if start_is_date => start + chrono::Duration::days(1),
        None => start,
    };

    let is_all_day = start_is_date
        || (end - start == chrono::Duration::hours(24) && is_local_midnight(start, tz));

    let mut draft = EventDraft::new(start, end).all_day(is_all_day);
    draft.title = text(vevent, "SUMMARY");
    draft.description = text(vevent, "DESCRIPTION");
    draft.location = text(vevent, "LOCATION");
    draft.attendees = vevent
        .properties
        .iter()
        .filter(|p| p.name == "ATTENDEE")
        .filter_map(attendee)
        .collect();

    draft.into_event(EventSourceKind::File).map_err(|e| e.to_string())
}

/// Resolve an iCalendar date or date-time to a UTC instant, flagging bare
/// dates.
fn resolve<Tz: TimeZone>(value: DatePerhapsTime, tz: &Tz) -> (DateTime<Utc>, bool) {
    match value {
        DatePerhapsTime::Date(date) => (local_midnight(date, tz), true),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => (dt, false),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => (in_zone(naive, tz), false),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            match tzid.parse::<chrono_tz::Tz>() {
                Ok(zone) => (in_zone(date_time, &zone), false),
                Err(_) => {
                    warn!(%tzid, "unknown TZID; interpreting in local time");
                    (in_zone(date_time, tz), false)
                }
            }
        }
    }
}

fn in_zone<Tz: TimeZone>(naive: chrono::NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Inside a DST gap: shift forward by the gap's usual width.
        None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .map_or_else(|| local_midnight(naive.date(), tz), |local| local.with_timezone(&Utc)),
    }
}

fn text(vevent: &IcsComponent<'_>, name: &str) -> Option<String> {
    vevent
        .find_prop(name)
        .map(|p| unescape(p.val.as_ref()))
        .filter(|value| !value.trim().is_empty())
}

fn attendee(prop: &Property<'_>) -> Option<String> {
    let raw = prop.val.as_ref().trim();
    let address = match raw.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("mailto:") => &raw[7..],
        _ => raw,
    };
    (!address.is_empty()).then(|| address.to_string())
}

/// Undo RFC 5545 TEXT escaping.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate};

    use super::*;

    fn window() -> DayWindow {
        DayWindow::for_date(NaiveDate::from_ymd_opt(2026, 1, 6).unwrap(), &Utc)
    }

    fn wrap(body: &str) -> String {
        format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\n{body}END:VCALENDAR\r\n")
    }

    #[test]
    fn keeps_only_events_starting_today() {
        let content = wrap(
            "BEGIN:VEVENT\r\nUID:1\r\nSUMMARY:Review\r\nDTSTART:20260106T140000Z\r\nDTEND:20260106T150000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:2\r\nSUMMARY:Tomorrow\r\nDTSTART:20260107T090000Z\r\nDTEND:20260107T100000Z\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:3\r\nSUMMARY:Standup\r\nDTSTART:20260106T090000Z\r\nDTEND:20260106T091500Z\r\nEND:VEVENT\r\n",
        );
        let (events, errors) = parse_calendar(&content, window(), &Utc).unwrap();

        let titles: Vec<_> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Standup", "Review"]);
        assert!(errors.is_empty());
        assert!(events.iter().all(|e| e.source == EventSourceKind::File));
    }

    #[test]
    fn bare_date_is_all_day_and_missing_end_spans_the_day() {
        let content =
            wrap("BEGIN:VEVENT\r\nUID:1\r\nSUMMARY:Holiday\r\nDTSTART;VALUE=DATE:20260106\r\nEND:VEVENT\r\n");
        let (events, _) = parse_calendar(&content, window(), &Utc).unwrap();

        assert!(events[0].is_all_day);
        assert_eq!(events[0].duration(), chrono::Duration::days(1));
    }

    #[test]
    fn midnight_to_midnight_is_all_day() {
        let content = wrap(
            "BEGIN:VEVENT\r\nUID:1\r\nDTSTART:20260106T000000Z\r\nDTEND:20260107T000000Z\r\nEND:VEVENT\r\n",
        );
        let (events, _) = parse_calendar(&content, window(), &Utc).unwrap();

        assert!(events[0].is_all_day);
        assert_eq!(events[0].title, "Untitled Event");
    }

    #[test]
    fn missing_start_is_reported_and_skipped() {
        let content = wrap(
            "BEGIN:VEVENT\r\nUID:1\r\nSUMMARY:No start\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:2\r\nSUMMARY:Ok\r\nDTSTART:20260106T100000Z\r\nEND:VEVENT\r\n",
        );
        let (events, errors) = parse_calendar(&content, window(), &Utc).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start_date, events[0].end_date);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("DTSTART"));
    }

    #[test]
    fn attendees_lose_mailto_and_text_is_unescaped() {
        let content = wrap(
            "BEGIN:VEVENT\r\nUID:1\r\nSUMMARY:Plan\\, then ship\r\nDTSTART:20260106T100000Z\r\n\
             ATTENDEE;CN=Ana:mailto:ana@example.com\r\nATTENDEE:MAILTO:bo@example.com\r\nEND:VEVENT\r\n",
        );
        let (events, _) = parse_calendar(&content, window(), &Utc).unwrap();

        assert_eq!(events[0].title, "Plan, then ship");
        assert_eq!(events[0].attendees, ["ana@example.com", "bo@example.com"]);
    }

    #[test]
    fn tzid_times_are_converted() {
        let content = wrap(
            "BEGIN:VEVENT\r\nUID:1\r\nDTSTART;TZID=Europe/Berlin:20260106T100000\r\n\
             DTEND;TZID=Europe/Berlin:20260106T110000\r\nEND:VEVENT\r\n",
        );
        let (events, _) = parse_calendar(&content, window(), &Utc).unwrap();

        assert_eq!(events[0].start_date, Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap());
    }

    #[test]
    fn floating_times_use_the_supplied_zone() {
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        let content =
            wrap("BEGIN:VEVENT\r\nUID:1\r\nDTSTART:20260106T100000\r\nEND:VEVENT\r\n");
        let (events, _) = parse_calendar(&content, window(), &zone).unwrap();

        assert_eq!(events[0].start_date, Utc.with_ymd_and_hms(2026, 1, 6, 8, 0, 0).unwrap());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_calendar("this is not a calendar", window(), &Utc).unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }
}
