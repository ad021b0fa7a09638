//! Canonical calendar event model shared by every source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::UNTITLED_EVENT;
use crate::errors::{DayBriefError, Result};
use crate::impl_domain_tag_conversions;

/// Where an event was acquired from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSourceKind {
    /// Locally scriptable desktop calendar application
    Native,
    /// User-supplied calendar file
    File,
    /// OAuth-backed remote calendar API
    Cloud,
}

impl_domain_tag_conversions!(EventSourceKind {
    Native => "native",
    File => "file",
    Cloud => "cloud",
});

/// Normalized calendar event.
///
/// Value object: adapters build a fresh one per extraction and the stored set
/// is only ever replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<String>,
    pub attendees: Vec<String>,
    pub is_all_day: bool,
    pub source: EventSourceKind,
    pub calendar_name: Option<String>,
}

impl CalendarEvent {
    /// Whether the event interval touches `[window_start, window_end)`.
    ///
    /// Zero-length events count when their instant lies inside the window.
    #[must_use]
    pub fn overlaps(&self, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> bool {
        if self.start_date == self.end_date {
            return self.start_date >= window_start && self.start_date < window_end;
        }
        self.start_date < window_end && self.end_date > window_start
    }

    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.end_date - self.start_date
    }
}

/// Adapter-side builder for [`CalendarEvent`].
///
/// Holds the source-specific fields; [`EventDraft::into_event`] assigns the
/// opaque id and enforces `start <= end`.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub attendees: Vec<String>,
    pub is_all_day: bool,
    pub calendar_name: Option<String>,
}

impl EventDraft {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start: Some(start), end: Some(end), ..Self::default() }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn calendar(mut self, name: impl Into<String>) -> Self {
        self.calendar_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn all_day(mut self, is_all_day: bool) -> Self {
        self.is_all_day = is_all_day;
        self
    }

    /// Finalize into a canonical event tagged with `source`.
    ///
    /// # Errors
    /// `ParseError` when the start or end is missing or `end < start`.
    pub fn into_event(self, source: EventSourceKind) -> Result<CalendarEvent> {
        let start = self
            .start
            .ok_or_else(|| DayBriefError::ParseError("event is missing a start date".into()))?;
        let end = self.end.unwrap_or(start);
        if end < start {
            return Err(DayBriefError::ParseError(format!(
                "event ends before it starts ({end} < {start})"
            )));
        }

        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED_EVENT.to_string());

        Ok(CalendarEvent {
            id: Uuid::new_v4().to_string(),
            title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            start_date: start,
            end_date: end,
            location: self.location.filter(|l| !l.trim().is_empty()),
            attendees: self.attendees,
            is_all_day: self.is_all_day,
            source,
            calendar_name: self.calendar_name.filter(|c| !c.trim().is_empty()),
        })
    }
}

/// Outcome of one adapter extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarImportResult {
    pub events: Vec<CalendarEvent>,
    pub total_count: usize,
    pub imported_at: DateTime<Utc>,
    pub source: EventSourceKind,
    /// Per-record diagnostics for records that were skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl CalendarImportResult {
    /// Build a result, keeping `errors` absent when nothing was skipped.
    pub fn new(
        events: Vec<CalendarEvent>,
        source: EventSourceKind,
        imported_at: DateTime<Utc>,
        errors: Vec<String>,
    ) -> Self {
        Self {
            total_count: events.len(),
            events,
            imported_at,
            source,
            errors: if errors.is_empty() { None } else { Some(errors) },
        }
    }
}
