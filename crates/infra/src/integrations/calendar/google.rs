//! Google Calendar adapter.
//!
//! Each extraction exchanges the stored refresh token for a short-lived access
//! token, then pages through the primary calendar's events for the requested
//! range. Rate limiting (HTTP 429, or 403 with a rate-limit reason) is retried
//! with capped exponential backoff and jitter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use daybrief_core::{Clock, EventSource, SettingsStore};
use daybrief_domain::constants::CLOUD_MAX_RETRY_ATTEMPTS;
use daybrief_domain::utils::day_window::local_midnight;
use daybrief_domain::{
    CalendarEvent, CalendarImportResult, CloudConfig, DayBriefError, DayWindow, EventDraft,
    EventSourceKind, Result,
};
use rand::Rng;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::errors::InfraError;

const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP_FACTOR: u32 = 32;
const RATE_LIMIT_REASONS: &[&str] = &["rateLimitExceeded", "userRateLimitExceeded"];

/// Event source backed by the Google Calendar REST API.
pub struct CloudApiAdapter {
    http: Client,
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    config: CloudConfig,
    max_attempts: u32,
    backoff_base: Duration,
}

impl CloudApiAdapter {
    pub fn new(store: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>, config: CloudConfig) -> Self {
        Self {
            http: Client::new(),
            store,
            clock,
            config,
            max_attempts: CLOUD_MAX_RETRY_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }

    /// Scale the retry delays (the cap stays at 32x the base).
    #[must_use]
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Fetch every event of the primary calendar between `start` and `end`.
    #[instrument(skip(self))]
    pub async fn fetch_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CalendarImportResult> {
        let access_token = self.refresh_access_token().await?;
        let url = format!("{}/calendars/primary/events", self.config.api_base.trim_end_matches('/'));

        let mut events = Vec::new();
        let mut errors = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("timeMin", start.to_rfc3339()),
                ("timeMax", end.to_rfc3339()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: GoogleEventsResponse = self
                .send_with_retry(|| self.http.get(&url).bearer_auth(&access_token).query(&query))
                .await?;

            debug!(items = page.items.len(), "fetched Google events page");
            for item in page.items {
                match map_event(item) {
                    Ok(Some(event)) => events.push(event),
                    Ok(None) => {}
                    Err(reason) => {
                        warn!(%reason, "skipping Google event");
                        errors.push(reason);
                    }
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!(events = events.len(), skipped = errors.len(), "Google extraction completed");
        Ok(CalendarImportResult::new(events, EventSourceKind::Cloud, self.clock.now_utc(), errors))
    }

    async fn refresh_access_token(&self) -> Result<String> {
        let refresh_token = self
            .store
            .google_calendar_refresh_token()
            .await?
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| DayBriefError::AuthFailed("Google Calendar is not connected".into()))?;

        let (Some(client_id), Some(client_secret)) =
            (self.config.client_id.as_deref(), self.config.client_secret.as_deref())
        else {
            return Err(DayBriefError::AuthFailed("Google OAuth client is not configured".into()));
        };

        let response = self
            .http
            .post(&self.config.token_endpoint)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| DayBriefError::AuthFailed(format!("token refresh request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Google token refresh rejected");
            return Err(DayBriefError::AuthFailed(format!("token refresh failed ({status}): {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DayBriefError::AuthFailed(format!("malformed token response: {e}")))?;
        debug!(expires_in = token.expires_in, "Google access token refreshed");
        Ok(token.access_token)
    }

    async fn send_with_retry<T, F>(&self, build: F) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let response = build().send().await.map_err(InfraError::from)?;
            let status = response.status();

            if status.is_success() {
                return response.json::<T>().await.map_err(|e| InfraError::from(e).into());
            }

            let body = response.text().await.unwrap_or_default();
            if !is_rate_limited(status, &body) {
                return Err(classify_status(status, &body));
            }

            if attempt >= self.max_attempts {
                warn!(attempt, "Google API still rate limited; giving up");
                return Err(DayBriefError::RateLimited(format!(
                    "Google Calendar API rate limit persisted after {attempt} attempts"
                )));
            }

            let delay = backoff_delay(self.backoff_base, attempt - 1);
            warn!(attempt, delay_ms = delay.as_millis() as u64, "Google API rate limited; backing off");
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl EventSource for CloudApiAdapter {
    fn kind(&self) -> EventSourceKind {
        EventSourceKind::Cloud
    }

    async fn extract(&self, _selected: &[String]) -> Result<CalendarImportResult> {
        let window = DayWindow::containing(&self.clock.now());
        self.fetch_range(window.start, window.end).await
    }
}

fn is_rate_limited(status: StatusCode, body: &str) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && RATE_LIMIT_REASONS.iter().any(|reason| body.contains(reason)))
}

fn classify_status(status: StatusCode, body: &str) -> DayBriefError {
    match status {
        StatusCode::UNAUTHORIZED => {
            DayBriefError::AuthFailed(format!("Google rejected the access token: {body}"))
        }
        _ => DayBriefError::ApiError(format!("Google Calendar API error ({status}): {body}")),
    }
}

/// Exponential backoff: `base * 2^attempt`, capped at `32 * base`, with ±25%
/// jitter.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let base_ms = base.as_millis() as u64;
    let delay = base_ms.saturating_mul(2u64.saturating_pow(attempt.min(5)));
    let capped = delay.min(base_ms.saturating_mul(u64::from(BACKOFF_CAP_FACTOR)));

    let jitter_range = (capped as f64 * 0.25) as u64;
    let jitter = rand::thread_rng().gen_range(0..=jitter_range * 2) as i64 - jitter_range as i64;

    Duration::from_millis((capped as i64 + jitter).max(0) as u64)
}

/// Map one API record. `Ok(None)` means the record is intentionally dropped.
fn map_event(item: GoogleCalendarEvent) -> std::result::Result<Option<CalendarEvent>, String> {
    let Some(id) = item.id.filter(|id| !id.is_empty()) else {
        return Ok(None);
    };
    if item.status.as_deref() == Some("cancelled") {
        return Ok(None);
    }

    let start = item.start.ok_or_else(|| format!("event {id} has no start"))?;
    let is_all_day = start.date.is_some();
    let start = start.resolve().map_err(|e| format!("event {id}: {e}"))?;
    let end = match item.end {
        Some(end) => end.resolve().map_err(|e| format!("event {id}: {e}"))?,
        None => start,
    };

    let mut draft = EventDraft::new(start, end).all_day(is_all_day);
    draft.title = item.summary;
    draft.description = item.description;
    draft.location = item.location;
    draft.attendees = item
        .attendees
        .unwrap_or_default()
        .into_iter()
        .filter_map(|attendee| attendee.email.map(|email| email.trim().to_string()))
        .filter(|email| !email.is_empty())
        .collect();

    draft.into_event(EventSourceKind::Cloud).map(Some).map_err(|e| format!("event {id}: {e}"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventsResponse {
    #[serde(default)]
    items: Vec<GoogleCalendarEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleCalendarEvent {
    id: Option<String>,
    status: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
    attendees: Option<Vec<GoogleAttendee>>,
}

#[derive(Debug, Deserialize)]
struct EventDateTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

impl EventDateTime {
    fn resolve(&self) -> std::result::Result<DateTime<Utc>, String> {
        if let Some(date_time) = &self.date_time {
            return DateTime::parse_from_rfc3339(date_time)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("invalid dateTime {date_time:?}: {e}"));
        }
        if let Some(date) = &self.date {
            return NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map(|day| local_midnight(day, &Local))
                .map_err(|e| format!("invalid date {date:?}: {e}"));
        }
        Err("neither dateTime nor date present".into())
    }
}

#[derive(Debug, Deserialize)]
struct GoogleAttendee {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}
