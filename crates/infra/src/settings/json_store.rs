//! JSON-file implementation of the [`SettingsStore`] port.
//!
//! The whole document is held in memory and rewritten on every mutation.
//! Writes go to a sibling temporary file that is then renamed over the
//! target, so readers never observe a half-written document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use daybrief_core::SettingsStore;
use daybrief_domain::{CalendarEvent, CalendarSelection, DayBriefError, Result};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::document::SettingsDocument;
use crate::errors::InfraError;

pub struct JsonSettingsStore {
    path: PathBuf,
    document: Mutex<SettingsDocument>,
}

impl JsonSettingsStore {
    /// Open the store at `path`, creating an empty document when the file
    /// does not exist yet.
    ///
    /// # Errors
    /// `Storage` when the file exists but cannot be read, `ParseError` when
    /// it is not a valid settings document.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let document = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => SettingsDocument::default(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(InfraError::from)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("settings file missing; starting empty");
                SettingsDocument::default()
            }
            Err(err) => return Err(InfraError::from(err).into()),
        };

        Ok(Self { path, document: Mutex::new(document) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record whether the Google Calendar account is connected.
    pub async fn set_google_calendar_connected(&self, connected: bool) -> Result<()> {
        self.update(|doc| doc.google_calendar_connected = connected).await
    }

    /// Store (or clear) the Google OAuth refresh token.
    pub async fn set_google_calendar_refresh_token(&self, token: Option<String>) -> Result<()> {
        self.update(|doc| doc.google_calendar_refresh_token = token).await
    }

    async fn update(&self, mutate: impl FnOnce(&mut SettingsDocument)) -> Result<()> {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        mutate(&mut next);
        self.persist(&next).await?;
        *document = next;
        Ok(())
    }

    async fn persist(&self, document: &SettingsDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document).map_err(InfraError::from)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(InfraError::from)?;
        }

        let staging = self.staging_path();
        tokio::fs::write(&staging, &bytes).await.map_err(InfraError::from)?;
        if let Err(err) = tokio::fs::rename(&staging, &self.path).await {
            warn!(error = %err, "failed to move settings into place");
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(DayBriefError::Storage(format!(
                "failed to write {}: {}",
                self.path.display(),
                err
            )));
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn get_events(&self) -> Result<Vec<CalendarEvent>> {
        Ok(self.document.lock().await.calendar_events.clone())
    }

    #[instrument(skip(self, events), fields(count = events.len()))]
    async fn set_events(&self, events: &[CalendarEvent]) -> Result<()> {
        let events = events.to_vec();
        self.update(|doc| doc.calendar_events = events).await
    }

    async fn get_calendar_selection(&self) -> Result<CalendarSelection> {
        Ok(self.document.lock().await.calendar_selection.clone())
    }

    async fn set_calendar_selection(&self, selection: CalendarSelection) -> Result<()> {
        self.update(|doc| doc.calendar_selection = selection).await
    }

    async fn google_calendar_connected(&self) -> Result<bool> {
        Ok(self.document.lock().await.google_calendar_connected)
    }

    async fn google_calendar_refresh_token(&self) -> Result<Option<String>> {
        Ok(self.document.lock().await.google_calendar_refresh_token.clone())
    }
}
