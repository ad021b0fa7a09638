//! In-memory [`SettingsStore`] for embedding and tests.

use async_trait::async_trait;
use daybrief_core::SettingsStore;
use daybrief_domain::{CalendarEvent, CalendarSelection, Result};
use parking_lot::RwLock;

use super::document::SettingsDocument;

#[derive(Default)]
pub struct MemorySettingsStore {
    document: RwLock<SettingsDocument>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_google_calendar_connected(&self, connected: bool) {
        self.document.write().google_calendar_connected = connected;
    }

    pub fn set_google_calendar_refresh_token(&self, token: Option<String>) {
        self.document.write().google_calendar_refresh_token = token;
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get_events(&self) -> Result<Vec<CalendarEvent>> {
        Ok(self.document.read().calendar_events.clone())
    }

    async fn set_events(&self, events: &[CalendarEvent]) -> Result<()> {
        self.document.write().calendar_events = events.to_vec();
        Ok(())
    }

    async fn get_calendar_selection(&self) -> Result<CalendarSelection> {
        Ok(self.document.read().calendar_selection.clone())
    }

    async fn set_calendar_selection(&self, selection: CalendarSelection) -> Result<()> {
        self.document.write().calendar_selection = selection;
        Ok(())
    }

    async fn google_calendar_connected(&self) -> Result<bool> {
        Ok(self.document.read().google_calendar_connected)
    }

    async fn google_calendar_refresh_token(&self) -> Result<Option<String>> {
        Ok(self.document.read().google_calendar_refresh_token.clone())
    }
}
