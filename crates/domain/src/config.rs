//! Configuration structures

use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DAILY_SYNC_HOUR, DEFAULT_DAILY_SYNC_MINUTE, DISCOVERY_SCRIPT_TIMEOUT_SECS,
    EXTRACTION_FRESHNESS_SECS, EXTRACTION_SCRIPT_TIMEOUT_SECS, GOOGLE_CALENDAR_API_BASE,
    GOOGLE_TOKEN_ENDPOINT, MAX_IMPORT_FILE_BYTES, MEETING_CACHE_TTL_SECS,
    RESUME_POLL_INTERVAL_SECS,
};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub calendar: CalendarConfig,
    pub scheduler: SchedulerConfig,
    pub cloud: CloudConfig,
    pub storage: StorageConfig,
}

/// Synchronizer, detector and adapter tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub freshness_window_secs: u64,
    pub meeting_cache_ttl_secs: u64,
    pub extraction_timeout_secs: u64,
    pub discovery_timeout_secs: u64,
    pub max_import_file_bytes: u64,
    /// Directory imported calendar files must live under. Defaults to the
    /// working directory.
    pub import_base_dir: Option<String>,
}

impl CalendarConfig {
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    pub fn meeting_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.meeting_cache_ttl_secs)
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: EXTRACTION_FRESHNESS_SECS,
            meeting_cache_ttl_secs: MEETING_CACHE_TTL_SECS,
            extraction_timeout_secs: EXTRACTION_SCRIPT_TIMEOUT_SECS,
            discovery_timeout_secs: DISCOVERY_SCRIPT_TIMEOUT_SECS,
            max_import_file_bytes: MAX_IMPORT_FILE_BYTES,
            import_base_dir: None,
        }
    }
}

/// Daily sync scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Local wall-clock time of the recurring daily sync.
    pub daily_sync_time: NaiveTime,
    /// How often the resume detector compares wall-clock and monotonic time.
    pub resume_poll_interval_secs: u64,
}

impl SchedulerConfig {
    pub fn resume_poll_interval(&self) -> Duration {
        Duration::from_secs(self.resume_poll_interval_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            daily_sync_time: NaiveTime::from_hms_opt(
                DEFAULT_DAILY_SYNC_HOUR,
                DEFAULT_DAILY_SYNC_MINUTE,
                0,
            )
            .unwrap_or(NaiveTime::MIN),
            resume_poll_interval_secs: RESUME_POLL_INTERVAL_SECS,
        }
    }
}

/// Google Calendar endpoints and OAuth client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub api_base: String,
    pub token_endpoint: String,
    pub client_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
            client_id: None,
            client_secret: None,
        }
    }
}

/// Settings persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub settings_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { settings_path: "daybrief-settings.json".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_contracts() {
        let config = Config::default();
        assert_eq!(config.calendar.freshness_window(), Duration::from_secs(120));
        assert_eq!(config.calendar.extraction_timeout(), Duration::from_secs(30));
        assert_eq!(config.calendar.discovery_timeout(), Duration::from_secs(10));
        assert_eq!(config.calendar.max_import_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.scheduler.daily_sync_time, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"calendar": {"freshness_window_secs": 5}}"#).unwrap();
        assert_eq!(config.calendar.freshness_window_secs, 5);
        assert_eq!(config.calendar.meeting_cache_ttl_secs, 30);
        assert_eq!(config.cloud.api_base, GOOGLE_CALENDAR_API_BASE);
    }
}
