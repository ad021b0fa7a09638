//! Engine constants
//!
//! Centralized defaults used when no configuration overrides them.

// Synchronizer
pub const EXTRACTION_FRESHNESS_SECS: u64 = 120;

// Meeting detector
pub const MEETING_CACHE_TTL_SECS: u64 = 30;

// Native scripting bridge
pub const EXTRACTION_SCRIPT_TIMEOUT_SECS: u64 = 30;
pub const DISCOVERY_SCRIPT_TIMEOUT_SECS: u64 = 10;
pub const SCRIPT_FILE_PREFIX: &str = "daybrief-";
pub const SCRIPT_FILE_SUFFIX: &str = ".applescript";

// File import
pub const MAX_IMPORT_FILE_BYTES: u64 = 10 * 1024 * 1024;
pub const CALENDAR_FILE_EXTENSION: &str = "ics";

// Canonical defaults
pub const UNTITLED_EVENT: &str = "Untitled Event";

// Scheduler
pub const DEFAULT_DAILY_SYNC_HOUR: u32 = 7;
pub const DEFAULT_DAILY_SYNC_MINUTE: u32 = 0;
pub const RESUME_POLL_INTERVAL_SECS: u64 = 30;

// Manual sync outcomes surfaced to the UI
pub const SYNC_ALREADY_IN_PROGRESS: &str = "Sync already in progress";
pub const NO_CALENDARS_CONNECTED: &str = "No calendars connected";

// Cloud API
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const CLOUD_MAX_RETRY_ATTEMPTS: u32 = 5;
