//! Configuration loader
//!
//! Loads engine configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `DAYBRIEF_SETTINGS_PATH` is unset, falls back to a config file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. Without any config file, built-in defaults apply
//!
//! ## Environment Variables
//! - `DAYBRIEF_SETTINGS_PATH`: Settings store file (required for env loading)
//! - `DAYBRIEF_DAILY_SYNC_TIME`: Local daily sync time, `HH:MM`
//! - `DAYBRIEF_FRESHNESS_SECS`: Extraction freshness window in seconds
//! - `DAYBRIEF_MEETING_CACHE_TTL_SECS`: Meeting detector cache TTL
//! - `DAYBRIEF_EXTRACTION_TIMEOUT_SECS`: Native extraction script timeout
//! - `DAYBRIEF_DISCOVERY_TIMEOUT_SECS`: Native discovery script timeout
//! - `DAYBRIEF_MAX_IMPORT_BYTES`: Maximum `.ics` file size
//! - `DAYBRIEF_IMPORT_DIR`: Directory imported calendar files must live under
//! - `DAYBRIEF_RESUME_POLL_SECS`: Resume detector poll interval
//! - `DAYBRIEF_GOOGLE_API_BASE`: Google Calendar API base URL
//! - `DAYBRIEF_GOOGLE_TOKEN_ENDPOINT`: OAuth token endpoint
//! - `DAYBRIEF_GOOGLE_CLIENT_ID` / `DAYBRIEF_GOOGLE_CLIENT_SECRET`: OAuth
//!   client credentials
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./daybrief.json` or `./daybrief.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveTime;
use daybrief_domain::{Config, DayBriefError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["daybrief.json", "daybrief.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// Environment first, then the first config file found, then defaults.
///
/// # Errors
/// Returns `DayBriefError::Config` if an environment variable or a config
/// file that is present holds an invalid value.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            return Ok(config);
        }
        Err(e) => tracing::debug!(error = ?e, "Failed to load from environment, trying file"),
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `DAYBRIEF_SETTINGS_PATH` must be present; every other variable is optional
/// and overrides the corresponding default.
///
/// # Errors
/// Returns `DayBriefError::Config` if the settings path is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    config.storage.settings_path = env_var("DAYBRIEF_SETTINGS_PATH")?;

    if let Some(raw) = optional_env("DAYBRIEF_DAILY_SYNC_TIME") {
        config.scheduler.daily_sync_time = parse_sync_time(&raw)?;
    }
    if let Some(secs) = env_parse("DAYBRIEF_RESUME_POLL_SECS")? {
        config.scheduler.resume_poll_interval_secs = secs;
    }

    if let Some(secs) = env_parse("DAYBRIEF_FRESHNESS_SECS")? {
        config.calendar.freshness_window_secs = secs;
    }
    if let Some(secs) = env_parse("DAYBRIEF_MEETING_CACHE_TTL_SECS")? {
        config.calendar.meeting_cache_ttl_secs = secs;
    }
    if let Some(secs) = env_parse("DAYBRIEF_EXTRACTION_TIMEOUT_SECS")? {
        config.calendar.extraction_timeout_secs = secs;
    }
    if let Some(secs) = env_parse("DAYBRIEF_DISCOVERY_TIMEOUT_SECS")? {
        config.calendar.discovery_timeout_secs = secs;
    }
    if let Some(bytes) = env_parse("DAYBRIEF_MAX_IMPORT_BYTES")? {
        config.calendar.max_import_file_bytes = bytes;
    }
    config.calendar.import_base_dir = optional_env("DAYBRIEF_IMPORT_DIR");

    if let Some(base) = optional_env("DAYBRIEF_GOOGLE_API_BASE") {
        config.cloud.api_base = base;
    }
    if let Some(endpoint) = optional_env("DAYBRIEF_GOOGLE_TOKEN_ENDPOINT") {
        config.cloud.token_endpoint = endpoint;
    }
    config.cloud.client_id = optional_env("DAYBRIEF_GOOGLE_CLIENT_ID");
    config.cloud.client_secret = optional_env("DAYBRIEF_GOOGLE_CLIENT_SECRET");

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `DayBriefError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DayBriefError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DayBriefError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DayBriefError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format detected by extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DayBriefError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DayBriefError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(DayBriefError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the working directory, then the executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn parse_sync_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| DayBriefError::Config(format!("Invalid daily sync time '{}': {}", raw, e)))
}

/// Get required environment variable
///
/// # Errors
/// Returns `DayBriefError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        DayBriefError::Config(format!("Missing required environment variable: {}", key))
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| DayBriefError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}
