//! Error types used throughout the calendar engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for DayBrief
///
/// Payloads are plain strings so the error stays `Clone` (shared extraction
/// futures hand the same outcome to every waiter) and serializable across the
/// UI boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DayBriefError {
    /// The native calendar source is not available on this operating system.
    #[error("Platform unsupported: {0}")]
    PlatformUnsupported(String),

    /// The user has not granted calendar access.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// An external call exceeded its time budget.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Adapter output (or a date inside a well-formed record) could not be
    /// parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// File import validation failed (extension, existence, size, or path
    /// traversal).
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DayBriefError {
    /// Stable machine-readable code for this error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PlatformUnsupported(_) => "PLATFORM_UNSUPPORTED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::Timeout(_) => "TIMEOUT",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::InvalidFile(_) => "INVALID_FILE",
            Self::AuthFailed(_) => "AUTH_FAILED",
            Self::ApiError(_) => "API_ERROR",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The human-readable payload without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::PlatformUnsupported(msg)
            | Self::PermissionDenied(msg)
            | Self::Timeout(msg)
            | Self::ParseError(msg)
            | Self::InvalidFile(msg)
            | Self::AuthFailed(msg)
            | Self::ApiError(msg)
            | Self::RateLimited(msg)
            | Self::Config(msg)
            | Self::Storage(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias for DayBrief operations
pub type Result<T> = std::result::Result<T, DayBriefError>;
