//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use daybrief_domain::DayBriefError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DayBriefError);

impl From<InfraError> for DayBriefError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DayBriefError> for InfraError {
    fn from(value: DayBriefError) -> Self {
        InfraError(value)
    }
}

trait IntoDayBriefError {
    fn into_daybrief(self) -> DayBriefError;
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → DayBriefError */
/* -------------------------------------------------------------------------- */

impl IntoDayBriefError for IoError {
    fn into_daybrief(self) -> DayBriefError {
        match self.kind() {
            ErrorKind::PermissionDenied => {
                DayBriefError::PermissionDenied(format!("filesystem access denied: {self}"))
            }
            ErrorKind::TimedOut => DayBriefError::Timeout(self.to_string()),
            _ => DayBriefError::Storage(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_daybrief())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → DayBriefError */
/* -------------------------------------------------------------------------- */

impl IntoDayBriefError for JsonError {
    fn into_daybrief(self) -> DayBriefError {
        if self.is_io() {
            DayBriefError::Storage(format!("JSON I/O failure: {self}"))
        } else {
            DayBriefError::ParseError(format!("invalid JSON: {self}"))
        }
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_daybrief())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DayBriefError */
/* -------------------------------------------------------------------------- */

impl IntoDayBriefError for HttpError {
    fn into_daybrief(self) -> DayBriefError {
        if self.is_timeout() {
            return DayBriefError::Timeout("HTTP request timed out".into());
        }

        if self.is_connect() {
            return DayBriefError::ApiError("HTTP connection failure".into());
        }

        if self.is_decode() {
            return DayBriefError::ParseError(format!("malformed HTTP response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 => DayBriefError::AuthFailed(message),
                429 => DayBriefError::RateLimited(message),
                _ => DayBriefError::ApiError(message),
            };
        }

        DayBriefError::ApiError(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_daybrief())
    }
}

/// Map a `spawn_blocking` join failure to `DayBriefError::Internal`.
pub fn map_join_error(err: JoinError) -> DayBriefError {
    if err.is_cancelled() {
        DayBriefError::Internal("blocking task cancelled".into())
    } else {
        DayBriefError::Internal(format!("blocking task panicked: {err}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn io_permission_denied_maps_to_permission_error() {
        let err = IoError::new(ErrorKind::PermissionDenied, "denied");
        let mapped: DayBriefError = InfraError::from(err).into();
        assert_eq!(mapped.code(), "PERMISSION_DENIED");
    }

    #[test]
    fn io_not_found_maps_to_storage_error() {
        let err = IoError::new(ErrorKind::NotFound, "missing settings");
        let mapped: DayBriefError = InfraError::from(err).into();
        match mapped {
            DayBriefError::Storage(msg) => assert!(msg.contains("missing settings")),
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_maps_to_parse_error() {
        let err = serde_json::from_str::<Vec<String>>("[1,").unwrap_err();
        let mapped: DayBriefError = InfraError::from(err).into();
        assert_eq!(mapped.code(), "PARSE_ERROR");
    }

    #[tokio::test]
    async fn http_status_401_maps_to_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: DayBriefError = InfraError::from(error).into();
        match mapped {
            DayBriefError::AuthFailed(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_status_429_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::TOO_MANY_REQUESTS))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: DayBriefError = InfraError::from(error).into();
        assert_eq!(mapped.code(), "RATE_LIMITED");
    }
}
