//! Error types and handling for `SkySafe`

use std::time::Duration;
use thiserror::Error;

/// Main error type for the `SkySafe` engine
#[derive(Error, Debug)]
pub enum SkySafeError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A collaborator (weather source, pollutant predictor) failed
    #[error("External service error ({service}): {message}")]
    ExternalService { service: String, message: String },

    /// An ingestion batch is structurally unusable
    #[error("Ingestion batch rejected, missing fields: {}", missing_fields.join(", "))]
    Ingestion { missing_fields: Vec<String> },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl SkySafeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new external service error
    pub fn external<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new ingestion error listing the missing fields
    #[must_use]
    pub fn ingestion(missing_fields: Vec<String>) -> Self {
        Self::Ingestion { missing_fields }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SkySafeError::Config { .. } => {
                "Configuration error. Please check your config file and environment.".to_string()
            }
            SkySafeError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            SkySafeError::ExternalService { service, .. } => {
                format!("The {service} service is unavailable; local estimates were used.")
            }
            SkySafeError::Ingestion { missing_fields } => {
                format!(
                    "The uploaded data is missing required columns: {}",
                    missing_fields.join(", ")
                )
            }
            SkySafeError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            SkySafeError::General { message } => message.clone(),
        }
    }
}

/// Failure signal returned by an external collaborator.
///
/// Never escapes a refresh: the orchestrator turns every variant into a
/// fallback-derived point.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("call timed out after {0} ms")]
    Timeout(u64),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl CollaboratorError {
    /// Classify an HTTP client failure. `budget` is the request timeout the
    /// client was built with and is reported when the call timed out.
    pub fn http(err: impl Into<reqwest_middleware::Error>, budget: Duration) -> Self {
        match err.into() {
            reqwest_middleware::Error::Reqwest(inner) if inner.is_timeout() => {
                CollaboratorError::Timeout(u64::try_from(budget.as_millis()).unwrap_or(u64::MAX))
            }
            reqwest_middleware::Error::Reqwest(inner) if inner.is_decode() => {
                CollaboratorError::Malformed(inner.to_string())
            }
            other => CollaboratorError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = SkySafeError::config("bad decay");
        assert!(matches!(config_err, SkySafeError::Config { .. }));

        let validation_err = SkySafeError::validation("latitude out of range");
        assert!(matches!(validation_err, SkySafeError::Validation { .. }));

        let external_err = SkySafeError::external("open-meteo", "503");
        assert!(matches!(external_err, SkySafeError::ExternalService { .. }));

        let general_err = SkySafeError::general("No forecast site named Sur");
        assert_eq!(general_err.user_message(), "No forecast site named Sur");
    }

    #[test]
    fn test_ingestion_error_lists_fields() {
        let err = SkySafeError::ingestion(vec!["lat".to_string(), "lon".to_string()]);
        assert_eq!(
            err.to_string(),
            "Ingestion batch rejected, missing fields: lat, lon"
        );
        assert!(err.user_message().contains("lat, lon"));
    }

    #[test]
    fn test_user_messages() {
        let config_err = SkySafeError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let external_err = SkySafeError::external("predictor", "down");
        assert!(external_err.user_message().contains("predictor"));

        let validation_err = SkySafeError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_middleware_failure_is_unavailable() {
        let err = CollaboratorError::http(
            reqwest_middleware::Error::Middleware(anyhow::anyhow!("retries exhausted")),
            Duration::from_millis(2000),
        );
        assert!(matches!(err, CollaboratorError::Unavailable(message) if message.contains("retries exhausted")));
    }

    #[tokio::test]
    async fn test_http_timeout_reports_budget() {
        // Connections land in the backlog and never get an answer
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let budget = Duration::from_millis(50);
        let client = reqwest::Client::builder().timeout(budget).build().unwrap();
        let err = client.get(format!("http://{addr}/")).send().await.unwrap_err();

        assert_eq!(CollaboratorError::http(err, budget), CollaboratorError::Timeout(50));
        drop(listener);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SkySafeError = io_err.into();
        assert!(matches!(err, SkySafeError::Io { .. }));
    }
}
