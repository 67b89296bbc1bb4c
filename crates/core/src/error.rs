//! Error types for sitechat.
//!
//! This module defines a unified error enum that covers all error categories
//! in the chat pipeline: configuration, knowledge retrieval, the upstream
//! completion provider, streaming transport, and turn orchestration.

use thiserror::Error;

/// Unified error type for sitechat.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors (missing credential, invalid settings).
    /// Fatal for the request; never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The knowledge document source could not be fetched.
    /// Callers degrade to an empty context rather than aborting the turn.
    #[error("Knowledge source unavailable: {0}")]
    SourceUnavailable(String),

    /// Non-success HTTP status from the completion provider.
    #[error("Upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    /// The provider response was missing the expected answer field.
    #[error("Unexpected upstream response shape: {0}")]
    UpstreamProtocol(String),

    /// The byte stream failed mid-flight (connection reset, read error).
    #[error("Stream error: {0}")]
    Stream(String),

    /// No bytes received from the upstream within the allowed interval.
    #[error("Timed out waiting for upstream data")]
    Timeout,

    /// The caller cancelled the in-flight turn. Not surfaced to the user.
    #[error("Cancelled")]
    Cancelled,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Turn orchestration errors (e.g. submit while a turn is in flight)
    #[error("Chat error: {0}")]
    Chat(String),
}

impl AppError {
    /// Short machine-readable category for this error.
    ///
    /// The conversation controller uses this to build the single
    /// user-visible failure message; raw error text never reaches the user.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Config(_) => "configuration",
            AppError::Io(_) => "io",
            AppError::SourceUnavailable(_) => "retrieval",
            AppError::Upstream { .. } => "upstream",
            AppError::UpstreamProtocol(_) => "upstream",
            AppError::Stream(_) => "stream",
            AppError::Timeout => "timeout",
            AppError::Cancelled => "cancelled",
            AppError::Serialization(_) => "serialization",
            AppError::Chat(_) => "chat",
        }
    }

    /// Whether this error represents an explicit caller cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        assert_eq!(AppError::Config("x".into()).category(), "configuration");
        assert_eq!(
            AppError::SourceUnavailable("x".into()).category(),
            "retrieval"
        );
        assert_eq!(
            AppError::Upstream {
                status: 500,
                message: "x".into()
            }
            .category(),
            "upstream"
        );
        assert_eq!(AppError::Timeout.category(), "timeout");
        assert_eq!(AppError::Cancelled.category(), "cancelled");
    }

    #[test]
    fn test_is_cancelled() {
        assert!(AppError::Cancelled.is_cancelled());
        assert!(!AppError::Timeout.is_cancelled());
    }

    #[test]
    fn test_upstream_display_includes_status() {
        let err = AppError::Upstream {
            status: 429,
            message: "rate limited".into(),
        };
        let text = err.to_string();
        assert!(text.contains("429"));
        assert!(text.contains("rate limited"));
    }
}
