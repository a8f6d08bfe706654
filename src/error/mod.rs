//! Error types for the agent engine.

pub mod unified;

pub use unified::{ErrorCategory, ErrorCode};

use thiserror::Error;

/// Primary error type for all engine operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Request-level failure carrying a caller-visible code.
    #[error("{message}")]
    Agent { code: ErrorCode, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "openai")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The framework adapter failed; the cause is passed through.
    #[error("Model call failed: {source}")]
    ModelCall {
        #[source]
        source: Box<AgentError>,
    },
}

impl AgentError {
    /// Create a coded request-level error.
    pub fn agent(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Agent {
            code,
            message: message.into(),
        }
    }

    /// Wrap an adapter failure as `FAILED_MODEL_CALL`.
    pub fn model_call(cause: AgentError) -> Self {
        match cause {
            already @ Self::ModelCall { .. } => already,
            other => Self::ModelCall {
                source: Box::new(other),
            },
        }
    }

    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Caller-visible code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Agent { code, .. } => Some(*code),
            Self::ModelCall { .. } => Some(ErrorCode::FailedModelCall),
            _ => None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Agent { code, .. } => code.category(),
            Self::ModelCall { source } => match source.category() {
                ErrorCategory::Network => ErrorCategory::Network,
                _ => ErrorCategory::Model,
            },
            Self::Configuration(_) | Self::Template(_) | Self::InvalidArgument(_) => {
                ErrorCategory::Configuration
            }
            Self::Storage(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Serialization(_) => ErrorCategory::Serialization,
            #[cfg(feature = "openai")]
            Self::Network(_) => ErrorCategory::Network,
            Self::Api { status, .. } => match status {
                429 | 500..=599 => ErrorCategory::Network,
                _ => ErrorCategory::Model,
            },
            Self::InvalidState(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether retrying the whole turn may succeed. The engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Network)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_error_displays_plain_message() {
        let err = AgentError::agent(ErrorCode::NoUserMessageContent, "nothing to add");
        assert_eq!(err.to_string(), "nothing to add");
        assert_eq!(err.code(), Some(ErrorCode::NoUserMessageContent));
        assert_eq!(err.category(), ErrorCategory::Request);
    }

    #[test]
    fn model_call_wraps_cause_once() {
        let err = AgentError::model_call(AgentError::api(503, "overloaded"));
        assert_eq!(err.code(), Some(ErrorCode::FailedModelCall));
        assert!(err.is_retryable());

        let rewrapped = AgentError::model_call(err);
        match rewrapped {
            AgentError::ModelCall { source } => {
                assert!(matches!(*source, AgentError::Api { status: 503, .. }))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_request_from_model_is_not_retryable() {
        let err = AgentError::model_call(AgentError::api(400, "bad request"));
        assert_eq!(err.category(), ErrorCategory::Model);
        assert!(!err.is_retryable());
    }
}
