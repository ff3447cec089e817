use thiserror::Error;

/// Model client failures.
///
/// Only [`ModelError::Transient`] is retried. It never escapes
/// [`super::GeminiClient::generate`]; once retries are exhausted it surfaces as
/// [`ModelError::Upstream`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("Authentication with the model provider failed: {0}")]
    Auth(String),

    #[error("Model provider quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Transient model provider failure: {0}")]
    Transient(String),

    #[error("Model provider error after {attempts} attempt(s): {message}")]
    Upstream { attempts: u32, message: String },
}

impl ModelError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub(crate) fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            attempts: 1,
            message: message.into(),
        }
    }

    pub(crate) fn with_attempts(self, attempts: u32) -> Self {
        match self {
            Self::Upstream { message, .. } | Self::Transient(message) => {
                Self::Upstream { attempts, message }
            }
            other => other,
        }
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transient(format!("request timed out: {}", e))
        } else if e.is_connect() || e.is_request() || e.is_body() {
            Self::Transient(e.to_string())
        } else {
            Self::upstream(e.to_string())
        }
    }
}
