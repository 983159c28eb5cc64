use std::time::Duration;

/// Error type for every failure a push operation can surface.
///
/// Retryability is a property of the error kind, not of the call site: the
/// retry executor inspects [`PushError::is_retryable`] to decide whether a
/// failed attempt may be repeated. Terminal errors keep their retryability
/// flag, so a server error surfaced after budget exhaustion still reports
/// `is_retryable() == true`.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("validation error (HTTP {status}): {message}")]
    Validation { status: u16, message: String },

    #[error("authentication error (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("rate limited (HTTP 429): {message}")]
    RateLimited {
        message: String,
        /// Server-provided backoff hint, consumed by the next retry decision only.
        retry_after: Option<Duration>,
    },

    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("network error after {attempts} attempt(s): {reason}")]
    Network { reason: String, attempts: u32 },

    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid response body: {reason}")]
    InvalidResponse { reason: String },

    #[error("request failed (HTTP {status}): {message}")]
    Api { status: u16, message: String },
}

impl PushError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
            attempts: 1,
        }
    }

    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Whether another physical attempt could change the outcome.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. }
            | Self::Server { .. }
            | Self::Network { .. }
            | Self::Timeout { .. } => true,
            Self::InvalidArgument { .. }
            | Self::Validation { .. }
            | Self::Authentication { .. }
            | Self::Cancelled
            | Self::InvalidResponse { .. }
            | Self::Api { .. } => false,
        }
    }

    /// Stamp the number of physical attempts made into errors that report it.
    pub(crate) fn with_attempts(self, attempts: u32) -> Self {
        match self {
            Self::Network { reason, .. } => Self::Network { reason, attempts },
            Self::Timeout { .. } => Self::Timeout { attempts },
            other => other,
        }
    }
}
