//! Result and error shapes surfaced to dashboard consumers.

use crate::backend::BackendError;
use crate::constants::{MSG_RATE_LIMIT_LATER, MSG_RATE_LIMIT_MINUTES};

/// Terminal failures of a fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx reply; `message` is the backend's own text when it sent one
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("{}", rate_limit_message(.minutes_to_reset))]
    RateLimited {
        message: String,
        minutes_to_reset: Option<u64>,
    },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

fn rate_limit_message(minutes_to_reset: &Option<u64>) -> String {
    match minutes_to_reset {
        Some(minutes) => MSG_RATE_LIMIT_MINUTES.replace("{}", &minutes.to_string()),
        None => MSG_RATE_LIMIT_LATER.to_string(),
    }
}

impl FetchError {
    pub(crate) fn from_backend(error: BackendError, timeout_ms: u64) -> Self {
        match error {
            BackendError::Timeout(_) => FetchError::Timeout { timeout_ms },
            BackendError::Network(message) => FetchError::Network(message),
            BackendError::InvalidRequest(message) => FetchError::InvalidRequest(message),
        }
    }

    /// Timeouts and connection failures are retried before they surface
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout { .. } | FetchError::Network(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }

    /// HTTP status of the failing reply, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// State of one logical remote read.
///
/// `Idle → Loading → {Success, Error, Processing}`, and `Processing → Loading` again
/// on every poll tick until a terminal state is reached.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult<T> {
    Idle,
    Loading,
    /// The backend accepted the job but has no data yet
    Processing(String),
    Success(T),
    Error(FetchError),
}

impl<T> Default for FetchResult<T> {
    fn default() -> Self {
        FetchResult::Idle
    }
}

impl<T> FetchResult<T> {
    /// Success and Error end automatic polling
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchResult::Success(_) | FetchResult::Error(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchResult::Loading)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, FetchResult::Processing(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchResult::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            FetchResult::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchResult::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Short state name for logs and status lines
    pub fn label(&self) -> &'static str {
        match self {
            FetchResult::Idle => "idle",
            FetchResult::Loading => "loading",
            FetchResult::Processing(_) => "processing",
            FetchResult::Success(_) => "success",
            FetchResult::Error(_) => "error",
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchResult<U> {
        match self {
            FetchResult::Idle => FetchResult::Idle,
            FetchResult::Loading => FetchResult::Loading,
            FetchResult::Processing(message) => FetchResult::Processing(message),
            FetchResult::Success(data) => FetchResult::Success(f(data)),
            FetchResult::Error(error) => FetchResult::Error(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_message_mentions_minutes() {
        let err = FetchError::RateLimited {
            message: "API rate limit exceeded".to_string(),
            minutes_to_reset: Some(12),
        };
        assert_eq!(err.to_string(), "GitHub API rate limit exceeded. Please try again in 12 minutes.");

        let err = FetchError::RateLimited {
            message: "API rate limit exceeded".to_string(),
            minutes_to_reset: None,
        };
        assert_eq!(err.to_string(), "GitHub API rate limit exceeded. Please try again later.");
    }

    #[test]
    fn http_error_passes_message_through() {
        let err = FetchError::Http {
            status: 404,
            message: "Repository not found".to_string(),
        };
        assert_eq!(err.to_string(), "Repository not found");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_transient());
    }

    #[test]
    fn terminal_states() {
        assert!(!FetchResult::<u32>::Idle.is_terminal());
        assert!(!FetchResult::<u32>::Loading.is_terminal());
        assert!(!FetchResult::<u32>::Processing("wait".into()).is_terminal());
        assert!(FetchResult::Success(1u32).is_terminal());
        assert!(FetchResult::<u32>::Error(FetchError::Network("down".into())).is_terminal());
    }

    #[test]
    fn map_keeps_non_success_states() {
        let processing: FetchResult<u32> = FetchResult::Processing("wait".into());
        assert_eq!(processing.map(|n| n * 2), FetchResult::Processing("wait".into()));
        assert_eq!(FetchResult::Success(2u32).map(|n| n * 2), FetchResult::Success(4));
    }
}
