//! Failure classification for a single upstream attempt

use std::time::Duration;
use thiserror::Error;

/// Why one upstream attempt produced no items
///
/// Cancellation is not an error; the request slot reports it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("malformed upstream payload: {0}")]
    Malformed(String),

    #[error("{provider} has no equivalent for {what}")]
    Unsupported { provider: String, what: String },
}

impl FetchError {
    pub fn unsupported(provider: impl Into<String>, what: impl Into<String>) -> Self {
        Self::Unsupported {
            provider: provider.into(),
            what: what.into(),
        }
    }

    /// Short label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Transport(_) => "transport",
            Self::Upstream { .. } => "upstream",
            Self::Malformed(_) => "malformed",
            Self::Unsupported { .. } => "unsupported",
        }
    }

    /// Classify a reqwest failure
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Upstream {
                status: status.as_u16(),
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Result of a single upstream attempt
pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(FetchError::Timeout(Duration::from_secs(7)).kind(), "timeout");
        assert_eq!(FetchError::Upstream { status: 502 }.kind(), "upstream");
        assert_eq!(
            FetchError::unsupported("tmdb", "genre Cooking").to_string(),
            "tmdb has no equivalent for genre Cooking"
        );
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err: FetchError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "malformed");
    }
}
