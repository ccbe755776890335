//! Typed errors for input validation, fetching, locating, and normalization.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while validating operator input, before a session starts.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid URL '{0}': only http:// and https:// schemes are supported")]
    InvalidUrl(String),

    #[error("invalid target value '{0}': expected a signed integer or decimal")]
    InvalidValue(String),

    #[error("invalid operator name '{0}': use at least 3 characters, letters and spaces only")]
    InvalidOperator(String),
}

/// Errors raised by a fetch strategy.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("page fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The rendering/fetch backend could not be acquired. Fatal at session start.
    #[error("fetch backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl FetchError {
    /// Transient failures are retried by the polling loop; the rest abort the session.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::BackendUnavailable(_))
    }

    /// Short classification string for audit records.
    pub fn classification(&self) -> &'static str {
        match self {
            FetchError::Timeout(_) => "timeout",
            FetchError::Network(_) => "network",
            FetchError::Status(_) => "http_status",
            FetchError::BackendUnavailable(_) => "backend_unavailable",
        }
    }
}

/// Errors raised while locating the target node in page content.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no node with text '{0}' found in page content")]
    NotFound(String),

    /// The structural path no longer resolves against current content.
    /// Expected signal for falling back to a full-content scan.
    #[error("stale locator at step {step} ('{detail}')")]
    Stale { step: usize, detail: String },
}

/// Errors raised by the value normalizer.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("'{0}' is not a number in either decimal convention")]
    InvalidFormat(String),
}
