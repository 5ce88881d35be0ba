use std::time::Duration;

use thiserror::Error;

/// Failures talking to the external custody services.
///
/// A timeout is a failure, never an implicit approval: callers record the
/// attempt as failed downstream and leave strategy counters untouched.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("service rejected the request: {reason}")]
    Rejected { reason: String },

    #[error("unexpected response shape: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Whether the failure was a transport timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            GatewayError::Timeout(_) => true,
            GatewayError::Http(err) => err.is_timeout(),
            _ => false,
        }
    }
}
