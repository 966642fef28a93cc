//! Error types for Portainer operations.

use std::sync::Arc;

use thiserror::Error;

use crate::decode::DecodeError;

/// Result type alias for Portainer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the API client, the store and the refresh controller.
///
/// `Clone` so a single failure can be returned to the caller of a refresh
/// and recorded as the last error at the same time.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Response body did not match the wire model.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Transport failure (connect, TLS, timeout, body read).
    #[error("request failed: {0}")]
    Request(#[source] Arc<reqwest::Error>),

    /// Server answered with a non-success status.
    #[error("HTTP {status}{}", status_suffix(.message))]
    HttpStatus { status: u16, message: Option<String> },

    /// Operation was superseded by a newer one or canceled explicitly.
    #[error("operation canceled")]
    Cancelled,

    /// Endpoint-scoped request issued while no endpoint is selected.
    #[error("no endpoint selected")]
    NoEndpointSelected,

    /// Server URL could not be parsed or joined.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

fn status_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl Error {
    /// True for [`Error::Cancelled`]; canceled operations are never shown as failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(Arc::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display_includes_message_when_present() {
        let e = Error::HttpStatus {
            status: 404,
            message: Some("Stack not found".into()),
        };
        assert_eq!(e.to_string(), "HTTP 404: Stack not found");
        let e = Error::HttpStatus {
            status: 502,
            message: None,
        };
        assert_eq!(e.to_string(), "HTTP 502");
    }

    #[test]
    fn only_cancelled_is_cancellation() {
        assert!(Error::Cancelled.is_cancellation());
        assert!(!Error::NoEndpointSelected.is_cancellation());
    }
}
