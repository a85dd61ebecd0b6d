//! Error types for the HTTP event-stream transport.

use dz_ui::{TransportError, TransportErrorKind};

/// Error opening or reading an event stream.
#[derive(Debug, thiserror::Error)]
pub enum SseError {
    /// HTTP request failed (connection refused, DNS, timeout).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// Server answered with a non-success status.
    #[error("HTTP error: {status} {reason}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// Response is not `text/event-stream`.
    #[error("unexpected content type: {0}")]
    ContentType(String),

    /// I/O error while reading the stream.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

impl From<SseError> for TransportError {
    fn from(err: SseError) -> Self {
        match err {
            SseError::HttpRequest(source) => {
                TransportError::new(TransportErrorKind::Connect, source.to_string())
            }
            SseError::HttpResponse { status, reason } => {
                TransportError::new(TransportErrorKind::Status(status), reason)
            }
            SseError::ContentType(content_type) => TransportError::new(
                TransportErrorKind::Protocol,
                format!("unexpected content type: {content_type}"),
            ),
            SseError::Io(source) => TransportError::new(TransportErrorKind::Io, source.to_string()),
        }
    }
}
