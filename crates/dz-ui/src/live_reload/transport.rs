//! Event-stream transport abstraction.
//!
//! A transport opens connections to the server-push endpoint and yields the
//! frames decoded from the stream. The browser `EventSource` and the native
//! `dz-sse` client both fit behind these traits.

use std::fmt;
use std::time::Duration;

/// Event type used when the stream does not name one.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// A dispatched event-stream message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    /// Event type (`event:` field), `"message"` if absent.
    pub event: String,
    /// Event payload (`data:` lines joined with `\n`).
    pub data: String,
    /// Last event id seen on the stream.
    pub last_event_id: Option<String>,
}

impl MessageEvent {
    /// Unnamed message with the given payload.
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event: DEFAULT_EVENT_TYPE.to_owned(),
            data: data.into(),
            last_event_id: None,
        }
    }

    /// Whether this is a plain `message` event.
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.event == DEFAULT_EVENT_TYPE
    }
}

/// Decoded unit of an event stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// A dispatched event.
    Message(MessageEvent),
    /// Server-requested reconnection time (`retry:` field).
    Retry(Duration),
}

/// Transport error category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection could not be established.
    Connect,
    /// Server answered with a non-success status.
    Status(u16),
    /// Response is not an event stream.
    Protocol,
    /// Read failed mid-stream.
    Io,
    /// Server ended the stream.
    Closed,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => f.write_str("Connection failed"),
            Self::Status(code) => write!(f, "HTTP status {code}"),
            Self::Protocol => f.write_str("Protocol error"),
            Self::Io => f.write_str("Read error"),
            Self::Closed => f.write_str("Stream closed"),
        }
    }
}

/// Event-stream transport error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    /// Create a new transport error.
    #[must_use]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The server ended the stream.
    #[must_use]
    pub fn closed() -> Self {
        Self::new(TransportErrorKind::Closed, "end of stream")
    }

    /// Whether reconnecting can help.
    ///
    /// A bad status or a response that is not an event stream fails the
    /// connection for good, as `EventSource` does.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Connect | TransportErrorKind::Io | TransportErrorKind::Closed
        )
    }
}

/// An open event-stream connection.
pub trait Connection {
    /// Block until the next frame.
    ///
    /// `Ok(None)` means the server ended the stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, TransportError>;

    /// Close the connection. Further reads return `Ok(None)`.
    fn close(&mut self);
}

/// Opens event-stream connections.
pub trait EventSource {
    type Connection: Connection;

    /// Open a connection to `endpoint`.
    fn connect(&mut self, endpoint: &str) -> Result<Self::Connection, TransportError>;
}
