//! Blocking HTTP event-stream client.

use std::cell::RefCell;
use std::io::{BufRead, BufReader};
use std::rc::Rc;
use std::time::Duration;

use dz_ui::{Connection, EventSource, Frame, TransportError};
use ureq::Agent;

use crate::decoder::EventStreamReader;
use crate::error::SseError;

/// Default connect timeout in seconds.
///
/// Reads are not bounded; the stream stays open until the server ends it.
const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

const EVENT_STREAM: &str = "text/event-stream";

/// Opens event-stream connections to a docs server.
pub struct HttpEventSource {
    agent: Agent,
    base_url: String,
    last_event_id: Rc<RefCell<Option<String>>>,
}

impl HttpEventSource {
    /// Create a source for the server at `base_url` (e.g. `http://127.0.0.1:3000`).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let agent = Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            last_event_id: Rc::default(),
        }
    }

    /// Last event id received on any connection from this source.
    #[must_use]
    pub fn last_event_id(&self) -> Option<String> {
        self.last_event_id.borrow().clone()
    }

    fn open(&self, endpoint: &str) -> Result<HttpConnection, SseError> {
        let url = format!("{}{endpoint}", self.base_url);
        tracing::debug!(%url, "Opening event stream");

        let last_event_id = self.last_event_id();
        let mut request = self
            .agent
            .get(&url)
            .header("Accept", EVENT_STREAM)
            .header("Cache-Control", "no-cache");
        if let Some(id) = last_event_id.as_deref() {
            request = request.header("Last-Event-ID", id);
        }
        let response = request.call()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SseError::HttpResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if !is_event_stream(&content_type) {
            return Err(SseError::ContentType(content_type));
        }

        let body: Box<dyn BufRead> = Box::new(BufReader::new(response.into_body().into_reader()));
        Ok(HttpConnection {
            reader: Some(EventStreamReader::with_last_event_id(body, last_event_id)),
            last_event_id: Rc::clone(&self.last_event_id),
        })
    }
}

impl EventSource for HttpEventSource {
    type Connection = HttpConnection;

    fn connect(&mut self, endpoint: &str) -> Result<HttpConnection, TransportError> {
        Ok(self.open(endpoint)?)
    }
}

fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(EVENT_STREAM))
}

/// Open HTTP event stream.
///
/// Dropping the reader on [`Connection::close`] closes the socket.
pub struct HttpConnection {
    reader: Option<EventStreamReader<Box<dyn BufRead>>>,
    last_event_id: Rc<RefCell<Option<String>>>,
}

impl Connection for HttpConnection {
    fn next_frame(&mut self) -> Result<Option<Frame>, TransportError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let frame = reader.next_frame();
        *self.last_event_id.borrow_mut() = reader.last_event_id().map(str::to_owned);
        Ok(frame.map_err(SseError::from)?)
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            tracing::debug!("Event stream closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_event_stream() {
        assert!(is_event_stream("text/event-stream"));
        assert!(is_event_stream("text/event-stream; charset=utf-8"));
        assert!(is_event_stream("Text/Event-Stream"));
        assert!(!is_event_stream("text/html"));
        assert!(!is_event_stream(""));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let source = HttpEventSource::new("http://localhost:3000/");

        assert_eq!(source.base_url, "http://localhost:3000");
        assert!(source.last_event_id().is_none());
    }
}
