//! `text/event-stream` decoding.
//!
//! Implements the event-stream interpretation rules of the HTML standard:
//!
//! - lines end with CRLF, LF, or a lone CR
//! - lines starting with `:` are comments
//! - `field:value` with a single leading space stripped from the value;
//!   a line without a colon is a field with an empty value
//! - `data` lines accumulate; a blank line dispatches the event and
//!   commits the pending `id` as the last event id
//! - an event with an empty data buffer is not dispatched
//! - `retry` takes effect immediately if it is all ASCII digits
//! - a partial event at end of stream is discarded

use std::io::{self, BufRead};
use std::time::Duration;

use dz_ui::{DEFAULT_EVENT_TYPE, Frame, MessageEvent};

/// Line-level event-stream decoder.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    data: String,
    event_type: String,
    id_buffer: Option<String>,
    last_event_id: Option<String>,
}

impl EventStreamDecoder {
    /// Create a decoder with empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from the last event id of a previous connection.
    #[must_use]
    pub fn with_last_event_id(last_event_id: Option<String>) -> Self {
        Self {
            id_buffer: last_event_id.clone(),
            last_event_id,
            ..Self::default()
        }
    }

    /// Last event id committed by a dispatch. An empty `id` clears it.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Process one line (without its terminator).
    ///
    /// Returns a frame when the line dispatches an event or sets the
    /// reconnection time.
    pub fn decode_line(&mut self, line: &str) -> Option<Frame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => value.clone_into(&mut self.event_type),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" if !value.contains('\0') => {
                self.id_buffer = (!value.is_empty()).then(|| value.to_owned());
            }
            "retry" if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => {
                let millis = value.parse().unwrap_or(u64::MAX);
                return Some(Frame::Retry(Duration::from_millis(millis)));
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<Frame> {
        self.last_event_id.clone_from(&self.id_buffer);
        if self.data.is_empty() {
            self.event_type.clear();
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }
        let event = if self.event_type.is_empty() {
            DEFAULT_EVENT_TYPE.to_owned()
        } else {
            std::mem::take(&mut self.event_type)
        };

        Some(Frame::Message(MessageEvent {
            event,
            data,
            last_event_id: self.last_event_id.clone(),
        }))
    }
}

/// Reads frames from a byte stream.
pub struct EventStreamReader<R> {
    inner: R,
    decoder: EventStreamDecoder,
    skip_lf: bool,
    at_start: bool,
}

impl<R: BufRead> EventStreamReader<R> {
    /// Wrap a buffered reader.
    pub fn new(inner: R) -> Self {
        Self::with_last_event_id(inner, None)
    }

    /// Wrap a buffered reader, continuing from a previous connection's id.
    pub fn with_last_event_id(inner: R, last_event_id: Option<String>) -> Self {
        Self {
            inner,
            decoder: EventStreamDecoder::with_last_event_id(last_event_id),
            skip_lf: false,
            at_start: true,
        }
    }

    /// Last event id committed on the stream.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        self.decoder.last_event_id()
    }

    /// Block until the next frame. `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn next_frame(&mut self) -> io::Result<Option<Frame>> {
        while let Some(line) = self.read_line()? {
            let line = if self.at_start {
                self.at_start = false;
                line.strip_prefix('\u{feff}').map(str::to_owned).unwrap_or(line)
            } else {
                line
            };
            if let Some(frame) = self.decoder.decode_line(&line) {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    /// Read one line terminated by CRLF, LF, or CR.
    ///
    /// A trailing line without terminator is dropped at end of stream.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = Vec::new();
        loop {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                return Ok(None);
            }

            let mut consumed = 0;
            let mut complete = false;
            for &byte in buf {
                consumed += 1;
                if std::mem::take(&mut self.skip_lf) && byte == b'\n' {
                    continue;
                }
                match byte {
                    b'\n' => complete = true,
                    b'\r' => {
                        self.skip_lf = true;
                        complete = true;
                    }
                    _ => line.push(byte),
                }
                if complete {
                    break;
                }
            }
            self.inner.consume(consumed);

            if complete {
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
        }
    }
}
