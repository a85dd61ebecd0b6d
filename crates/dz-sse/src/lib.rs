//! Native `text/event-stream` transport for dz live reload.
//!
//! [`HttpEventSource`] opens blocking HTTP connections with `ureq` and
//! decodes the stream with [`EventStreamReader`], so a
//! [`dz_ui::LiveReload`] client can run outside a browser:
//!
//! ```ignore
//! use dz_sse::HttpEventSource;
//! use dz_ui::{LiveReload, LiveReloadOptions, ThreadSleep, run_blocking};
//!
//! let mut source = HttpEventSource::new("http://127.0.0.1:3000");
//! let mut client = LiveReload::new(LiveReloadOptions::default());
//! let outcome = run_blocking(&mut client, &mut source, &mut navigator, &mut ThreadSleep);
//! ```

mod client;
mod decoder;
mod error;

pub use client::{HttpConnection, HttpEventSource};
pub use decoder::{EventStreamDecoder, EventStreamReader};
pub use error::SseError;
