//! Live-reload client.
//!
//! Subscribes to the docs server's event stream and reloads the page when a
//! message arrives. Reconnection after errors is an explicit
//! [`ReconnectPolicy`] rather than whatever the transport does by default.

pub(crate) mod client;
pub(crate) mod driver;
pub(crate) mod policy;
pub(crate) mod transport;

pub use client::{Command, ConnectionState, DEFAULT_ENDPOINT, LiveReload, LiveReloadOptions};
pub use driver::{Navigator, Outcome, Sleep, ThreadSleep, run_blocking};
pub use policy::{DEFAULT_RECONNECT_DELAY, ReconnectPolicy};
pub use transport::{
    Connection, DEFAULT_EVENT_TYPE, EventSource, Frame, MessageEvent, TransportError,
    TransportErrorKind,
};
