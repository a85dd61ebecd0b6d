//! Live-reload connection state machine.
//!
//! ```text
//!              open                    message
//! Connecting ───────► Open ─────────────────────────► Closed (reload)
//!     ▲                 │
//!     │ retry delay     │ error
//!     └─────────────────┤
//!                       │ error, policy gives up
//!                       └───────────────────────────► Closed
//! ```
//!
//! The machine is pure: every transition returns a [`Command`] that the
//! driver executes (close + reload, sleep + reconnect, stop).

use std::time::Duration;

use super::policy::ReconnectPolicy;
use super::transport::{MessageEvent, TransportError};

/// Server-push endpoint the docs server exposes.
pub const DEFAULT_ENDPOINT: &str = "/ss-events";

/// Connection lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Action requested by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Nothing to do.
    None,
    /// Close the connection, then reload the page.
    CloseAndReload,
    /// Open a new connection after the delay.
    Reconnect(Duration),
    /// Stop; the client stays closed.
    GiveUp,
}

/// Live-reload client options.
#[derive(Clone, Debug, PartialEq)]
pub struct LiveReloadOptions {
    /// Event-stream endpoint, relative to the page origin.
    pub endpoint: String,
    /// What to do when the connection drops.
    pub reconnect: ReconnectPolicy,
}

impl Default for LiveReloadOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Live-reload client state.
#[derive(Debug)]
pub struct LiveReload {
    options: LiveReloadOptions,
    state: ConnectionState,
    attempts: u32,
    server_retry: Option<Duration>,
    reloads: u32,
}

impl LiveReload {
    /// Create a client in the `Connecting` state.
    #[must_use]
    pub fn new(options: LiveReloadOptions) -> Self {
        tracing::debug!(endpoint = %options.endpoint, "Live reload client created");
        Self {
            options,
            state: ConnectionState::Connecting,
            attempts: 0,
            server_retry: None,
            reloads: 0,
        }
    }

    /// Event-stream endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.options.endpoint
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnection attempts since the last successful open.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Number of reloads requested (0 or 1).
    #[must_use]
    pub fn reloads(&self) -> u32 {
        self.reloads
    }

    /// The connection is established.
    pub fn on_open(&mut self) -> Command {
        if self.state != ConnectionState::Connecting {
            return Command::None;
        }
        self.state = ConnectionState::Open;
        self.attempts = 0;
        tracing::info!(endpoint = %self.options.endpoint, "Live reload connected");
        Command::None
    }

    /// A message arrived.
    ///
    /// Plain `message` events close the client and request exactly one
    /// reload; the payload is not inspected. Named events are ignored.
    pub fn on_message(&mut self, event: &MessageEvent) -> Command {
        if self.state == ConnectionState::Closed {
            return Command::None;
        }
        if !event.is_message() {
            tracing::debug!(event = %event.event, "Ignoring named event");
            return Command::None;
        }

        self.state = ConnectionState::Closed;
        self.reloads += 1;
        tracing::info!(data = %event.data, "Live reload triggered");
        Command::CloseAndReload
    }

    /// The server sent a `retry:` field.
    pub fn on_retry(&mut self, delay: Duration) {
        self.server_retry = Some(delay);
    }

    /// The connection failed or dropped.
    ///
    /// Logged, never fatal to the page. The reconnect policy decides whether
    /// another connection is attempted.
    pub fn on_error(&mut self, err: &TransportError) -> Command {
        if self.state == ConnectionState::Closed {
            return Command::None;
        }
        tracing::warn!(endpoint = %self.options.endpoint, %err, "Live reload connection error");

        if !err.is_retryable() {
            self.state = ConnectionState::Closed;
            return Command::GiveUp;
        }

        self.attempts += 1;
        match self
            .options
            .reconnect
            .delay_for(self.attempts, self.server_retry)
        {
            Some(delay) => {
                self.state = ConnectionState::Connecting;
                tracing::debug!(
                    attempt = self.attempts,
                    ?delay,
                    "Scheduling reconnect"
                );
                Command::Reconnect(delay)
            }
            None => {
                self.state = ConnectionState::Closed;
                tracing::debug!(attempts = self.attempts, "Giving up on live reload");
                Command::GiveUp
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live_reload::transport::TransportErrorKind;
    use pretty_assertions::assert_eq;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn client(reconnect: ReconnectPolicy) -> LiveReload {
        LiveReload::new(LiveReloadOptions {
            reconnect,
            ..LiveReloadOptions::default()
        })
    }

    fn dropped() -> TransportError {
        TransportError::new(TransportErrorKind::Io, "connection reset")
    }

    #[test]
    fn test_default_endpoint() {
        let client = LiveReload::new(LiveReloadOptions::default());

        assert_eq!(client.endpoint(), "/ss-events");
        assert_eq!(client.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_open_changes_state_only() {
        let mut client = LiveReload::new(LiveReloadOptions::default());

        assert_eq!(client.on_open(), Command::None);
        assert_eq!(client.state(), ConnectionState::Open);
        assert_eq!(client.reloads(), 0);
    }

    #[test]
    fn test_message_closes_and_reloads_once() {
        let mut client = LiveReload::new(LiveReloadOptions::default());
        client.on_open();

        let first = client.on_message(&MessageEvent::new("rebuilt"));
        let second = client.on_message(&MessageEvent::new("rebuilt"));

        assert_eq!(first, Command::CloseAndReload);
        assert_eq!(second, Command::None);
        assert_eq!(client.state(), ConnectionState::Closed);
        assert_eq!(client.reloads(), 1);
    }

    #[test]
    fn test_payload_is_not_inspected() {
        let mut client = LiveReload::new(LiveReloadOptions::default());
        client.on_open();

        assert_eq!(
            client.on_message(&MessageEvent::new("")),
            Command::CloseAndReload
        );
    }

    #[test]
    fn test_named_event_is_ignored() {
        let mut client = LiveReload::new(LiveReloadOptions::default());
        client.on_open();
        let event = MessageEvent {
            event: "ping".to_owned(),
            ..MessageEvent::new("x")
        };

        assert_eq!(client.on_message(&event), Command::None);
        assert_eq!(client.state(), ConnectionState::Open);
    }

    #[test]
    fn test_error_without_policy_closes() {
        let mut client = client(ReconnectPolicy::None);
        client.on_open();

        assert_eq!(client.on_error(&dropped()), Command::GiveUp);
        assert_eq!(client.state(), ConnectionState::Closed);
        assert_eq!(client.reloads(), 0);
    }

    #[test]
    fn test_error_schedules_reconnect() {
        let mut client = client(ReconnectPolicy::FixedDelay {
            delay: ms(100),
            max_attempts: None,
        });
        client.on_open();

        assert_eq!(client.on_error(&dropped()), Command::Reconnect(ms(100)));
        assert_eq!(client.state(), ConnectionState::Connecting);
        assert_eq!(client.attempts(), 1);

        client.on_open();
        assert_eq!(client.attempts(), 0);
    }

    #[test]
    fn test_server_retry_overrides_fixed_delay() {
        let mut client = client(ReconnectPolicy::FixedDelay {
            delay: ms(100),
            max_attempts: None,
        });
        client.on_open();
        client.on_retry(ms(40));

        assert_eq!(client.on_error(&dropped()), Command::Reconnect(ms(40)));
    }

    #[test]
    fn test_max_attempts_exhausted() {
        let mut client = client(ReconnectPolicy::FixedDelay {
            delay: ms(10),
            max_attempts: Some(2),
        });

        assert_eq!(client.on_error(&dropped()), Command::Reconnect(ms(10)));
        assert_eq!(client.on_error(&dropped()), Command::Reconnect(ms(10)));
        assert_eq!(client.on_error(&dropped()), Command::GiveUp);
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_fatal_error_gives_up_regardless_of_policy() {
        let mut client = LiveReload::new(LiveReloadOptions::default());
        let err = TransportError::new(TransportErrorKind::Status(404), "Not Found");

        assert_eq!(client.on_error(&err), Command::GiveUp);
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_closed_ignores_everything() {
        let mut client = client(ReconnectPolicy::None);
        client.on_error(&dropped());

        assert_eq!(client.on_open(), Command::None);
        assert_eq!(client.on_message(&MessageEvent::new("x")), Command::None);
        assert_eq!(client.on_error(&dropped()), Command::None);
        assert_eq!(client.state(), ConnectionState::Closed);
    }
}
