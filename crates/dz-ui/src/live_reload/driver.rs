//! Blocking driver for native event-stream transports.

use std::time::Duration;

use super::client::{Command, LiveReload};
use super::transport::{Connection, EventSource, Frame, TransportError};

/// Performs the page reload.
pub trait Navigator {
    /// Reload the current page.
    fn reload(&mut self);
}

/// Waits between reconnection attempts.
pub trait Sleep {
    fn sleep(&mut self, duration: Duration);
}

/// [`Sleep`] on the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// How a blocking run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A message arrived and the page was reloaded.
    Reloaded,
    /// The connection failed and the reconnect policy gave up.
    GaveUp,
}

/// Drive `client` over `source` until it reloads or gives up.
///
/// Opens one connection, feeds every frame to the state machine, and
/// executes the returned commands. On reload the connection is closed before
/// [`Navigator::reload`] is called.
pub fn run_blocking<S, N, Z>(
    client: &mut LiveReload,
    source: &mut S,
    navigator: &mut N,
    sleeper: &mut Z,
) -> Outcome
where
    S: EventSource,
    N: Navigator + ?Sized,
    Z: Sleep + ?Sized,
{
    loop {
        let err = match source.connect(client.endpoint()) {
            Ok(mut connection) => {
                client.on_open();
                match pump(client, &mut connection) {
                    Pumped::Reload => {
                        connection.close();
                        navigator.reload();
                        return Outcome::Reloaded;
                    }
                    Pumped::Failed(err) => {
                        connection.close();
                        err
                    }
                }
            }
            Err(err) => err,
        };

        match client.on_error(&err) {
            Command::Reconnect(delay) => sleeper.sleep(delay),
            _ => return Outcome::GaveUp,
        }
    }
}

enum Pumped {
    Reload,
    Failed(TransportError),
}

fn pump<C: Connection>(client: &mut LiveReload, connection: &mut C) -> Pumped {
    loop {
        match connection.next_frame() {
            Ok(Some(Frame::Message(event))) => {
                if client.on_message(&event) == Command::CloseAndReload {
                    return Pumped::Reload;
                }
            }
            Ok(Some(Frame::Retry(delay))) => client.on_retry(delay),
            Ok(None) => return Pumped::Failed(TransportError::closed()),
            Err(err) => return Pumped::Failed(err),
        }
    }
}
