//! Reconnection policy for the event-stream connection.

use std::time::Duration;

/// Default delay before reconnecting, matching the usual `EventSource`
/// reconnection time.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// How the client reacts to a dropped connection.
#[derive(Clone, Debug, PartialEq)]
pub enum ReconnectPolicy {
    /// Never reconnect; the first error closes the client.
    None,
    /// Reconnect after a constant delay.
    ///
    /// A `retry:` field sent by the server replaces `delay`.
    FixedDelay {
        delay: Duration,
        max_attempts: Option<u32>,
    },
    /// Reconnect with exponentially growing delays.
    Backoff {
        initial: Duration,
        max: Duration,
        factor: f64,
        max_attempts: Option<u32>,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::FixedDelay {
            delay: DEFAULT_RECONNECT_DELAY,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnection attempt number `attempt` (1-based).
    ///
    /// Returns `None` when the policy gives up.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, server_retry: Option<Duration>) -> Option<Duration> {
        match *self {
            Self::None => None,
            Self::FixedDelay {
                delay,
                max_attempts,
            } => within(attempt, max_attempts).then(|| server_retry.unwrap_or(delay)),
            Self::Backoff {
                initial,
                max,
                factor,
                max_attempts,
            } => within(attempt, max_attempts).then(|| backoff(initial, max, factor, attempt)),
        }
    }
}

fn within(attempt: u32, max_attempts: Option<u32>) -> bool {
    max_attempts.is_none_or(|max| attempt <= max)
}

/// `initial * factor^(attempt - 1)`, capped at `max`.
fn backoff(initial: Duration, max: Duration, factor: f64, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    let secs = initial.as_secs_f64() * factor.max(1.0).powi(exponent);
    if !secs.is_finite() || secs >= max.as_secs_f64() {
        return max;
    }
    Duration::from_secs_f64(secs)
}
