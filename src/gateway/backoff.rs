use std::time::Duration;

use rand::Rng as _;
use tokio::time::Instant;

use super::config::ReconnectConfig;

/// Decides how long to wait before reconnecting.
///
/// A disconnect that follows the previous one within the fast-failure window is a
/// sign the endpoint is misbehaving, so the next attempt is held back by a random
/// whole number of seconds. Otherwise the client reconnects straight away.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    config: ReconnectConfig,
}

impl Backoff {
    pub(crate) fn new(config: ReconnectConfig) -> Self {
        Self { config }
    }

    /// Delay before reconnecting, given when the disconnect before this one happened.
    pub(crate) fn delay(&self, previous: Option<Instant>, now: Instant) -> Option<Duration> {
        let previous = previous?;
        if now.saturating_duration_since(previous) >= self.config.fast_failure_window {
            return None;
        }

        let min = self.config.min_delay.as_secs();
        let max = self.config.max_delay.as_secs().max(min);
        Some(Duration::from_secs(rand::rng().random_range(min..=max)))
    }
}
