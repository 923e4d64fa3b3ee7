#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::time::Duration;

use bon::Builder;
use secrecy::SecretString;
use url::Url;

use super::types::request::ConnectionProperties;
use crate::Result;
use crate::error::Error;
use crate::ws::WsError;

/// Endpoint used when no URL is configured.
pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/";

const DEFAULT_LARGE_THRESHOLD: u16 = 250;
const DEFAULT_FAST_FAILURE_WINDOW: Duration = Duration::from_secs(60);
const DEFAULT_MIN_RECONNECT_DELAY: Duration = Duration::from_secs(3);
const DEFAULT_MAX_RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Configuration for [`crate::gateway::Client`].
///
/// # Example
///
/// ```
/// use discord_gateway::gateway::Config;
///
/// let config = Config::builder()
///     .token("bot-token".to_owned())
///     .build();
/// ```
#[derive(Clone, Debug, Builder)]
pub struct Config {
    /// Session credential sent with IDENTIFY.
    #[builder(into)]
    pub(crate) token: SecretString,
    /// Gateway endpoint. Defaults to [`DEFAULT_GATEWAY_URL`].
    #[builder(into, default = DEFAULT_GATEWAY_URL.to_owned())]
    pub(crate) url: String,
    /// Client description sent with IDENTIFY.
    #[builder(default)]
    pub(crate) properties: ConnectionProperties,
    /// Member count above which the gateway stops sending offline members of a guild.
    #[builder(default = DEFAULT_LARGE_THRESHOLD)]
    pub(crate) large_threshold: u16,
    /// Reconnect pacing.
    #[builder(default)]
    pub(crate) reconnect: ReconnectConfig,
}

impl Config {
    /// Check the configuration and return the parsed endpoint.
    pub(crate) fn validate(&self) -> Result<Url> {
        let url = Url::parse(&self.url)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(WsError::UnsupportedScheme(url.scheme().to_owned()).into());
        }

        if self.reconnect.min_delay > self.reconnect.max_delay {
            return Err(Error::validation(format!(
                "reconnect min_delay {:?} exceeds max_delay {:?}",
                self.reconnect.min_delay, self.reconnect.max_delay
            )));
        }

        Ok(url)
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Pacing of automatic reconnects.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// A disconnect this soon after the previous one counts as a fast failure.
    pub fast_failure_window: Duration,
    /// Lower bound of the random wait after a fast failure (whole seconds).
    pub min_delay: Duration,
    /// Upper bound of the random wait after a fast failure (whole seconds).
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            fast_failure_window: DEFAULT_FAST_FAILURE_WINDOW,
            min_delay: DEFAULT_MIN_RECONNECT_DELAY,
            max_delay: DEFAULT_MAX_RECONNECT_DELAY,
        }
    }
}

impl ReconnectConfig {
    #[must_use]
    pub fn new(fast_failure_window: Duration, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            fast_failure_window,
            min_delay,
            max_delay,
        }
    }
}
