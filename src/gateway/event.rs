use serde_json::Value;
use tokio::time::Instant;

use super::close_code::CloseCode;

/// Notifications delivered to subscribers of a [`crate::gateway::Client`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The transport opened. The protocol handshake may still be in progress.
    Connected,
    /// A connected transport was torn down.
    Disconnected,
    /// The gateway accepted IDENTIFY and announced the session.
    Ready,
    /// An application event dispatched by the gateway.
    Message {
        /// Dispatch event name, e.g. `READY` or `MESSAGE_CREATE`
        event: String,
        /// Event data
        payload: Value,
    },
    /// The gateway closed with a code that rules out reconnecting. No further
    /// events follow until [`crate::gateway::Client::connect`] is called again.
    Fatal {
        /// Close code sent by the gateway
        code: CloseCode,
        /// Close reason sent by the gateway
        reason: String,
    },
}

/// Connection state tracking.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport and no timers
    Idle,
    /// Transport handshake in flight
    Connecting,
    /// Transport open
    Connected {
        /// When the transport opened
        since: Instant,
    },
}

impl ConnectionState {
    /// Check if the transport is currently open.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}
