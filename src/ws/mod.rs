//! WebSocket transport infrastructure.
//!
//! The gateway state machine never touches a socket directly. It talks to a
//! [`Transport`] handle produced by a [`Connector`], which keeps the protocol logic
//! independent of the socket implementation and lets tests drive it in memory.
//!
//! # Architecture
//!
//! - [`Connector`]: Opens a transport to an endpoint
//! - [`TungsteniteConnector`]: Production connector over `tokio-tungstenite`
//! - [`Transport`]: Outbound frame queue plus ordered inbound [`TransportEvent`]s
//!
//! # Example
//!
//! ```ignore
//! let (transport, mut peer) = Transport::pair();
//! peer.inbound.send(TransportEvent::Message(r#"{"op":11}"#.to_owned()))?;
//! ```

pub mod connection;
pub mod error;
pub mod traits;

pub use connection::TungsteniteConnector;
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use traits::*;
