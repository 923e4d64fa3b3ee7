#![expect(
    clippy::module_name_repetitions,
    reason = "Re-exported names intentionally match their modules for API clarity"
)]

//! Gateway session client.
//!
//! A [`Client`] maintains a single logical session against the gateway:
//!
//! 1. [`Client::connect`] opens the transport and emits [`Event::Connected`]
//! 2. The gateway sends HELLO; the client starts heartbeating at the announced
//!    interval and sends IDENTIFY with the configured token
//! 3. The `READY` dispatch emits [`Event::Ready`]; every dispatch is delivered as
//!    [`Event::Message`]
//! 4. When the transport closes the client reconnects, backing off for a few
//!    seconds if the previous disconnect was less than a minute ago. An
//!    authentication failure is fatal and ends the session with [`Event::Fatal`].
//!
//! # Example
//!
//! ```rust, no_run
//! use discord_gateway::gateway::{Client, Config, Event};
//! use futures::StreamExt as _;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::new(Config::builder().token("bot-token".to_owned()).build())?;
//!     let mut events = Box::pin(client.events());
//!
//!     client.connect().await?;
//!
//!     while let Some(event) = events.next().await {
//!         match event? {
//!             Event::Ready => println!("session ready"),
//!             Event::Message { event, .. } => println!("dispatch {event}"),
//!             _ => {}
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod backoff;
pub mod client;
pub mod close_code;
pub mod config;
mod driver;
pub mod error;
pub mod event;
mod handler;
mod heartbeat;
pub mod session;
pub mod types;

pub use client::Client;
pub use close_code::{CloseAction, CloseCode, classify};
pub use config::{Config, DEFAULT_GATEWAY_URL, ReconnectConfig};
pub use error::GatewayError;
pub use event::{ConnectionState, Event};
pub use session::SessionInfo;
pub use types::OpCode;
pub use types::request::ConnectionProperties;
