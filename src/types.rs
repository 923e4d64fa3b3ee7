//! Re-exported types from external crates for convenience.
//!
//! These types appear in this crate's public API and are re-exported here
//! so users don't need to add these dependencies to their `Cargo.toml`.

/// Secret string type that redacts its value in debug output, used for the session token.
pub use secrecy::{ExposeSecret, SecretString};
/// Untyped JSON value carried by dispatch events.
pub use serde_json::Value;
/// Parsed gateway endpoint.
pub use url::Url;
