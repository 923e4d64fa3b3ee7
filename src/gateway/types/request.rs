use secrecy::{ExposeSecret as _, SecretString};
use serde::{Serialize, Serializer};

use super::OpCode;
use crate::Result;

/// Outgoing frame envelope. Frames sent by the client never carry `s` or `t`.
#[derive(Debug, Serialize)]
struct Envelope<'a, D: Serialize> {
    op: OpCode,
    d: &'a D,
}

/// Serialize `data` into a frame with the given opcode.
pub fn encode<D: Serialize>(op: OpCode, data: &D) -> Result<String> {
    Ok(serde_json::to_string(&Envelope { op, d: data })?)
}

/// Heartbeat frame reporting the last sequence number seen, `null` before the first one.
pub fn heartbeat(sequence: Option<u64>) -> Result<String> {
    encode(OpCode::Heartbeat, &sequence)
}

/// Client description sent with IDENTIFY.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionProperties {
    #[serde(rename = "$os")]
    pub os: String,
    #[serde(rename = "$browser")]
    pub browser: String,
    #[serde(rename = "$device")]
    pub device: String,
}

impl ConnectionProperties {
    #[must_use]
    pub fn new(os: String, browser: String, device: String) -> Self {
        Self {
            os,
            browser,
            device,
        }
    }
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_owned(),
            browser: env!("CARGO_PKG_NAME").to_owned(),
            device: env!("CARGO_PKG_NAME").to_owned(),
        }
    }
}

/// IDENTIFY payload.
///
/// # Security
///
/// Serializing this struct exposes the token in plaintext. The frame is only ever
/// handed to the transport and must never be logged.
#[non_exhaustive]
#[derive(Debug, Serialize)]
pub struct Identify<'a> {
    #[serde(serialize_with = "expose_token")]
    pub token: &'a SecretString,
    pub properties: &'a ConnectionProperties,
    pub compress: bool,
    pub large_threshold: u16,
}

impl<'a> Identify<'a> {
    #[must_use]
    pub fn new(
        token: &'a SecretString,
        properties: &'a ConnectionProperties,
        large_threshold: u16,
    ) -> Self {
        Self {
            token,
            properties,
            compress: false,
            large_threshold,
        }
    }

    pub fn encode(&self) -> Result<String> {
        encode(OpCode::Identify, self)
    }
}

fn expose_token<S: Serializer>(
    token: &&SecretString,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(token.expose_secret())
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn heartbeat_carries_sequence_or_null() {
        let first: Value = serde_json::from_str(&heartbeat(None).unwrap()).unwrap();
        assert_eq!(first, json!({ "op": 1, "d": null }));

        let later: Value = serde_json::from_str(&heartbeat(Some(42)).unwrap()).unwrap();
        assert_eq!(later, json!({ "op": 1, "d": 42 }));
    }

    #[test]
    fn identify_exposes_token_only_on_the_wire() {
        let token = SecretString::from("secret-token".to_owned());
        let properties = ConnectionProperties::new(
            "linux".to_owned(),
            "gateway".to_owned(),
            "gateway".to_owned(),
        );
        let identify = Identify::new(&token, &properties, 250);

        assert!(!format!("{identify:?}").contains("secret-token"));

        let frame: Value = serde_json::from_str(&identify.encode().unwrap()).unwrap();
        assert_eq!(
            frame,
            json!({
                "op": 2,
                "d": {
                    "token": "secret-token",
                    "properties": {
                        "$os": "linux",
                        "$browser": "gateway",
                        "$device": "gateway"
                    },
                    "compress": false,
                    "large_threshold": 250
                }
            })
        );
    }
}
