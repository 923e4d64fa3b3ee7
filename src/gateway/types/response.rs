use serde::Deserialize;
use serde_json::Value;

use super::OpCode;
use crate::Result;
use crate::gateway::error::GatewayError;

/// A decoded inbound envelope.
///
/// Decoding is split in two so the sequence number survives a payload that does
/// not fit its opcode: [`Frame::parse`] only checks the envelope and
/// [`Frame::payload`] checks `d` and `t` against `op`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Frame {
    /// Raw opcode. Values outside the known range decode as [`Payload::Other`].
    pub op: i64,
    #[serde(default, rename = "d")]
    data: Value,
    /// Sequence number, present on dispatches
    #[serde(default, rename = "s")]
    pub sequence: Option<u64>,
    #[serde(default, rename = "t")]
    event: Option<String>,
}

/// Inbound payload, keyed by opcode.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Dispatch {
        /// Event name from `t`, e.g. `READY` or `MESSAGE_CREATE`
        event: String,
        data: Value,
    },
    Heartbeat,
    Reconnect,
    InvalidSession {
        resumable: bool,
    },
    Hello(Hello),
    HeartbeatAck,
    /// An opcode the client does not expect to receive
    Other {
        op: i64,
    },
}

/// HELLO payload.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Hello {
    /// Heartbeat period in milliseconds. Zero disables heartbeating.
    #[serde(default)]
    pub heartbeat_interval: u64,
}

/// The part of the `READY` dispatch the client keeps for itself.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ready {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Dispatch event name that marks the session as established.
pub const READY_EVENT: &str = "READY";

impl Frame {
    /// Decode the envelope of a text frame.
    ///
    /// Fails with [`GatewayError::Decode`] when the text is not a JSON object with an
    /// integer `op`.
    pub fn parse(text: &str) -> Result<Self> {
        let frame = serde_json::from_str(text).map_err(GatewayError::Decode)?;
        Ok(frame)
    }

    /// Check the payload against the opcode.
    ///
    /// Fails with [`GatewayError::InvalidPayload`] when `d` or `t` do not fit.
    pub fn payload(self) -> Result<Payload> {
        let op = self.op;
        let opcode = u8::try_from(op).ok().and_then(|op| OpCode::try_from(op).ok());

        let payload = match opcode {
            Some(OpCode::Dispatch) => {
                let event = self.event.ok_or_else(|| GatewayError::InvalidPayload {
                    op,
                    reason: "dispatch frame without event name".to_owned(),
                })?;
                Payload::Dispatch {
                    event,
                    data: self.data,
                }
            }
            Some(OpCode::Heartbeat) => Payload::Heartbeat,
            Some(OpCode::Reconnect) => Payload::Reconnect,
            Some(OpCode::InvalidSession) => Payload::InvalidSession {
                resumable: self.data.as_bool().unwrap_or(false),
            },
            Some(OpCode::Hello) if !self.data.is_object() => Payload::Hello(Hello::default()),
            Some(OpCode::Hello) => {
                let hello = serde_json::from_value(self.data).map_err(|e| {
                    GatewayError::InvalidPayload {
                        op,
                        reason: e.to_string(),
                    }
                })?;
                Payload::Hello(hello)
            }
            Some(OpCode::HeartbeatAck) => Payload::HeartbeatAck,
            _ => Payload::Other { op },
        };

        Ok(payload)
    }
}
