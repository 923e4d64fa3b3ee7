#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;

use super::close_code::CloseCode;

/// Gateway protocol error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum GatewayError {
    /// Frame was not a valid JSON envelope
    Decode(serde_json::Error),
    /// Envelope was valid JSON but its payload does not match the opcode
    InvalidPayload {
        /// Opcode of the offending frame
        op: i64,
        /// What was wrong with it
        reason: String,
    },
    /// The gateway rejected the session with a fatal close code
    Fatal(CloseCode),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "Failed to decode gateway frame: {e}"),
            Self::InvalidPayload { op, reason } => {
                write!(f, "Invalid payload for opcode {op}: {reason}")
            }
            Self::Fatal(code) => write!(f, "Gateway closed with fatal code {code} ({})", code.code()),
        }
    }
}

impl StdError for GatewayError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GatewayError> for crate::error::Error {
    fn from(e: GatewayError) -> Self {
        crate::error::Error::with_source(crate::error::Kind::Gateway, e)
    }
}
