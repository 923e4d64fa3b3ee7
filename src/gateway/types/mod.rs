pub mod request;
pub mod response;

use serde_repr::Serialize_repr;

/// Gateway opcodes, the `op` field of every frame.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum OpCode {
    /// Application event (receive)
    Dispatch = 0,
    /// Keep-alive (send), or a request for an immediate one (receive)
    Heartbeat = 1,
    /// Start a new session (send)
    Identify = 2,
    StatusUpdate = 3,
    VoiceStateUpdate = 4,
    VoiceServerPing = 5,
    /// Resume a dropped session (send); every reconnect identifies afresh instead
    Resume = 6,
    /// The gateway asks the client to reconnect (receive)
    Reconnect = 7,
    RequestGuildMembers = 8,
    /// The session was invalidated (receive)
    InvalidSession = 9,
    /// First frame after the transport opens, carries the heartbeat interval (receive)
    Hello = 10,
    /// Acknowledges a heartbeat (receive)
    HeartbeatAck = 11,
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(op: u8) -> Result<Self, Self::Error> {
        Ok(match op {
            0 => Self::Dispatch,
            1 => Self::Heartbeat,
            2 => Self::Identify,
            3 => Self::StatusUpdate,
            4 => Self::VoiceStateUpdate,
            5 => Self::VoiceServerPing,
            6 => Self::Resume,
            7 => Self::Reconnect,
            8 => Self::RequestGuildMembers,
            9 => Self::InvalidSession,
            10 => Self::Hello,
            11 => Self::HeartbeatAck,
            other => return Err(other),
        })
    }
}
