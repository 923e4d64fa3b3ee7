//! Gateway close codes and the reconnect policy attached to them.

/// Close codes the gateway sends in its close frame.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
pub enum CloseCode {
    UnknownError = 4000,
    UnknownOpcode = 4001,
    DecodeError = 4002,
    NotAuthenticated = 4003,
    AuthenticationFailed = 4004,
    AlreadyAuthenticated = 4005,
    InvalidSeq = 4007,
    RateLimited = 4008,
    SessionTimedOut = 4009,
    InvalidShard = 4010,
    ShardingRequired = 4011,
    InvalidApiVersion = 4012,
    InvalidIntents = 4013,
    DisallowedIntents = 4014,
}

impl CloseCode {
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Whether reconnecting cannot succeed without operator intervention.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }
}

impl TryFrom<u16> for CloseCode {
    type Error = u16;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Ok(match code {
            4000 => Self::UnknownError,
            4001 => Self::UnknownOpcode,
            4002 => Self::DecodeError,
            4003 => Self::NotAuthenticated,
            4004 => Self::AuthenticationFailed,
            4005 => Self::AlreadyAuthenticated,
            4007 => Self::InvalidSeq,
            4008 => Self::RateLimited,
            4009 => Self::SessionTimedOut,
            4010 => Self::InvalidShard,
            4011 => Self::ShardingRequired,
            4012 => Self::InvalidApiVersion,
            4013 => Self::InvalidIntents,
            4014 => Self::DisallowedIntents,
            other => return Err(other),
        })
    }
}

/// What to do after the transport closed.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Tear down and stay down
    Fatal(CloseCode),
    /// Run the reconnect cycle, unless the close was initiated locally
    Reconnect,
}

/// Classify a transport close code. A missing or unrecognised code is recoverable.
#[must_use]
pub fn classify(code: Option<u16>) -> CloseAction {
    match code.map(CloseCode::try_from) {
        Some(Ok(code)) if code.is_fatal() => CloseAction::Fatal(code),
        _ => CloseAction::Reconnect,
    }
}
