use std::time::Duration;

use tokio::time::Instant;

/// Latest sequence number seen from the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SequenceTracker {
    latest: Option<u64>,
}

impl SequenceTracker {
    pub(crate) fn get(self) -> Option<u64> {
        self.latest
    }

    /// Record a sequence number. The tracked value never moves backwards; returns
    /// `false` when `sequence` was older than what is already tracked.
    pub(crate) fn observe(&mut self, sequence: u64) -> bool {
        match self.latest {
            Some(latest) if sequence < latest => false,
            _ => {
                self.latest = Some(sequence);
                true
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.latest = None;
    }
}

/// Per-client session bookkeeping owned by the driver.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) sequence: SequenceTracker,
    pub(crate) session_id: Option<String>,
    pub(crate) latency: Option<Duration>,
    pub(crate) last_disconnect_at: Option<Instant>,
    pub(crate) closed_by_local: bool,
}

impl Session {
    /// Forget everything tied to the previous transport.
    pub(crate) fn reset(&mut self) {
        self.sequence.reset();
        self.session_id = None;
        self.latency = None;
    }

    pub(crate) fn info(&self) -> SessionInfo {
        SessionInfo {
            sequence: self.sequence.get(),
            session_id: self.session_id.clone(),
            latency: self.latency,
        }
    }
}

/// Snapshot of the session for diagnostics.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    /// Last sequence number received on the current transport
    pub sequence: Option<u64>,
    /// Session id announced by the `READY` dispatch
    pub session_id: Option<String>,
    /// Round trip of the most recent acknowledged heartbeat
    pub latency: Option<Duration>,
}
