use std::future;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use super::types::request;
use crate::Result;
use crate::ws::Transport;

/// Owns the single periodic heartbeat timer of a session.
///
/// The timer only signals that a beat is due; the driver answers each tick with
/// [`Heartbeat::beat`] so that frames are written from the same control flow as
/// everything else.
#[derive(Debug, Default)]
pub(crate) struct Heartbeat {
    ticker: Option<Interval>,
    sent_at: Option<Instant>,
}

impl Heartbeat {
    /// Replace the current timer. A zero `period` leaves heartbeating disabled.
    pub(crate) fn arm(&mut self, period: Duration) {
        self.disarm();

        if period.is_zero() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Heartbeat disabled");
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(?period, "Setting heartbeat timer");

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
    }

    pub(crate) fn disarm(&mut self) {
        if self.ticker.take().is_some() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Heartbeat timer cancelled");
        }
    }

    /// Period of the live timer, if any.
    pub(crate) fn period(&self) -> Option<Duration> {
        self.ticker.as_ref().map(Interval::period)
    }

    /// Resolve at the next scheduled beat. Never resolves while disarmed.
    pub(crate) async fn tick(&mut self) {
        match &mut self.ticker {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => future::pending().await,
        }
    }

    /// Send one heartbeat carrying `sequence` and remember when it left.
    pub(crate) fn beat(&mut self, transport: &Transport, sequence: Option<u64>) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::debug!(?sequence, "Sending heartbeat");

        transport.send(request::heartbeat(sequence)?)?;
        self.sent_at = Some(Instant::now());
        Ok(())
    }

    /// Round trip of the last heartbeat, measured at acknowledgment.
    pub(crate) fn acknowledge(&self) -> Option<Duration> {
        self.sent_at.map(|sent_at| sent_at.elapsed())
    }
}
