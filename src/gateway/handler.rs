use std::time::Duration;

use tokio::sync::broadcast;

use super::config::Config;
use super::event::Event;
use super::heartbeat::Heartbeat;
use super::session::Session;
use super::types::request::Identify;
use super::types::response::{Frame, Payload, READY_EVENT, Ready};
use crate::ws::Transport;

/// Reacts to one inbound text frame.
///
/// Borrows everything it touches from the driver for the duration of a single
/// frame; it never owns the transport or the heartbeat timer.
pub(crate) struct MessageHandler<'handler> {
    pub(crate) config: &'handler Config,
    pub(crate) session: &'handler mut Session,
    pub(crate) heartbeat: &'handler mut Heartbeat,
    pub(crate) transport: &'handler Transport,
    pub(crate) events: &'handler broadcast::Sender<Event>,
}

impl MessageHandler<'_> {
    pub(crate) fn handle(&mut self, text: &str) {
        let frame = match Frame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%text, error = %e, "Dropping undecodable gateway frame");
                #[cfg(not(feature = "tracing"))]
                let _ = (&text, &e);
                return;
            }
        };

        if let Some(sequence) = frame.sequence
            && !self.session.sequence.observe(sequence)
        {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                sequence,
                latest = ?self.session.sequence.get(),
                "Ignoring sequence number older than the latest seen"
            );
        }

        let payload = match frame.payload() {
            Ok(payload) => payload,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%text, error = %e, "Dropping gateway frame with invalid payload");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
                return;
            }
        };

        match payload {
            Payload::Hello(hello) => {
                self.heartbeat
                    .arm(Duration::from_millis(hello.heartbeat_interval));
                self.identify();
            }
            Payload::Heartbeat => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Gateway requested an immediate heartbeat");
                self.beat();
            }
            Payload::Reconnect => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Gateway requested reconnect");
                self.transport.close();
            }
            Payload::InvalidSession { resumable } => {
                #[cfg(feature = "tracing")]
                tracing::error!(resumable, "Invalid session, forcing reconnect");
                #[cfg(not(feature = "tracing"))]
                let _ = resumable;
                self.transport.close();
            }
            Payload::HeartbeatAck => {
                if let Some(latency) = self.heartbeat.acknowledge() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(?latency, "Heartbeat acknowledged");
                    self.session.latency = Some(latency);
                }
            }
            Payload::Dispatch { event, data } => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%event, "Dispatch");

                if event == READY_EVENT {
                    let ready: Ready = serde_json::from_value(data.clone()).unwrap_or_default();

                    #[cfg(feature = "tracing")]
                    tracing::debug!(session_id = ?ready.session_id, "New session ready");

                    self.session.session_id = ready.session_id;
                    _ = self.events.send(Event::Ready);
                }

                _ = self.events.send(Event::Message {
                    event,
                    payload: data,
                });
            }
            Payload::Other { op } => {
                #[cfg(feature = "tracing")]
                tracing::warn!(op, "Unknown opcode");
                #[cfg(not(feature = "tracing"))]
                let _ = op;
            }
        }
    }

    fn identify(&self) {
        let identify = Identify::new(
            &self.config.token,
            &self.config.properties,
            self.config.large_threshold,
        );

        let sent = identify
            .encode()
            .and_then(|frame| self.transport.send(frame));
        if let Err(e) = sent {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "Unable to send IDENTIFY");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
        }
    }

    fn beat(&mut self) {
        if let Err(e) = self
            .heartbeat
            .beat(self.transport, self.session.sequence.get())
        {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "Unable to send heartbeat");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
        }
    }
}
