//! Transport seam between the gateway state machine and a duplex message channel.

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use super::error::WsError;
use crate::Result;
use crate::error::Error;

/// Frame queued for the transport writer.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A text frame
    Text(String),
    /// Start the closing handshake
    Close,
}

/// Notification delivered by a live transport, in arrival order.
#[non_exhaustive]
#[derive(Debug)]
pub enum TransportEvent {
    /// A text frame from the remote side
    Message(String),
    /// A non-fatal transport error; only [`TransportEvent::Closed`] ends the transport
    Error(Error),
    /// The transport closed, with the close code if the remote sent one
    Closed {
        /// Close code from the close frame
        code: Option<u16>,
        /// Close reason from the close frame
        reason: String,
    },
}

/// Handle to one open transport.
///
/// Dropping the handle releases the underlying connection.
#[derive(Debug)]
pub struct Transport {
    outbound: mpsc::UnboundedSender<Outbound>,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

/// The far side of a [`Transport`]: the writer drains `outbound`, the reader feeds `inbound`.
#[non_exhaustive]
#[derive(Debug)]
pub struct TransportPeer {
    /// Frames the gateway wants written
    pub outbound: mpsc::UnboundedReceiver<Outbound>,
    /// Notifications for the gateway
    pub inbound: mpsc::UnboundedSender<TransportEvent>,
}

impl Transport {
    /// Create a transport handle together with the peer end that drives it.
    #[must_use]
    pub fn pair() -> (Self, TransportPeer) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        (
            Self {
                outbound: outbound_tx,
                inbound: inbound_rx,
            },
            TransportPeer {
                outbound: outbound_rx,
                inbound: inbound_tx,
            },
        )
    }

    /// Queue a text frame.
    pub fn send(&self, text: String) -> Result<()> {
        self.outbound
            .send(Outbound::Text(text))
            .map_err(|_e| WsError::ConnectionClosed)?;
        Ok(())
    }

    /// Ask the peer to close. The outcome arrives later as [`TransportEvent::Closed`].
    pub fn close(&self) {
        // A peer that is already gone has nothing left to close.
        _ = self.outbound.send(Outbound::Close);
    }

    /// Next notification, or `None` once the peer has gone away.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.inbound.recv().await
    }
}

/// Opens transports to a gateway endpoint.
///
/// [`crate::ws::TungsteniteConnector`] is the production implementation; tests and
/// embedders can supply their own.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Perform the transport-level handshake and return the open transport.
    async fn open(&self, url: &Url) -> Result<Transport>;
}
