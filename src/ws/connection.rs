#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use async_trait::async_trait;
use futures::{SinkExt as _, StreamExt as _};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use url::Url;

use super::error::WsError;
use super::traits::{Connector, Outbound, Transport, TransportEvent, TransportPeer};
use crate::Result;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// [`Connector`] backed by `tokio-tungstenite`.
///
/// Each opened transport is served by a background task that forwards text frames
/// in both directions and reports the close frame (or stream end) exactly once.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn open(&self, url: &Url) -> Result<Transport> {
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(WsError::Connection)?;

        let (transport, peer) = Transport::pair();
        tokio::spawn(pump(ws_stream, peer));

        Ok(transport)
    }
}

/// Shuttle frames between the socket and the transport channels until either side ends.
async fn pump(ws_stream: WsStream, mut peer: TransportPeer) {
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        #[cfg(feature = "tracing")]
                        tracing::trace!(%text, "Received WebSocket text message");

                        if peer.inbound.send(TransportEvent::Message(text.as_str().to_owned())).is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame.map_or((None, String::new()), |frame| {
                            (Some(u16::from(frame.code)), frame.reason.as_str().to_owned())
                        });
                        _ = peer.inbound.send(TransportEvent::Closed { code, reason });
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary frames carry compressed payloads, which are not negotiated.
                        // Pings are answered by tungstenite itself.
                    }
                    Some(Err(e)) => {
                        _ = peer.inbound.send(TransportEvent::Error(WsError::Connection(e).into()));
                        _ = peer.inbound.send(TransportEvent::Closed { code: None, reason: String::new() });
                        break;
                    }
                    None => {
                        _ = peer.inbound.send(TransportEvent::Closed { code: None, reason: String::new() });
                        break;
                    }
                }
            }

            outbound = peer.outbound.recv() => {
                match outbound {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            _ = peer.inbound.send(TransportEvent::Error(WsError::Connection(e).into()));
                        }
                    }
                    Some(Outbound::Close) => {
                        // The remote's close reply is reported through the read half.
                        if let Err(e) = write.close().await {
                            _ = peer.inbound.send(TransportEvent::Error(WsError::Connection(e).into()));
                        }
                    }
                    None => {
                        // Transport handle dropped: the gateway no longer wants this connection
                        _ = write.close().await;
                        break;
                    }
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("WebSocket pump terminated");
}
