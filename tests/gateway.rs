#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests"
)]

//! Lifecycle tests against an in-memory transport under simulated time.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use discord_gateway::Result;
use discord_gateway::gateway::{Client, CloseCode, Config, ConnectionState, Event, OpCode};
use discord_gateway::types::Url;
use discord_gateway::ws::{Connector, Outbound, Transport, TransportEvent, TransportPeer, WsError};
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, sleep, timeout};

const TOKEN: &str = "test-token";

/// Connector handing the far end of every opened transport to the test.
struct MockConnector {
    peers: mpsc::UnboundedSender<TransportPeer>,
    /// Number of upcoming opens that should fail
    failures: Arc<AtomicUsize>,
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, _url: &Url) -> Result<Transport> {
        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(WsError::ConnectionClosed.into());
        }

        let (transport, peer) = Transport::pair();
        self.peers.send(peer).unwrap();
        Ok(transport)
    }
}

struct Harness {
    client: Client,
    peers: mpsc::UnboundedReceiver<TransportPeer>,
    events: broadcast::Receiver<Event>,
    failures: Arc<AtomicUsize>,
}

impl Harness {
    fn new() -> Self {
        let (peers_tx, peers) = mpsc::unbounded_channel();
        let failures = Arc::new(AtomicUsize::new(0));
        let connector = MockConnector {
            peers: peers_tx,
            failures: Arc::clone(&failures),
        };
        let config = Config::builder()
            .token(TOKEN.to_owned())
            .url("ws://gateway.test/")
            .build();

        let client = Client::with_connector(config, connector).unwrap();
        let events = client.subscribe();

        Self {
            client,
            peers,
            events,
            failures,
        }
    }

    /// Connect and return the peer of the opened transport.
    async fn connected(&mut self) -> TransportPeer {
        self.client.connect().await.unwrap();
        assert_eq!(self.next_event().await, Event::Connected);
        self.next_peer().await.unwrap()
    }

    /// Wait up to `within` of simulated time for the next transport to be opened.
    async fn next_peer_within(&mut self, within: Duration) -> Option<TransportPeer> {
        timeout(within, self.peers.recv()).await.ok().flatten()
    }

    async fn next_peer(&mut self) -> Option<TransportPeer> {
        self.next_peer_within(Duration::from_millis(1)).await
    }

    async fn next_event(&mut self) -> Event {
        timeout(Duration::from_secs(1), self.events.recv())
            .await
            .unwrap()
            .unwrap()
    }
}

fn send(peer: &TransportPeer, frame: &Value) {
    peer.inbound
        .send(TransportEvent::Message(frame.to_string()))
        .unwrap();
}

fn close(peer: &TransportPeer, code: Option<u16>) {
    peer.inbound
        .send(TransportEvent::Closed {
            code,
            reason: "closed by test".to_owned(),
        })
        .unwrap();
}

async fn next_outbound(peer: &mut TransportPeer) -> Outbound {
    timeout(Duration::from_secs(120), peer.outbound.recv())
        .await
        .unwrap()
        .unwrap()
}

async fn next_frame(peer: &mut TransportPeer) -> Value {
    match next_outbound(peer).await {
        Outbound::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

fn hello(interval: u64) -> Value {
    json!({ "op": 10, "s": null, "t": null, "d": { "heartbeat_interval": interval } })
}

fn dispatch(event: &str, sequence: u64, data: &Value) -> Value {
    json!({ "op": 0, "s": sequence, "t": event, "d": data })
}

#[tokio::test(start_paused = true)]
async fn handshake_heartbeat_and_reconnect() {
    let mut harness = Harness::new();
    let mut peer = harness.connected().await;

    send(&peer, &hello(41250));
    let identify = next_frame(&mut peer).await;
    assert_eq!(identify["op"], 2);
    assert_eq!(identify["d"]["token"], TOKEN);

    let ready = json!({ "v": 6, "session_id": "session-1" });
    send(&peer, &dispatch("READY", 1, &ready));
    assert_eq!(harness.next_event().await, Event::Ready);
    assert_eq!(
        harness.next_event().await,
        Event::Message {
            event: "READY".to_owned(),
            payload: ready,
        }
    );

    let session = harness.client.session();
    assert_eq!(session.sequence, Some(1));
    assert_eq!(session.session_id.as_deref(), Some("session-1"));

    let start = Instant::now();
    let heartbeat = next_frame(&mut peer).await;
    assert_eq!(heartbeat, json!({ "op": 1, "d": 1 }));
    assert_eq!(start.elapsed(), Duration::from_millis(41250));

    sleep(Duration::from_millis(35)).await;
    send(&peer, &json!({ "op": 11, "d": null }));
    send(&peer, &dispatch("TYPING_START", 2, &json!({})));
    harness.next_event().await;

    let latency = harness.client.session().latency.unwrap();
    assert_eq!(latency, Duration::from_millis(35));

    close(&peer, Some(CloseCode::UnknownError.code()));
    assert_eq!(harness.next_event().await, Event::Disconnected);
    assert_eq!(harness.next_event().await, Event::Connected);
    assert!(harness.next_peer().await.is_some(), "expected a reconnect");
    assert_eq!(harness.client.session().sequence, None);
}

#[tokio::test(start_paused = true)]
async fn authentication_failure_is_fatal() {
    let mut harness = Harness::new();
    let peer = harness.connected().await;

    close(&peer, Some(4004));

    assert_eq!(harness.next_event().await, Event::Disconnected);
    assert_eq!(
        harness.next_event().await,
        Event::Fatal {
            code: CloseCode::AuthenticationFailed,
            reason: "closed by test".to_owned(),
        }
    );
    assert!(
        harness
            .next_peer_within(Duration::from_secs(120))
            .await
            .is_none(),
        "fatal close must not reconnect"
    );
    assert_eq!(harness.client.state(), ConnectionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_close_reconnects_once() {
    let mut harness = Harness::new();
    let peer = harness.connected().await;

    close(&peer, Some(4008));

    assert!(harness.next_peer().await.is_some(), "expected a reconnect");
    assert!(
        harness
            .next_peer_within(Duration::from_secs(120))
            .await
            .is_none(),
        "expected exactly one reconnect"
    );
    assert!(harness.client.state().is_connected());
}

#[tokio::test(start_paused = true)]
async fn fast_failures_back_off() {
    let mut harness = Harness::new();
    let first = harness.connected().await;

    close(&first, Some(4000));
    let second = harness.next_peer().await.unwrap();

    sleep(Duration::from_secs(10)).await;
    close(&second, Some(4000));

    let start = Instant::now();
    assert!(harness.next_peer().await.is_none(), "reconnect must be delayed");
    let third = harness.next_peer_within(Duration::from_secs(15)).await;
    let delay = start.elapsed();

    assert!(third.is_some(), "expected a delayed reconnect");
    assert!(
        (Duration::from_secs(3)..=Duration::from_secs(10)).contains(&delay),
        "delay {delay:?} out of range"
    );
}

#[tokio::test(start_paused = true)]
async fn slow_failures_reconnect_immediately() {
    let mut harness = Harness::new();
    let first = harness.connected().await;

    close(&first, Some(4000));
    let second = harness.next_peer().await.unwrap();

    sleep(Duration::from_secs(120)).await;
    close(&second, None);

    assert!(
        harness.next_peer().await.is_some(),
        "expected an immediate reconnect"
    );
}

#[tokio::test(start_paused = true)]
async fn disconnect_when_idle_emits_nothing() {
    let mut harness = Harness::new();

    harness.client.disconnect().unwrap();
    harness.client.disconnect().unwrap();
    harness.client.connect().await.unwrap();

    // Commands are processed in order, so the first event must come from connect
    assert_eq!(harness.next_event().await, Event::Connected);
}

#[tokio::test(start_paused = true)]
async fn local_disconnect_does_not_reconnect() {
    let mut harness = Harness::new();
    let mut peer = harness.connected().await;

    harness.client.disconnect().unwrap();

    assert_eq!(next_outbound(&mut peer).await, Outbound::Close);
    assert_eq!(harness.next_event().await, Event::Disconnected);
    assert!(
        harness
            .next_peer_within(Duration::from_secs(120))
            .await
            .is_none(),
        "local disconnect must not reconnect"
    );
    assert_eq!(harness.client.state(), ConnectionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn frames_after_disconnect_are_ignored() {
    let mut harness = Harness::new();
    let peer = harness.connected().await;

    send(&peer, &dispatch("GUILD_CREATE", 5, &json!({})));
    harness.next_event().await;
    assert_eq!(harness.client.session().sequence, Some(5));

    harness.client.disconnect().unwrap();
    assert_eq!(harness.next_event().await, Event::Disconnected);

    // The transport is gone, so a late frame cannot reach the session
    let late = peer
        .inbound
        .send(TransportEvent::Message(dispatch("GUILD_CREATE", 9, &json!({})).to_string()));
    assert!(late.is_err(), "transport must be released on disconnect");
    assert_eq!(harness.client.session().sequence, Some(5));
}

#[tokio::test(start_paused = true)]
async fn connect_failure_rejects_and_retries() {
    let mut harness = Harness::new();
    harness.failures.store(1, Ordering::SeqCst);

    let err = harness.client.connect().await.unwrap_err();
    assert!(err.downcast_ref::<WsError>().is_some());

    assert!(harness.next_peer().await.is_some(), "expected a retry");
    assert_eq!(harness.next_event().await, Event::Connected);
}

#[tokio::test(start_paused = true)]
async fn connect_is_idempotent() {
    let mut harness = Harness::new();
    let _peer = harness.connected().await;

    harness.client.connect().await.unwrap();

    assert!(harness.next_peer().await.is_none(), "second connect opened a transport");
    assert!(harness.client.state().is_connected());
}

#[tokio::test(start_paused = true)]
async fn reconnect_opcode_closes_and_reconnects() {
    let mut harness = Harness::new();
    let mut peer = harness.connected().await;

    send(&peer, &json!({ "op": 7, "d": null }));
    assert_eq!(next_outbound(&mut peer).await, Outbound::Close);

    close(&peer, Some(1000));
    assert_eq!(harness.next_event().await, Event::Disconnected);
    assert!(harness.next_peer().await.is_some(), "expected a reconnect");
}

#[tokio::test(start_paused = true)]
async fn second_hello_replaces_heartbeat_schedule() {
    let mut harness = Harness::new();
    let mut peer = harness.connected().await;

    send(&peer, &hello(30_000));
    send(&peer, &hello(45_000));
    assert_eq!(next_frame(&mut peer).await["op"], 2);
    assert_eq!(next_frame(&mut peer).await["op"], 2);

    let start = Instant::now();
    assert_eq!(next_frame(&mut peer).await, json!({ "op": 1, "d": null }));
    assert_eq!(start.elapsed(), Duration::from_secs(45));

    assert_eq!(next_frame(&mut peer).await, json!({ "op": 1, "d": null }));
    assert_eq!(start.elapsed(), Duration::from_secs(90));
}

#[tokio::test(start_paused = true)]
async fn server_requested_heartbeat_is_sent_immediately() {
    let mut harness = Harness::new();
    let mut peer = harness.connected().await;

    send(&peer, &dispatch("GUILD_CREATE", 3, &json!({})));
    send(&peer, &json!({ "op": 1, "d": null }));

    let start = Instant::now();
    assert_eq!(next_frame(&mut peer).await, json!({ "op": 1, "d": 3 }));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn send_requires_connection() {
    let mut harness = Harness::new();

    let status = json!({ "since": null, "game": null, "status": "online", "afk": false });
    let err = harness
        .client
        .send(OpCode::StatusUpdate, &status)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WsError>(),
        Some(WsError::ConnectionClosed)
    ));

    let mut peer = harness.connected().await;
    harness
        .client
        .send(OpCode::StatusUpdate, &status)
        .unwrap();

    let frame = next_frame(&mut peer).await;
    assert_eq!(frame, json!({ "op": 3, "d": status }));
}

#[tokio::test(start_paused = true)]
async fn transport_error_keeps_session() {
    let mut harness = Harness::new();
    let peer = harness.connected().await;

    peer.inbound
        .send(TransportEvent::Error(WsError::ConnectionClosed.into()))
        .unwrap();
    send(&peer, &dispatch("MESSAGE_CREATE", 2, &json!({ "content": "hi" })));

    assert_eq!(
        harness.next_event().await,
        Event::Message {
            event: "MESSAGE_CREATE".to_owned(),
            payload: json!({ "content": "hi" }),
        }
    );
    assert!(harness.client.state().is_connected());
    assert!(harness.next_peer().await.is_none(), "transport error must not reconnect");
}

#[tokio::test(start_paused = true)]
async fn malformed_dispatch_still_advances_sequence() {
    let mut harness = Harness::new();
    let peer = harness.connected().await;

    send(&peer, &json!({ "op": 0, "s": 9, "d": {} }));
    send(&peer, &dispatch("TYPING_START", 4, &json!({})));
    harness.next_event().await;

    assert_eq!(harness.client.session().sequence, Some(9));
}
