use std::future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use url::Url;

use super::backoff::Backoff;
use super::close_code::{CloseAction, classify};
use super::config::Config;
#[cfg(feature = "tracing")]
use super::error::GatewayError;
use super::event::{ConnectionState, Event};
use super::handler::MessageHandler;
use super::heartbeat::Heartbeat;
use super::session::{Session, SessionInfo};
use crate::Result;
use crate::error::Error;
use crate::ws::{Connector, Transport, TransportEvent, WsError};

type PendingOpen = BoxFuture<'static, Result<Transport>>;

/// Requests from [`crate::gateway::Client`] handles.
#[derive(Debug)]
pub(crate) enum Command {
    Connect(oneshot::Sender<Result<()>>),
    Disconnect,
    Send(String),
}

/// Owns the connection lifecycle.
///
/// Runs as a single task: commands, transport notifications, heartbeat ticks, the
/// in-flight transport open and the reconnect timer are all serialized through one
/// `select!`, so no state here is ever touched concurrently.
pub(crate) struct Driver {
    config: Config,
    url: Url,
    connector: Arc<dyn Connector>,
    state: ConnectionState,
    session: Session,
    heartbeat: Heartbeat,
    backoff: Backoff,
    transport: Option<Transport>,
    pending_open: Option<PendingOpen>,
    /// Caller waiting on the in-flight open
    waiter: Option<oneshot::Sender<Result<()>>>,
    reconnect_at: Option<Instant>,
    events: broadcast::Sender<Event>,
    state_tx: watch::Sender<ConnectionState>,
    info_tx: watch::Sender<SessionInfo>,
}

impl Driver {
    pub(crate) fn new(
        config: Config,
        url: Url,
        connector: Arc<dyn Connector>,
        events: broadcast::Sender<Event>,
        state_tx: watch::Sender<ConnectionState>,
        info_tx: watch::Sender<SessionInfo>,
    ) -> Self {
        let backoff = Backoff::new(config.reconnect.clone());
        Self {
            config,
            url,
            connector,
            state: ConnectionState::Idle,
            session: Session::default(),
            heartbeat: Heartbeat::default(),
            backoff,
            transport: None,
            pending_open: None,
            waiter: None,
            reconnect_at: None,
            events,
            state_tx,
            info_tx,
        }
    }

    /// Process events until every client handle is gone.
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Connect(reply)) => self.connect(Some(reply)),
                    Some(Command::Disconnect) => {
                        self.reconnect_at = None;
                        self.disconnect();
                    }
                    Some(Command::Send(frame)) => self.send(frame),
                    None => break,
                },

                result = opening(&mut self.pending_open) => {
                    self.pending_open = None;
                    self.on_open(result);
                }

                event = next_event(&mut self.transport) => self.on_transport_event(event),

                () = self.heartbeat.tick() => self.on_heartbeat_tick(),

                () = reconnect_timer(self.reconnect_at) => {
                    self.reconnect_at = None;
                    self.connect(None);
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Gateway client dropped, shutting down");

        self.disconnect();
    }

    /// Start opening a transport unless one is already open or opening.
    fn connect(&mut self, reply: Option<oneshot::Sender<Result<()>>>) {
        if !self.state.is_idle() {
            if let Some(reply) = reply {
                _ = reply.send(Ok(()));
            }
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %self.url, "Connecting to gateway");

        self.session.closed_by_local = false;
        self.reconnect_at = None;
        self.set_state(ConnectionState::Connecting);

        let connector = Arc::clone(&self.connector);
        let url = self.url.clone();
        self.pending_open = Some(Box::pin(async move { connector.open(&url).await }));
        self.waiter = reply;
    }

    fn on_open(&mut self, result: Result<Transport>) {
        match result {
            Ok(transport) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(url = %self.url, "Connected to gateway");

                self.session.reset();
                self.publish_session();
                self.transport = Some(transport);
                self.set_state(ConnectionState::Connected {
                    since: Instant::now(),
                });

                if let Some(waiter) = self.waiter.take() {
                    _ = waiter.send(Ok(()));
                }
                self.emit(Event::Connected);
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %e, "WebSocket connect error");

                if let Some(waiter) = self.waiter.take() {
                    _ = waiter.send(Err(e));
                }
                self.reconnect();
            }
        }
    }

    /// Tear everything down and go idle. Returns the previous disconnect time.
    fn disconnect(&mut self) -> Option<Instant> {
        let previous = self.session.last_disconnect_at.replace(Instant::now());
        self.session.closed_by_local = true;

        if let Some(transport) = self.transport.take() {
            transport.close();
        }

        if self.pending_open.take().is_some()
            && let Some(waiter) = self.waiter.take()
        {
            _ = waiter.send(Err(WsError::Cancelled.into()));
        }

        self.heartbeat.disarm();

        if self.state.is_connected() {
            self.emit(Event::Disconnected);
        }
        self.set_state(ConnectionState::Idle);

        previous
    }

    /// Disconnect, then connect again now or after a backoff delay.
    fn reconnect(&mut self) {
        let previous = self.disconnect();
        let now = Instant::now();

        match self.backoff.delay(previous, now) {
            Some(delay) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(?delay, "Reconnecting too fast, waiting before the next attempt");

                self.reconnect_at = Some(now + delay);
            }
            None => self.connect(None),
        }
    }

    fn send(&self, frame: String) {
        let sent = self
            .transport
            .as_ref()
            .ok_or_else(|| Error::from(WsError::ConnectionClosed))
            .and_then(|transport| transport.send(frame));

        if let Err(e) = sent {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "Dropping outgoing frame");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
        }
    }

    fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Message(text) => self.on_message(&text),
            TransportEvent::Error(e) => {
                if !self.state.is_idle() {
                    #[cfg(feature = "tracing")]
                    tracing::error!(error = %e, "WebSocket error");
                }
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
            }
            TransportEvent::Closed { code, reason } => self.on_close(code, reason),
        }
    }

    fn on_message(&mut self, text: &str) {
        if self.state.is_idle() {
            return;
        }
        let Some(transport) = &self.transport else {
            return;
        };

        MessageHandler {
            config: &self.config,
            session: &mut self.session,
            heartbeat: &mut self.heartbeat,
            transport,
            events: &self.events,
        }
        .handle(text);

        self.publish_session();
    }

    fn on_heartbeat_tick(&mut self) {
        let Some(transport) = &self.transport else {
            self.heartbeat.disarm();
            return;
        };

        if let Err(e) = self.heartbeat.beat(transport, self.session.sequence.get()) {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "Unable to send heartbeat");
            #[cfg(not(feature = "tracing"))]
            let _ = &e;
        }
    }

    fn on_close(&mut self, code: Option<u16>, reason: String) {
        if self.state.is_idle() {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::error!(?code, %reason, "WebSocket closed");

        self.transport = None;

        match classify(code) {
            CloseAction::Fatal(code) => {
                self.disconnect();

                #[cfg(feature = "tracing")]
                tracing::error!(error = %GatewayError::Fatal(code), "Fatal error, no reconnect");

                self.emit(Event::Fatal { code, reason });
            }
            CloseAction::Reconnect if self.session.closed_by_local => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Closed locally, no reconnect");

                self.disconnect();
            }
            CloseAction::Reconnect => self.reconnect(),
        }
    }

    fn emit(&self, event: Event) {
        // No subscribers is not an error
        _ = self.events.send(event);
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        self.state_tx.send_replace(state);
    }

    fn publish_session(&self) {
        let info = self.session.info();
        self.info_tx.send_if_modified(|current| {
            if *current == info {
                return false;
            }
            *current = info;
            true
        });
    }
}

async fn opening(pending: &mut Option<PendingOpen>) -> Result<Transport> {
    match pending {
        Some(open) => open.await,
        None => future::pending().await,
    }
}

async fn next_event(transport: &mut Option<Transport>) -> TransportEvent {
    match transport {
        Some(transport) => transport
            .recv()
            .await
            .unwrap_or_else(|| TransportEvent::Closed {
                code: None,
                reason: String::new(),
            }),
        None => future::pending().await,
    }
}

async fn reconnect_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}
