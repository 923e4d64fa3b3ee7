use std::sync::Arc;

use async_stream::try_stream;
use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::config::Config;
use super::driver::{Command, Driver};
use super::event::{ConnectionState, Event};
use super::session::SessionInfo;
use super::types::OpCode;
use super::types::request;
use crate::Result;
use crate::ws::{Connector, TungsteniteConnector, WsError};

/// Broadcast channel capacity for gateway events.
const BROADCAST_CAPACITY: usize = 1024;

/// Gateway client maintaining one logical session.
///
/// Cloning is cheap and every clone drives the same session. The session is shut
/// down once the last clone is dropped.
///
/// # Examples
///
/// ```rust, no_run
/// use discord_gateway::gateway::{Client, Config, Event};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = Config::builder().token("bot-token".to_owned()).build();
///     let client = Client::new(config)?;
///
///     let mut events = client.subscribe();
///     client.connect().await?;
///
///     while let Ok(event) = events.recv().await {
///         if let Event::Message { event, payload } = event {
///             println!("{event}: {payload}");
///         }
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    /// Configuration the session was started with
    config: Config,
    /// Command channel into the driver task
    commands: mpsc::UnboundedSender<Command>,
    /// Broadcast sender for gateway events
    events: broadcast::Sender<Event>,
    /// Current connection state, published by the driver
    state_rx: watch::Receiver<ConnectionState>,
    /// Current session diagnostics, published by the driver
    session_rx: watch::Receiver<SessionInfo>,
}

impl Client {
    /// Create a client that connects over `tokio-tungstenite`.
    ///
    /// The driver runs as a background task, so this must be called from within a
    /// tokio runtime. Nothing is connected until [`Client::connect`] is called.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_connector(config, TungsteniteConnector)
    }

    /// Create a client that opens transports through `connector`.
    pub fn with_connector<C: Connector>(config: Config, connector: C) -> Result<Self> {
        let url = config.validate()?;

        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let (session_tx, session_rx) = watch::channel(SessionInfo::default());

        let driver = Driver::new(
            config.clone(),
            url,
            Arc::new(connector),
            events.clone(),
            state_tx,
            session_tx,
        );
        tokio::spawn(driver.run(commands_rx));

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                commands,
                events,
                state_rx,
                session_rx,
            }),
        })
    }

    /// Open the transport.
    ///
    /// Resolves once the transport is open, before the gateway has accepted the
    /// session (watch for [`Event::Ready`] for that). Resolves immediately when the
    /// client is already connected or connecting.
    ///
    /// On failure the client keeps retrying in the background with backoff; the
    /// error returned here only reports the first attempt.
    pub async fn connect(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.command(Command::Connect(reply))?;
        rx.await.map_err(|_e| WsError::ConnectionClosed)?
    }

    /// Close the transport and stop reconnecting.
    ///
    /// Emits [`Event::Disconnected`] if the transport was open. Calling it again is
    /// harmless.
    pub fn disconnect(&self) -> Result<()> {
        self.command(Command::Disconnect)
    }

    /// Send an application frame, e.g. a presence update.
    pub fn send<D: Serialize>(&self, op: OpCode, data: &D) -> Result<()> {
        if !self.state().is_connected() {
            return Err(WsError::ConnectionClosed.into());
        }

        let frame = request::encode(op, data)?;
        self.command(Command::Send(frame))
    }

    fn command(&self, command: Command) -> Result<()> {
        self.inner
            .commands
            .send(command)
            .map_err(|_e| WsError::ConnectionClosed)?;
        Ok(())
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state_rx.borrow()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_rx.clone()
    }

    /// Snapshot of sequence number, session id and heartbeat latency.
    #[must_use]
    pub fn session(&self) -> SessionInfo {
        self.inner.session_rx.borrow().clone()
    }

    /// Subscribe to gateway events.
    ///
    /// Each call returns a new independent receiver. Events emitted before the call
    /// are not replayed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.events.subscribe()
    }

    /// Gateway events as a stream. The stream ends with a [`WsError::Lagged`]
    /// error if the consumer falls more than the channel capacity behind.
    pub fn events(&self) -> impl Stream<Item = Result<Event>> + use<> {
        let mut rx = self.subscribe();

        try_stream! {
            loop {
                match rx.recv().await {
                    Ok(event) => yield event,
                    Err(RecvError::Lagged(n)) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("Gateway event subscription lagged, missed {n} events");
                        Err(WsError::Lagged { count: n })?;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
