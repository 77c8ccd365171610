use super::config::SessionConfig;
use super::joiner::{ChannelJoiner, ConnectionMembership};
use super::status::{SessionEvent, SessionStatus};
use crate::error::{ConnectionError, JoinError};
use crate::voice::{ChannelRef, VoiceConnection, VoiceConnector, VoiceEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const EVENT_BUFFER: usize = 256;

/// Owns one connection lifetime to a voice server
///
/// Status is published through a `watch` channel and only this type writes
/// it. Voice, text and terminal error events are broadcast to subscribers
/// once the session is ready.
///
/// A post-ready error marks the session disconnected before the error event is
/// broadcast. Nothing reconnects automatically; the owner decides.
pub struct SessionClient {
    config: SessionConfig,
    connector: Arc<dyn VoiceConnector>,
    joiner: ChannelJoiner,
    connection: RwLock<Option<Arc<dyn VoiceConnection>>>,
    status: Arc<watch::Sender<SessionStatus>>,
    events: broadcast::Sender<SessionEvent>,
    connecting: AtomicBool,
    event_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionClient {
    pub fn new(config: SessionConfig, connector: Arc<dyn VoiceConnector>) -> Self {
        let (status, _) = watch::channel(SessionStatus::default());
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let joiner = ChannelJoiner::new(config.join_attempts, config.join_poll_interval());

        Self {
            config,
            connector,
            joiner,
            connection: RwLock::new(None),
            status: Arc::new(status),
            events,
            connecting: AtomicBool::new(false),
            event_task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current status snapshot
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Receiver that observes every status change
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Subscribe to voice, message and error events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Connect, authenticate and wait for the server ready signal.
    ///
    /// Only one attempt may be in flight; a concurrent call fails with
    /// `AlreadyConnecting`.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        if self.status.borrow().connected {
            return Err(ConnectionError::AlreadyConnected);
        }
        if self.connecting.swap(true, Ordering::SeqCst) {
            return Err(ConnectionError::AlreadyConnecting);
        }

        let result = self.establish().await;
        self.connecting.store(false, Ordering::SeqCst);

        if let Err(e) = &result {
            warn!("Connection to {} failed: {}", self.config.address(), e);
        }
        result
    }

    async fn establish(&self) -> Result<(), ConnectionError> {
        self.status.send_modify(|s| s.connection_attempted = true);

        info!(
            "Connecting to {} as {} via {}",
            self.config.address(),
            self.config.username,
            self.connector.name()
        );

        let mut connection =
            self.connector
                .connect(&self.config)
                .await
                .map_err(|e| ConnectionError::Transport {
                    server: self.config.address(),
                    reason: format!("{:#}", e),
                })?;

        let Some(mut events) = connection.take_events() else {
            abandon(connection.as_ref()).await;
            return Err(ConnectionError::Handshake(
                "connection event stream unavailable".to_string(),
            ));
        };

        if let Err(e) = connection.authenticate(&self.config.username).await {
            abandon(connection.as_ref()).await;
            return Err(ConnectionError::Handshake(format!("{:#}", e)));
        }

        let ready = tokio::time::timeout(self.config.ready_timeout(), await_ready(&mut events));
        match ready.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                abandon(connection.as_ref()).await;
                return Err(e);
            }
            Err(_) => {
                abandon(connection.as_ref()).await;
                return Err(ConnectionError::ReadyTimeout);
            }
        }

        let connection: Arc<dyn VoiceConnection> = Arc::from(connection);
        let current_channel = connection.current_channel().await;
        let stale = self.connection.write().await.replace(Arc::clone(&connection));
        if let Some(stale) = stale {
            abandon(stale.as_ref()).await;
        }

        // Must be set before the forwarder runs; it may clear it
        self.status.send_modify(|s| {
            s.connected = true;
            s.current_channel = current_channel;
        });

        let task = tokio::spawn(forward_events(
            events,
            Arc::clone(&self.status),
            self.events.clone(),
        ));
        if let Some(previous) = self.event_task.lock().await.replace(task) {
            previous.abort();
        }

        info!("Connected to {}", self.config.address());

        Ok(())
    }

    /// Tear down the session.
    ///
    /// Status reads disconnected before the transport is closed. On a session
    /// that never connected (or is already disconnected) this does nothing.
    pub async fn disconnect(&self) {
        self.status.send_modify(|s| {
            s.connected = false;
            s.current_channel = None;
        });

        let connection = self.connection.write().await.take();
        let Some(connection) = connection else {
            debug!("Disconnect requested without a live connection; nothing to do");
            return;
        };

        if let Some(task) = self.event_task.lock().await.take() {
            task.abort();
        }

        if let Err(e) = connection.disconnect().await {
            warn!("Error while closing connection to {}: {:#}", self.config.address(), e);
        }

        info!("Disconnected from {}", self.config.address());
    }

    pub async fn join_channel_by_name(&self, name: &str) -> Result<ChannelRef, JoinError> {
        let connection = self.live_connection().await.ok_or(JoinError::NotConnected)?;
        let target = connection.channel_by_name(name).await;
        self.join(connection.as_ref(), target, name).await
    }

    pub async fn join_channel_by_id(&self, id: u32) -> Result<ChannelRef, JoinError> {
        let connection = self.live_connection().await.ok_or(JoinError::NotConnected)?;
        let target = connection.channel_by_id(id).await;
        self.join(connection.as_ref(), target, &id.to_string()).await
    }

    async fn join(
        &self,
        connection: &dyn VoiceConnection,
        target: Option<ChannelRef>,
        key: &str,
    ) -> Result<ChannelRef, JoinError> {
        info!("Joining channel {}", key);
        let channel = self
            .joiner
            .join(&ConnectionMembership(connection), target, key)
            .await?;
        self.status
            .send_modify(|s| s.current_channel = Some(channel.clone()));
        info!("Joined channel {} ({})", channel.name, channel.id);
        Ok(channel)
    }

    /// Send `text` to the channel the user currently occupies
    pub async fn send_message_to_current_channel(&self, text: &str) -> Result<(), ConnectionError> {
        let connection = self
            .live_connection()
            .await
            .ok_or(ConnectionError::NotConnected)?;
        let channel = connection
            .current_channel()
            .await
            .ok_or_else(|| ConnectionError::Send("user is not in any channel".to_string()))?;

        connection
            .send_message(&channel, text)
            .await
            .map_err(|e| ConnectionError::Send(format!("{:#}", e)))?;

        debug!("Sent message to {}: {}", channel.name, text);
        Ok(())
    }

    /// Forward captured PCM to the server
    pub async fn send_voice(&self, pcm: &[u8]) -> Result<(), ConnectionError> {
        let connection = self
            .live_connection()
            .await
            .ok_or(ConnectionError::NotConnected)?;
        connection
            .send_voice(pcm)
            .await
            .map_err(|e| ConnectionError::Send(format!("{:#}", e)))
    }

    async fn live_connection(&self) -> Option<Arc<dyn VoiceConnection>> {
        if !self.status.borrow().connected {
            return None;
        }
        self.connection.read().await.clone()
    }
}

/// Consume handshake events until the server is ready.
///
/// The receiver moves to the forwarding task only after this returns, so a
/// handshake error can never be reported twice.
async fn await_ready(events: &mut mpsc::Receiver<VoiceEvent>) -> Result<(), ConnectionError> {
    loop {
        match events.recv().await {
            Some(VoiceEvent::Ready) => return Ok(()),
            Some(VoiceEvent::Error(reason)) => return Err(ConnectionError::Handshake(reason)),
            Some(other) => debug!("Ignoring event before ready: {:?}", other),
            None => {
                return Err(ConnectionError::Handshake(
                    "connection closed before ready".to_string(),
                ))
            }
        }
    }
}

async fn abandon(connection: &dyn VoiceConnection) {
    if let Err(e) = connection.disconnect().await {
        debug!("Error closing abandoned connection: {:#}", e);
    }
}

async fn forward_events(
    mut events: mpsc::Receiver<VoiceEvent>,
    status: Arc<watch::Sender<SessionStatus>>,
    subscribers: broadcast::Sender<SessionEvent>,
) {
    debug!("Session event forwarding started");

    while let Some(event) = events.recv().await {
        match event {
            VoiceEvent::Ready => debug!("Ignoring repeated ready signal"),
            VoiceEvent::Voice(frame) => {
                // No subscribers is not an error
                let _ = subscribers.send(SessionEvent::Voice(frame));
            }
            VoiceEvent::Message(message) => {
                info!("Message from {}: {}", message.sender, message.text);
                let _ = subscribers.send(SessionEvent::Message(message));
            }
            VoiceEvent::ChannelChanged(channel) => {
                info!("Now in channel {} ({})", channel.name, channel.id);
                status.send_modify(|s| s.current_channel = Some(channel));
            }
            VoiceEvent::Error(reason) => {
                error!("Session terminated: {}", reason);
                status.send_modify(|s| s.connected = false);
                let _ = subscribers.send(SessionEvent::Error(reason));
                return;
            }
        }
    }

    let was_connected = status.borrow().connected;
    if was_connected {
        error!("Session event stream closed unexpectedly");
        status.send_modify(|s| s.connected = false);
        let _ = subscribers.send(SessionEvent::Error("connection closed".to_string()));
    }
}
