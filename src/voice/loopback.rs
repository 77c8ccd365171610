//! In-process voice server
//!
//! `LoopbackConnector` behaves like a voice server living inside the process.
//! It keeps a channel directory, confirms joins (optionally late, or never),
//! can be scripted to fail connects and handshakes, and records every
//! operation so callers can check ordering. `transport = "loopback"` uses it
//! for bench runs without a server.

use super::connection::{
    ChannelRef, MessageScope, TextMessage, VoiceConnection, VoiceConnector, VoiceEvent, VoiceFrame,
};
use crate::session::SessionConfig;
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

/// Channel every user lands in after connecting
pub const ROOT_CHANNEL_ID: u32 = 0;
pub const ROOT_CHANNEL_NAME: &str = "Root";

const EVENT_BUFFER: usize = 256;

/// Operations observed by the loopback server, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopbackOp {
    Connect { connection: u32, server: String },
    Authenticate { connection: u32, username: String },
    Join { connection: u32, channel: u32 },
    Message { connection: u32, channel: u32, text: String },
    Voice { connection: u32, bytes: usize },
    Disconnect { connection: u32 },
}

#[derive(Debug, Clone)]
struct LoopbackOptions {
    channels: Vec<ChannelRef>,
    join_lag: Option<Duration>,
    confirm_joins: bool,
    connect_delay: Option<Duration>,
    echo_voice: bool,
}

struct LiveConnection {
    id: u32,
    events: mpsc::Sender<VoiceEvent>,
}

#[derive(Default)]
struct Shared {
    ops: Mutex<Vec<LoopbackOp>>,
    live: Mutex<Vec<LiveConnection>>,
    fail_connect: Mutex<Option<String>>,
    fail_handshake: Mutex<Option<String>>,
    next_id: AtomicU32,
}

impl Shared {
    async fn record(&self, op: LoopbackOp) {
        debug!("loopback: {:?}", op);
        self.ops.lock().await.push(op);
    }
}

/// Connector for the in-process server. Clones share the same server.
#[derive(Clone)]
pub struct LoopbackConnector {
    options: LoopbackOptions,
    shared: Arc<Shared>,
}

impl LoopbackConnector {
    /// Server with only the root channel, confirming joins immediately
    pub fn new() -> Self {
        Self {
            options: LoopbackOptions {
                channels: vec![ChannelRef::new(ROOT_CHANNEL_ID, ROOT_CHANNEL_NAME)],
                join_lag: None,
                confirm_joins: true,
                connect_delay: None,
                echo_voice: false,
            },
            shared: Arc::new(Shared::default()),
        }
    }

    /// Add channels to the directory (the root channel is always present)
    pub fn with_channels<I>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = ChannelRef>,
    {
        self.options.channels.extend(
            channels
                .into_iter()
                .filter(|channel| channel.id != ROOT_CHANNEL_ID),
        );
        self
    }

    /// Confirm joins only after `lag`
    pub fn with_join_lag(mut self, lag: Duration) -> Self {
        self.options.join_lag = Some(lag);
        self
    }

    /// Accept join requests but never move the user
    pub fn without_join_confirmation(mut self) -> Self {
        self.options.confirm_joins = false;
        self
    }

    /// Delay every transport connect by `delay`
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.options.connect_delay = Some(delay);
        self
    }

    /// Send every outbound voice packet back as inbound voice
    pub fn with_echo(mut self) -> Self {
        self.options.echo_voice = true;
        self
    }

    /// Make the next transport connect fail with `reason`
    pub async fn fail_next_connect(&self, reason: impl Into<String>) {
        *self.shared.fail_connect.lock().await = Some(reason.into());
    }

    /// Make the next authentication answer with an error event
    pub async fn fail_next_handshake(&self, reason: impl Into<String>) {
        *self.shared.fail_handshake.lock().await = Some(reason.into());
    }

    /// Emit an error event on the most recent live connection
    pub async fn inject_error(&self, reason: impl Into<String>) -> bool {
        self.emit(VoiceEvent::Error(reason.into())).await
    }

    /// Deliver a text message on the most recent live connection
    pub async fn inject_message(
        &self,
        sender: impl Into<String>,
        text: impl Into<String>,
        scope: MessageScope,
    ) -> bool {
        self.emit(VoiceEvent::Message(TextMessage {
            text: text.into(),
            sender: sender.into(),
            scope,
        }))
        .await
    }

    /// Deliver inbound voice on the most recent live connection
    pub async fn inject_voice(&self, sender: impl Into<String>, pcm: Vec<u8>) -> bool {
        self.emit(VoiceEvent::Voice(VoiceFrame {
            sender: sender.into(),
            sequence: 0,
            pcm,
        }))
        .await
    }

    /// Everything the server has seen so far
    pub async fn ops(&self) -> Vec<LoopbackOp> {
        self.shared.ops.lock().await.clone()
    }

    /// Number of connections not yet disconnected
    pub async fn live_connections(&self) -> usize {
        self.shared.live.lock().await.len()
    }

    async fn emit(&self, event: VoiceEvent) -> bool {
        let live = self.shared.live.lock().await;
        match live.last() {
            Some(connection) => connection.events.send(event).await.is_ok(),
            None => false,
        }
    }
}

impl Default for LoopbackConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl VoiceConnector for LoopbackConnector {
    async fn connect(&self, config: &SessionConfig) -> Result<Box<dyn VoiceConnection>> {
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared
            .record(LoopbackOp::Connect {
                connection: id,
                server: config.address(),
            })
            .await;

        if let Some(delay) = self.options.connect_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(reason) = self.shared.fail_connect.lock().await.take() {
            bail!("{}", reason);
        }

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        self.shared.live.lock().await.push(LiveConnection {
            id,
            events: events_tx.clone(),
        });

        info!("Loopback connection {} opened for {}", id, config.address());

        Ok(Box::new(LoopbackConnection {
            id,
            options: self.options.clone(),
            shared: Arc::clone(&self.shared),
            events_tx,
            events_rx: Some(events_rx),
            current: Arc::new(Mutex::new(Some(ChannelRef::new(
                ROOT_CHANNEL_ID,
                ROOT_CHANNEL_NAME,
            )))),
            username: Mutex::new(String::new()),
        }))
    }

    fn name(&self) -> &str {
        "loopback"
    }
}

struct LoopbackConnection {
    id: u32,
    options: LoopbackOptions,
    shared: Arc<Shared>,
    events_tx: mpsc::Sender<VoiceEvent>,
    events_rx: Option<mpsc::Receiver<VoiceEvent>>,
    current: Arc<Mutex<Option<ChannelRef>>>,
    username: Mutex<String>,
}

#[async_trait::async_trait]
impl VoiceConnection for LoopbackConnection {
    fn take_events(&mut self) -> Option<mpsc::Receiver<VoiceEvent>> {
        self.events_rx.take()
    }

    async fn authenticate(&self, username: &str) -> Result<()> {
        self.shared
            .record(LoopbackOp::Authenticate {
                connection: self.id,
                username: username.to_string(),
            })
            .await;
        *self.username.lock().await = username.to_string();

        let event = match self.shared.fail_handshake.lock().await.take() {
            Some(reason) => VoiceEvent::Error(reason),
            None => VoiceEvent::Ready,
        };
        self.events_tx.send(event).await?;
        Ok(())
    }

    async fn channel_by_name(&self, name: &str) -> Option<ChannelRef> {
        self.options
            .channels
            .iter()
            .find(|channel| channel.name == name)
            .cloned()
    }

    async fn channel_by_id(&self, id: u32) -> Option<ChannelRef> {
        self.options
            .channels
            .iter()
            .find(|channel| channel.id == id)
            .cloned()
    }

    async fn current_channel(&self) -> Option<ChannelRef> {
        self.current.lock().await.clone()
    }

    async fn join(&self, channel: &ChannelRef) -> Result<()> {
        self.shared
            .record(LoopbackOp::Join {
                connection: self.id,
                channel: channel.id,
            })
            .await;

        if !self.options.confirm_joins {
            return Ok(());
        }

        match self.options.join_lag {
            None => {
                *self.current.lock().await = Some(channel.clone());
                // Nobody listening is fine; the channel is already updated
                let _ = self
                    .events_tx
                    .send(VoiceEvent::ChannelChanged(channel.clone()))
                    .await;
            }
            Some(lag) => {
                let current = Arc::clone(&self.current);
                let events = self.events_tx.clone();
                let channel = channel.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(lag).await;
                    *current.lock().await = Some(channel.clone());
                    let _ = events.send(VoiceEvent::ChannelChanged(channel)).await;
                });
            }
        }

        Ok(())
    }

    async fn send_message(&self, channel: &ChannelRef, text: &str) -> Result<()> {
        self.shared
            .record(LoopbackOp::Message {
                connection: self.id,
                channel: channel.id,
                text: text.to_string(),
            })
            .await;
        Ok(())
    }

    async fn send_voice(&self, pcm: &[u8]) -> Result<()> {
        self.shared
            .record(LoopbackOp::Voice {
                connection: self.id,
                bytes: pcm.len(),
            })
            .await;

        if self.options.echo_voice {
            let sender = self.username.lock().await.clone();
            self.events_tx
                .send(VoiceEvent::Voice(VoiceFrame {
                    sender,
                    sequence: 0,
                    pcm: pcm.to_vec(),
                }))
                .await?;
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.shared
            .record(LoopbackOp::Disconnect {
                connection: self.id,
            })
            .await;
        self.shared
            .live
            .lock()
            .await
            .retain(|connection| connection.id != self.id);
        info!("Loopback connection {} closed", self.id);
        Ok(())
    }
}
