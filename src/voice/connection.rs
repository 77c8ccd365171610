use crate::session::SessionConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A channel the session occupies or is joining
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: u32,
    pub name: String,
}

impl ChannelRef {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Inbound voice data (16-bit little-endian PCM)
#[derive(Debug, Clone)]
pub struct VoiceFrame {
    pub sender: String,
    pub sequence: u32,
    pub pcm: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageScope {
    /// Sent to the channel the receiver occupies
    Channel,
    /// Sent directly to the receiving user
    Direct,
}

#[derive(Debug, Clone)]
pub struct TextMessage {
    pub text: String,
    pub sender: String,
    pub scope: MessageScope,
}

/// Events emitted by a voice connection
#[derive(Debug, Clone)]
pub enum VoiceEvent {
    /// Handshake complete; the server accepted the session
    Ready,
    Voice(VoiceFrame),
    Message(TextMessage),
    /// The server confirmed the user moved to a channel
    ChannelChanged(ChannelRef),
    /// The connection failed; no further events follow
    Error(String),
}

/// Establishes connections to a voice server
#[async_trait::async_trait]
pub trait VoiceConnector: Send + Sync {
    /// Open the transport to the server described by `config`
    async fn connect(&self, config: &SessionConfig) -> Result<Box<dyn VoiceConnection>>;

    /// Get connector name for logging
    fn name(&self) -> &str;
}

/// One live transport-level connection to a voice server
///
/// Implementations:
/// - NATS: `crate::nats::NatsConnector`
/// - In-process: `crate::voice::LoopbackConnector`
#[async_trait::async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Hand over the event stream. Returns `None` once taken.
    fn take_events(&mut self) -> Option<mpsc::Receiver<VoiceEvent>>;

    /// Start authentication. Completion is signalled by `VoiceEvent::Ready`
    /// or `VoiceEvent::Error` on the event stream.
    async fn authenticate(&self, username: &str) -> Result<()>;

    async fn channel_by_name(&self, name: &str) -> Option<ChannelRef>;

    async fn channel_by_id(&self, id: u32) -> Option<ChannelRef>;

    /// The channel the server last confirmed for this user
    async fn current_channel(&self) -> Option<ChannelRef>;

    /// Request a move to `channel`. Returns once the request is issued, not
    /// when the server confirms it.
    async fn join(&self, channel: &ChannelRef) -> Result<()>;

    async fn send_message(&self, channel: &ChannelRef, text: &str) -> Result<()>;

    /// Send captured audio to the current channel
    async fn send_voice(&self, pcm: &[u8]) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;
}
