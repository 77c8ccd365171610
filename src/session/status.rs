use crate::voice::{ChannelRef, TextMessage, VoiceFrame};
use serde::{Deserialize, Serialize};

/// Snapshot of a session's connection state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Handshake completed and no terminal error or disconnect since
    pub connected: bool,

    /// A connect was started at least once, whatever its outcome
    pub connection_attempted: bool,

    /// Channel the server last confirmed for this user
    pub current_channel: Option<ChannelRef>,
}

/// Events forwarded to session subscribers once the session is ready
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Voice(VoiceFrame),
    Message(TextMessage),
    /// The session ended unexpectedly; it will not reconnect by itself
    Error(String),
}
