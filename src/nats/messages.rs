use crate::voice::ChannelRef;
use serde::{Deserialize, Serialize};

pub const SUBJECT_AUTH: &str = "picom.session.auth";
pub const SUBJECT_JOIN: &str = "picom.channel.join";
pub const SUBJECT_LEAVE: &str = "picom.session.leave";

pub fn voice_subject(channel_id: u32) -> String {
    format!("picom.voice.{}", channel_id)
}

pub fn text_subject(channel_id: u32) -> String {
    format!("picom.text.{}", channel_id)
}

pub fn direct_subject(username: &str) -> String {
    format!("picom.text.user.{}", username)
}

/// Handshake request, answered with `AuthReply`
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthRequest {
    pub session_id: String,
    pub username: String,
    pub client: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthReply {
    pub accepted: bool,
    #[serde(default)]
    pub reason: Option<String>,
    pub root_channel: ChannelRef,
    #[serde(default)]
    pub channels: Vec<ChannelRef>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRequest {
    pub session_id: String,
    pub channel_id: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinReply {
    pub channel_id: u32,
    pub accepted: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Voice published to a channel
#[derive(Debug, Serialize, Deserialize)]
pub struct VoicePacket {
    pub session_id: String,
    pub sender: String,
    pub sequence: u32,
    pub pcm: String, // Base64-encoded PCM bytes
    pub timestamp: String, // RFC3339 timestamp
}

/// Text published to a channel or a user
#[derive(Debug, Serialize, Deserialize)]
pub struct TextPacket {
    pub session_id: String,
    pub sender: String,
    pub text: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveNotice {
    pub session_id: String,
}
