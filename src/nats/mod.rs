//! NATS voice transport
//!
//! Handshake and channel joins are request/reply on `picom.session.auth` and
//! `picom.channel.join`; voice and text are published per channel.

pub mod client;
pub mod messages;

pub use client::NatsConnector;
pub use messages::{AuthReply, AuthRequest, JoinReply, JoinRequest, TextPacket, VoicePacket};
