//! Voice-protocol client boundary
//!
//! The session layer talks to a voice server only through the
//! `VoiceConnector` / `VoiceConnection` traits defined here. Wire formats and
//! transport security belong to the implementations.

mod connection;
pub mod loopback;

pub use connection::{
    ChannelRef, MessageScope, TextMessage, VoiceConnection, VoiceConnector, VoiceEvent, VoiceFrame,
};
pub use loopback::{LoopbackConnector, LoopbackOp};
