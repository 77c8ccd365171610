//! Voice session management
//!
//! This module provides the `SessionClient` abstraction that manages:
//! - Connecting and authenticating against a voice server
//! - Joining channels with bounded confirmation polling
//! - Forwarding voice, text and error events to subscribers
//! - A read-only status snapshot

mod client;
mod config;
pub mod joiner;
mod status;

pub use client::SessionClient;
pub use config::SessionConfig;
pub use joiner::{ChannelJoiner, ChannelMembership, DEFAULT_JOIN_ATTEMPTS};
pub use status::{SessionEvent, SessionStatus};
