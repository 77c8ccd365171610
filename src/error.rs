use thiserror::Error;

/// Failures establishing or using a voice session
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("transport connect to {server} failed: {reason}")]
    Transport { server: String, reason: String },

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("timed out waiting for the server ready signal")]
    ReadyTimeout,

    #[error("a connect attempt is already in progress")]
    AlreadyConnecting,

    #[error("already connected")]
    AlreadyConnected,

    #[error("not connected")]
    NotConnected,

    #[error("send failed: {0}")]
    Send(String),
}

/// Failures joining a channel
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("channel not found: {0}")]
    NotFound(String),

    #[error("timed out joining channel {channel} after {attempts} attempts")]
    Timeout { channel: String, attempts: u32 },

    #[error("not connected")]
    NotConnected,

    #[error("join request for {channel} failed: {reason}")]
    Request { channel: String, reason: String },
}

/// An operation was requested in a state that does not allow it
#[derive(Debug, Error)]
#[error("invalid state: {0}")]
pub struct InvalidState(pub String);

/// Capture or playback device initialization failed
#[derive(Debug, Error)]
#[error("audio setup failed: {0}")]
pub struct AudioSetupError(pub String);
