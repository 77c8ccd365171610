pub mod audio;
pub mod config;
pub mod error;
pub mod hardware;
pub mod health;
pub mod http;
pub mod nats;
pub mod service;
pub mod session;
pub mod talk;
pub mod voice;

pub use audio::{
    AudioBackendConfig, AudioBackendFactory, AudioCapture, AudioFile, AudioFrame, AudioPlayback,
    AudioSetup,
};
pub use config::{Config, Transport};
pub use error::{AudioSetupError, ConnectionError, InvalidState, JoinError};
pub use hardware::{Button, ButtonEvent, Edge, Hardware, VirtualPanel};
pub use health::{HealthReport, Severity, StatusAggregator};
pub use http::{create_router, AppState};
pub use nats::NatsConnector;
pub use service::{PiComService, ServiceHandle, ServiceOptions, ServiceStatus};
pub use session::{ChannelJoiner, SessionClient, SessionConfig, SessionEvent, SessionStatus};
pub use talk::{TalkAction, TalkController};
pub use voice::{ChannelRef, LoopbackConnector, VoiceConnection, VoiceConnector};
