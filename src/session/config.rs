use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a voice session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Voice server host name or address
    pub server: String,

    /// Voice server port
    /// Default: 4222
    #[serde(default = "default_port")]
    pub port: u16,

    /// Name presented to the server and to other users
    pub username: String,

    /// Client private key (PEM), used together with `cert`
    #[serde(default)]
    pub key: Option<PathBuf>,

    /// Client certificate (PEM)
    #[serde(default)]
    pub cert: Option<PathBuf>,

    /// Channel joined after every successful connect
    #[serde(default)]
    pub default_channel: Option<String>,

    /// Polls of the current channel before a join is abandoned
    /// Default: 1000
    #[serde(default = "default_join_attempts")]
    pub join_attempts: u32,

    /// Pause between join polls in milliseconds; 0 only yields to the runtime
    /// Default: 5
    #[serde(default = "default_join_poll_ms")]
    pub join_poll_ms: u64,

    /// How long to wait for the server ready signal after authenticating
    /// Default: 10 seconds
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
}

fn default_port() -> u16 {
    4222
}

fn default_join_attempts() -> u32 {
    super::joiner::DEFAULT_JOIN_ATTEMPTS
}

fn default_join_poll_ms() -> u64 {
    5
}

fn default_ready_timeout_secs() -> u64 {
    10
}

impl SessionConfig {
    /// `host:port` of the configured server
    pub fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }

    pub fn join_poll_interval(&self) -> Duration {
        Duration::from_millis(self.join_poll_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: default_port(),
            username: "picom".to_string(),
            key: None,
            cert: None,
            default_channel: None,
            join_attempts: default_join_attempts(),
            join_poll_ms: default_join_poll_ms(),
            ready_timeout_secs: default_ready_timeout_secs(),
        }
    }
}
