use crate::audio::{AudioBackendConfig, AudioSink, AudioSource};
use crate::session::SessionConfig;
use anyhow::{ensure, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    #[serde(default)]
    pub transport: Transport,
    /// Health evaluation cadence in milliseconds
    #[serde(default = "default_status_poll_ms")]
    pub status_poll_ms: u64,
}

impl ServiceConfig {
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_ms)
    }
}

fn default_status_poll_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Which voice transport the service talks through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Nats,
    Loopback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Skip audio setup entirely; audio reports as not configured
    #[serde(default)]
    pub disabled: bool,
    /// Continue without audio when device setup fails
    #[serde(default)]
    pub ignore_errors: bool,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
    #[serde(default = "default_frame_duration_ms")]
    pub frame_duration_ms: u64,
    /// WAV file looped as microphone input; silence when unset
    #[serde(default)]
    pub capture_file: Option<PathBuf>,
    /// WAV file that received audio is written to; discarded when unset
    #[serde(default)]
    pub playback_file: Option<PathBuf>,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_channels() -> u16 {
    1
}

fn default_frame_duration_ms() -> u64 {
    20
}

impl AudioConfig {
    pub fn backend(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            frame_duration_ms: self.frame_duration_ms,
        }
    }

    pub fn source(&self) -> AudioSource {
        match &self.capture_file {
            Some(path) => AudioSource::File(path.clone()),
            None => AudioSource::Silence,
        }
    }

    pub fn sink(&self) -> AudioSink {
        match &self.playback_file {
            Some(path) => AudioSink::Wav(path.clone()),
            None => AudioSink::Discard,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            ignore_errors: false,
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            frame_duration_ms: default_frame_duration_ms(),
            capture_file: None,
            playback_file: None,
        }
    }
}

impl Config {
    /// Load `path` (any extension the `config` crate understands), then apply
    /// `PICOM__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("PICOM").separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.service.status_poll_ms > 0,
            "service.status_poll_ms must be greater than zero"
        );
        ensure!(
            self.audio.frame_duration_ms > 0,
            "audio.frame_duration_ms must be greater than zero"
        );
        ensure!(
            self.audio.sample_rate > 0 && self.audio.channels > 0,
            "audio.sample_rate and audio.channels must be greater than zero"
        );
        Ok(())
    }
}
