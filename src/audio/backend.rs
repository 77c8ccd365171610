use super::capture::PacedCapture;
use super::file::AudioFile;
use super::sink::{DiscardPlayback, WavPlayback};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Little-endian PCM bytes as carried by the voice transport
    pub fn to_pcm_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Rebuild a frame from little-endian PCM bytes. A trailing odd byte is
    /// dropped.
    pub fn from_pcm_bytes(pcm: &[u8], sample_rate: u32, channels: u16, timestamp_ms: u64) -> Self {
        let samples = pcm
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Self {
            samples,
            sample_rate,
            channels,
            timestamp_ms,
        }
    }
}

/// Configuration for audio capture and playback
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Frame length in milliseconds (affects latency)
    pub frame_duration_ms: u64,
}

impl AudioBackendConfig {
    /// Interleaved samples in one frame
    pub fn samples_per_frame(&self) -> usize {
        (self.sample_rate as u64 * self.frame_duration_ms / 1000) as usize * self.channels as usize
    }
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,    // Voice servers commonly run 48kHz
            channels: 1,           // Mono
            frame_duration_ms: 20, // 20ms frames
        }
    }
}

/// Microphone capture
///
/// Frames are produced only while resumed. A freshly started capture is
/// paused.
#[async_trait::async_trait]
pub trait AudioCapture: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    fn resume(&self);

    fn pause(&self);

    fn is_resumed(&self) -> bool;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Speaker output
#[async_trait::async_trait]
pub trait AudioPlayback: Send + Sync {
    async fn play(&mut self, frame: &AudioFrame) -> Result<()>;

    /// Flush and release the output
    async fn finish(&mut self) -> Result<()>;

    fn name(&self) -> &str;
}

/// Where captured audio comes from
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Silent frames at the configured pace
    Silence,
    /// A WAV file, looped
    File(PathBuf),
}

/// Where received audio goes
#[derive(Debug, Clone)]
pub enum AudioSink {
    Discard,
    /// Appended to a WAV file
    Wav(PathBuf),
}

/// Audio configuration state, as reported on the status surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioSetup {
    NotConfigured,
    SetupError,
    Configured,
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    pub fn capture(source: AudioSource, config: AudioBackendConfig) -> Result<Box<dyn AudioCapture>> {
        match source {
            AudioSource::Silence => Ok(Box::new(PacedCapture::silence(config))),
            AudioSource::File(path) => {
                let file = AudioFile::open(&path)?;
                file.ensure_format(config.sample_rate, config.channels)
                    .with_context(|| format!("Unusable capture file {}", path.display()))?;
                Ok(Box::new(PacedCapture::looping(config, file.samples)))
            }
        }
    }

    pub fn playback(sink: AudioSink, config: AudioBackendConfig) -> Result<Box<dyn AudioPlayback>> {
        match sink {
            AudioSink::Discard => Ok(Box::new(DiscardPlayback)),
            AudioSink::Wav(path) => Ok(Box::new(WavPlayback::create(path, &config)?)),
        }
    }
}
