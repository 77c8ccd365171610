use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::Path;
use tracing::info;

/// A 16-bit PCM WAV file loaded into memory, used as a looped microphone
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file {}", path.display()))?;

        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            bail!(
                "{} is {}-bit {:?}; only 16-bit integer PCM is supported",
                path.display(),
                spec.bits_per_sample,
                spec.sample_format
            );
        }

        let samples = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let frames = samples.len() as f64 / spec.channels.max(1) as f64;
        let duration_seconds = frames / spec.sample_rate.max(1) as f64;

        info!(
            "Loaded capture source {}: {:.1}s, {}Hz, {} channels",
            path.display(),
            duration_seconds,
            spec.sample_rate,
            spec.channels
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Files are played as-is; there is no resampling
    pub fn ensure_format(&self, sample_rate: u32, channels: u16) -> Result<()> {
        if self.sample_rate != sample_rate || self.channels != channels {
            bail!(
                "Expected {}Hz {}ch, got {}Hz {}ch",
                sample_rate,
                channels,
                self.sample_rate,
                self.channels
            );
        }
        if self.samples.is_empty() {
            bail!("{} contains no samples", self.path);
        }
        Ok(())
    }
}
