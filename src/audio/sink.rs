use super::backend::{AudioBackendConfig, AudioFrame, AudioPlayback};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{info, warn};

/// Drops everything it is given
pub struct DiscardPlayback;

#[async_trait::async_trait]
impl AudioPlayback for DiscardPlayback {
    async fn play(&mut self, _frame: &AudioFrame) -> Result<()> {
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "discard"
    }
}

/// Writes received audio to a WAV file
pub struct WavPlayback {
    path: PathBuf,
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    samples_written: usize,
}

impl WavPlayback {
    pub fn create(path: PathBuf, config: &AudioBackendConfig) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("Failed to create playback directory")?;
            }
        }

        let spec = hound::WavSpec {
            channels: config.channels,
            sample_rate: config.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

        info!("Playback recording to {}", path.display());

        Ok(Self {
            path,
            writer: Some(writer),
            samples_written: 0,
        })
    }

    pub fn samples_written(&self) -> usize {
        self.samples_written
    }
}

#[async_trait::async_trait]
impl AudioPlayback for WavPlayback {
    async fn play(&mut self, frame: &AudioFrame) -> Result<()> {
        if let Some(writer) = &mut self.writer {
            for &sample in &frame.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            self.samples_written += frame.samples.len();
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
            info!(
                "Playback file {} closed ({} samples)",
                self.path.display(),
                self.samples_written
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}

impl Drop for WavPlayback {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}
