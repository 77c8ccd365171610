use super::backend::{AudioBackendConfig, AudioCapture, AudioFrame};
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

const FRAME_BUFFER: usize = 50;

/// Capture that emits one frame per frame period while resumed
///
/// Frames come from a looped sample buffer, or are silent when the buffer is
/// empty.
pub struct PacedCapture {
    config: AudioBackendConfig,
    samples: Arc<Vec<i16>>,
    resumed: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    name: &'static str,
}

impl PacedCapture {
    pub fn silence(config: AudioBackendConfig) -> Self {
        Self::with_samples(config, Vec::new(), "silence")
    }

    pub fn looping(config: AudioBackendConfig, samples: Vec<i16>) -> Self {
        Self::with_samples(config, samples, "wav-file")
    }

    fn with_samples(config: AudioBackendConfig, samples: Vec<i16>, name: &'static str) -> Self {
        Self {
            config,
            samples: Arc::new(samples),
            resumed: Arc::new(AtomicBool::new(false)),
            task: None,
            name,
        }
    }
}

#[async_trait::async_trait]
impl AudioCapture for PacedCapture {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.task.is_some() {
            bail!("Already capturing");
        }
        if self.config.frame_duration_ms == 0 || self.config.samples_per_frame() == 0 {
            bail!("Capture frames must hold at least one sample");
        }

        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let config = self.config.clone();
        let samples = Arc::clone(&self.samples);
        let resumed = Arc::clone(&self.resumed);
        let frame_len = config.samples_per_frame();

        info!(
            "Starting {} capture ({}Hz, {} channels, {}ms frames)",
            self.name, config.sample_rate, config.channels, config.frame_duration_ms
        );

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(config.frame_duration_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut cursor = 0usize;
            let mut timestamp_ms = 0u64;

            loop {
                ticker.tick().await;
                timestamp_ms += config.frame_duration_ms;

                if !resumed.load(Ordering::SeqCst) {
                    continue;
                }

                let frame_samples = if samples.is_empty() {
                    vec![0i16; frame_len]
                } else {
                    let mut out = Vec::with_capacity(frame_len);
                    while out.len() < frame_len {
                        out.push(samples[cursor]);
                        cursor = (cursor + 1) % samples.len();
                    }
                    out
                };

                let frame = AudioFrame {
                    samples: frame_samples,
                    sample_rate: config.sample_rate,
                    channels: config.channels,
                    timestamp_ms,
                };

                if tx.send(frame).await.is_err() {
                    break;
                }
            }
        }));

        Ok(rx)
    }

    fn resume(&self) {
        self.resumed.store(true, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.resumed.store(false, Ordering::SeqCst);
    }

    fn is_resumed(&self) -> bool {
        self.resumed.load(Ordering::SeqCst)
    }

    async fn stop(&mut self) -> Result<()> {
        self.pause();
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Stopped {} capture", self.name);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        self.name
    }
}

impl Drop for PacedCapture {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
