// Integration tests for WAV capture sources
//
// Fixtures are written into a temp directory with hound.

use anyhow::Result;
use picom::audio::{AudioBackendConfig, AudioBackendFactory, AudioFile, AudioSource};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_wav(dir: &Path, name: &str, sample_rate: u32, channels: u16, samples: &[i16]) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &sample in samples {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let samples: Vec<i16> = (0..48000).map(|i| (i % 100) as i16).collect();
    let path = write_wav(dir.path(), "mic.wav", 48000, 1, &samples);

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 48000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 48000);
    assert!((audio.duration_seconds - 1.0).abs() < 0.001);
    assert!(audio.path.contains("mic.wav"));

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    let result = AudioFile::open(&path);

    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_ensure_format_rejects_mismatch() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "stereo.wav", 16000, 2, &[1, 2, 3, 4]);
    let audio = AudioFile::open(&path)?;

    assert!(audio.ensure_format(16000, 2).is_ok());
    assert!(audio.ensure_format(48000, 2).is_err());
    assert!(audio.ensure_format(16000, 1).is_err());

    Ok(())
}

#[test]
fn test_ensure_format_rejects_empty_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "empty.wav", 48000, 1, &[]);
    let audio = AudioFile::open(&path)?;

    assert!(audio.ensure_format(48000, 1).is_err());

    Ok(())
}

#[test]
fn test_factory_uses_matching_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "mic.wav", 48000, 1, &[1, 2, 3]);

    let capture = AudioBackendFactory::capture(
        AudioSource::File(path),
        AudioBackendConfig::default(),
    )?;
    assert_eq!(capture.name(), "wav-file");

    Ok(())
}

#[test]
fn test_factory_rejects_wrong_rate_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "mic.wav", 8000, 1, &[1, 2, 3]);

    let result = AudioBackendFactory::capture(
        AudioSource::File(path),
        AudioBackendConfig::default(),
    );
    assert!(result.is_err());

    Ok(())
}
