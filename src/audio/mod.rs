pub mod backend;
pub mod capture;
pub mod file;
pub mod sink;

pub use backend::{
    AudioBackendConfig, AudioBackendFactory, AudioCapture, AudioFrame, AudioPlayback, AudioSetup,
    AudioSink, AudioSource,
};
pub use capture::PacedCapture;
pub use file::AudioFile;
pub use sink::{DiscardPlayback, WavPlayback};
