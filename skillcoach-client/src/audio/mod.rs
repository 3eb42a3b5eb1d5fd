//! Voice recording pipeline
//!
//! Recordings come from a file or (with the `microphone` feature) the
//! default input device. Before upload they are normalized: Ogg passes
//! through untouched, anything else becomes 16 kHz mono PCM16LE WAV.

#[cfg(feature = "microphone")]
pub mod capture;
pub mod decoder;
pub mod mime;
pub mod pipeline;
pub mod resampler;
pub mod wav;

pub use mime::{select_mime_type, Container, PREFERRED_MIME_TYPES};
pub use pipeline::{normalize_for_upload, prepare_upload, UploadAudio};

use crate::error::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Interleaved f32 samples with their format
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmAudio {
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            n => self.samples.len() / n as usize,
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }
}

/// A recording before normalization
#[derive(Debug, Clone)]
pub enum AudioClip {
    /// Container bytes as recorded, with the recorder's MIME label if known
    Encoded { bytes: Vec<u8>, mime: Option<String> },
    /// Raw samples straight from an input device
    Pcm(PcmAudio),
}

impl AudioClip {
    pub fn encoded(bytes: Vec<u8>, mime: Option<String>) -> Self {
        AudioClip::Encoded { bytes, mime }
    }

    /// Read a recording from disk, labelled by its extension
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        if bytes.is_empty() {
            return Err(Error::BadRequest(format!(
                "Audio file {} is empty",
                path.display()
            )));
        }

        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .map(Container::from_extension)
            .filter(|c| *c != Container::Unknown)
            .map(|c| c.recorder_mime().to_string());

        debug!(path = %path.display(), bytes = bytes.len(), mime = ?mime, "Loaded audio file");
        Ok(AudioClip::Encoded { bytes, mime })
    }

    /// Container of the clip; `None` for raw PCM
    pub fn container(&self) -> Option<Container> {
        match self {
            AudioClip::Encoded { bytes, mime } => Some(Container::detect(bytes, mime.as_deref())),
            AudioClip::Pcm(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pcm_duration() {
        let pcm = PcmAudio {
            samples: vec![0.0; 32000],
            sample_rate: 16000,
            channels: 2,
        };
        assert_eq!(pcm.frames(), 16000);
        assert_eq!(pcm.duration(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_from_file_labels_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("turn.ogg");
        std::fs::write(&path, b"OggS\0\x02rest").unwrap();

        let clip = AudioClip::from_file(&path).await.unwrap();
        match &clip {
            AudioClip::Encoded { mime, .. } => {
                assert_eq!(mime.as_deref(), Some("audio/ogg;codecs=opus"))
            }
            AudioClip::Pcm(_) => panic!("expected encoded clip"),
        }
        assert_eq!(clip.container(), Some(Container::Ogg));
    }

    #[tokio::test]
    async fn test_from_file_empty_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.wav");
        std::fs::write(&path, b"").unwrap();

        assert!(matches!(
            AudioClip::from_file(&path).await,
            Err(Error::BadRequest(_))
        ));
    }
}
