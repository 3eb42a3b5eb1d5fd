//! Normalization of recordings for upload

use super::decoder::SimpleDecoder;
use super::mime::Container;
use super::resampler::{Resampler, TARGET_SAMPLE_RATE};
use super::{wav, AudioClip, PcmAudio};
use crate::error::{Error, Result};
use tracing::{debug, info};

/// Audio ready for the multipart `file` field
#[derive(Debug, Clone, PartialEq)]
pub struct UploadAudio {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub file_name: String,
}

impl UploadAudio {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_wav(&self) -> bool {
        Container::from_mime(&self.mime) == Container::Wav
    }
}

/// Ogg recordings are sent as-is; everything else is decoded, downmixed,
/// resampled to 16 kHz and wrapped in a WAV container.
pub fn normalize_for_upload(clip: AudioClip) -> Result<UploadAudio> {
    let pcm = match clip {
        AudioClip::Encoded { bytes, mime } => {
            if bytes.is_empty() {
                return Err(Error::BadRequest("Recording is empty".to_string()));
            }
            let container = Container::detect(&bytes, mime.as_deref());
            if container == Container::Ogg {
                debug!(bytes = bytes.len(), "Ogg recording, uploading unchanged");
                return Ok(UploadAudio {
                    bytes,
                    mime: mime.unwrap_or_else(|| container.recorder_mime().to_string()),
                    file_name: format!("voice.{}", container.extension()),
                });
            }
            SimpleDecoder::decode_bytes(bytes, mime.as_deref())?
        }
        AudioClip::Pcm(pcm) => pcm,
    };

    encode_speech_wav(pcm)
}

/// [`normalize_for_upload`] off the async runtime
pub async fn prepare_upload(clip: AudioClip) -> Result<UploadAudio> {
    tokio::task::spawn_blocking(move || normalize_for_upload(clip))
        .await
        .map_err(|e| Error::Encode(format!("Audio conversion task failed: {}", e)))?
}

fn encode_speech_wav(pcm: PcmAudio) -> Result<UploadAudio> {
    if pcm.is_empty() {
        return Err(Error::BadRequest("Recording contains no audio".to_string()));
    }

    let duration = pcm.duration();
    let mono = Resampler::downmix_to_mono(&pcm.samples, pcm.channels);
    let resampled = Resampler::resample_mono(&mono, pcm.sample_rate)?;
    let bytes = wav::encode_pcm16(&resampled, TARGET_SAMPLE_RATE, 1)?;

    info!(
        "Converted {:.1}s of {}Hz/{}ch audio to {} byte WAV",
        duration.as_secs_f64(),
        pcm.sample_rate,
        pcm.channels,
        bytes.len()
    );

    Ok(UploadAudio {
        bytes,
        mime: Container::Wav.mime().to_string(),
        file_name: "voice.wav".to_string(),
    })
}
