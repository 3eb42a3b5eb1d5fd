//! Audio decoder using symphonia
//!
//! Decodes in-memory recordings (WAV, MP3, FLAC, AAC, Vorbis, WebM/Matroska
//! with a supported codec) to interleaved f32 PCM. With the `opus` feature
//! the libopus adapter is registered as well, covering WebM/Opus and
//! Ogg/Opus.

use super::mime::Container;
use super::PcmAudio;
use crate::error::{Error, Result};
use std::io::Cursor;
use std::sync::OnceLock;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecRegistry, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Codec registry: symphonia's enabled codecs, plus libopus with `opus`
pub(crate) fn codec_registry() -> &'static CodecRegistry {
    static CODEC_REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();
    CODEC_REGISTRY.get_or_init(|| {
        let mut registry = CodecRegistry::new();
        #[cfg(feature = "opus")]
        registry.register_all::<symphonia_adapter_libopus::OpusDecoder>();
        symphonia::default::register_enabled_codecs(&mut registry);
        registry
    })
}

/// Whole-buffer decoder
pub struct SimpleDecoder;

impl SimpleDecoder {
    /// Decode an entire recording held in memory.
    ///
    /// `mime` is only a format hint; the container is identified from the
    /// bytes where possible.
    pub fn decode_bytes(bytes: Vec<u8>, mime: Option<&str>) -> Result<PcmAudio> {
        if bytes.is_empty() {
            return Err(Error::Decode("Recording is empty".to_string()));
        }

        let container = Container::detect(&bytes, mime);
        debug!(
            "Decoding {} bytes ({:?}, hint {:?})",
            bytes.len(),
            container,
            mime
        );

        let mut hint = Hint::new();
        if container != Container::Unknown {
            hint.with_extension(container.extension());
        }
        if let Some(mime) = mime {
            hint.mime_type(mime);
        }

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let detected = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("Failed to recognize format: {}", e)))?;

        let mut format = detected.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let mut decoder = codec_registry()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Unsupported codec: {}", e)))?;

        let mut sample_rate = codec_params.sample_rate;
        let mut channels = codec_params.channels.map(|c| c.count() as u16);
        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate.get_or_insert(spec.rate);
                    channels.get_or_insert(spec.channels.count() as u16);

                    let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping corrupt packet: {}", e);
                }
                Err(e) => return Err(Error::Decode(format!("Decode failed: {}", e))),
            }
        }

        let sample_rate =
            sample_rate.ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;
        let channels = channels
            .filter(|c| *c > 0)
            .ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

        if samples.is_empty() {
            return Err(Error::Decode("Recording contains no audio".to_string()));
        }

        debug!(
            "Decoded {} frames at {}Hz ({} channels)",
            samples.len() / channels as usize,
            sample_rate,
            channels
        );

        Ok(PcmAudio {
            samples,
            sample_rate,
            channels,
        })
    }
}
