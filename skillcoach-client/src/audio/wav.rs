//! PCM16LE WAV encoding
//!
//! Writes the canonical 44-byte RIFF header (PCM format tag, no extra
//! chunks) followed by little-endian 16-bit samples.

use crate::error::{Error, Result};

/// Size of the canonical RIFF/WAVE header
pub const WAV_HEADER_LEN: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const FORMAT_PCM: u16 = 1;

/// f32 sample in [-1.0, 1.0] to i16.
///
/// Negative values scale by 32768 and positive by 32767 so both ends of the
/// range map exactly onto the i16 limits.
pub fn to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode interleaved f32 samples as a PCM16LE WAV file
pub fn encode_pcm16(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    if channels == 0 {
        return Err(Error::Encode("Channel count is zero".to_string()));
    }
    if sample_rate == 0 {
        return Err(Error::Encode("Sample rate is zero".to_string()));
    }

    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_len = samples
        .len()
        .checked_mul(2)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| n.checked_add(WAV_HEADER_LEN as u32 - 8).is_some())
        .ok_or_else(|| Error::Encode("Recording too long for a WAV file".to_string()))?;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for &sample in samples {
        out.extend_from_slice(&to_i16(sample).to_le_bytes());
    }

    Ok(out)
}
