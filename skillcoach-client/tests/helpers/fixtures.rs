//! Audio clips for upload tests

use std::f32::consts::PI;
use std::io::Cursor;

use skillcoach_client::audio::AudioClip;

/// Sine tone as a 16-bit WAV file
pub fn wav_bytes(sample_rate: u32, channels: u16, seconds: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut buffer = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut buffer), spec).unwrap();
        let frames = (sample_rate as f32 * seconds) as usize;
        for n in 0..frames {
            let value = (2.0 * PI * 440.0 * n as f32 / sample_rate as f32).sin() * 0.5;
            for _ in 0..channels {
                writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    buffer
}

pub fn wav_clip(sample_rate: u32, channels: u16, seconds: f32) -> AudioClip {
    AudioClip::encoded(
        wav_bytes(sample_rate, channels, seconds),
        Some("audio/wav".to_string()),
    )
}

/// Bytes that sniff as Ogg; never decoded on the way out
pub fn ogg_clip() -> AudioClip {
    let mut bytes = b"OggS".to_vec();
    bytes.extend_from_slice(&[0u8; 60]);
    AudioClip::encoded(bytes, Some("audio/ogg;codecs=opus".to_string()))
}
