//! Audio resampling using rubato
//!
//! Converts recordings to the 16 kHz mono format the speech backend expects.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Sample rate of uploaded speech
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Sample rate conversion and channel downmix
pub struct Resampler;

impl Resampler {
    /// Average interleaved channels into one.
    ///
    /// A trailing partial frame is dropped.
    pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
        match channels {
            0 => Vec::new(),
            1 => samples.to_vec(),
            n => samples
                .chunks_exact(n as usize)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect(),
        }
    }

    /// Resample mono audio to [`TARGET_SAMPLE_RATE`].
    ///
    /// Input already at the target rate is returned as a copy.
    pub fn resample_mono(input: &[f32], input_rate: u32) -> Result<Vec<f32>> {
        Self::resample(input, input_rate, TARGET_SAMPLE_RATE)
    }

    fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
        if input_rate == 0 {
            return Err(Error::Decode("Sample rate is zero".to_string()));
        }
        if input.is_empty() {
            return Ok(Vec::new());
        }
        if input_rate == output_rate {
            debug!("Sample rate already at {}Hz, skipping resample", output_rate);
            return Ok(input.to_vec());
        }

        debug!("Resampling {} frames from {}Hz to {}Hz", input.len(), input_rate, output_rate);

        // One chunk covering the whole clip
        let mut resampler = FastFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0,
            PolynomialDegree::Septic,
            input.len(),
            1,
        )
        .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

        let mut output = resampler
            .process(&[input], None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

        let resampled = output.pop().unwrap_or_default();
        debug!("Resampled to {} frames", resampled.len());
        Ok(resampled)
    }
}
