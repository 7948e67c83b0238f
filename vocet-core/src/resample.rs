//! Sample-rate conversion to the codec's 8 kHz using a rubato
//! `FastFixedIn` resampler.
//!
//! ## Design
//!
//! Sources deliver PCM at whatever rate they have (commonly 44.1 or 48 kHz).
//! The codec contract is defined for 8 kHz only, so the engine front-end
//! bridges the gap here, on the non-RT pipeline thread where allocation is
//! allowed. rubato works in f32, so i16 samples are normalised on the way in
//! and re-quantised on the way out.
//!
//! When source rate == target rate, `RateConverter` is a passthrough — no
//! rubato session is created at all.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::error;

use crate::error::{Result, VocetError};

/// Converts i16 mono PCM from one fixed sample rate to another.
pub struct RateConverter {
    /// `None` when source rate == target rate (passthrough mode).
    resampler: Option<FastFixedIn<f32>>,
    /// Accumulation buffer — holds partial input chunks between calls.
    input_buf: Vec<f32>,
    /// How many input samples rubato expects per process call.
    chunk_size: usize,
    /// Pre-allocated output buffer: `[1][output_frames_max]`.
    output_buf: Vec<Vec<f32>>,
}

impl RateConverter {
    /// Create a new converter.
    ///
    /// # Parameters
    /// - `source_rate`: Sample rate of the incoming PCM (Hz).
    /// - `target_rate`: Sample rate expected downstream (Hz).
    /// - `chunk_size`: Input frame count per rubato call (e.g. `320`).
    ///
    /// # Errors
    /// Returns `VocetError::Resample` if rubato fails to initialise.
    pub fn new(source_rate: u32, target_rate: u32, chunk_size: usize) -> Result<Self> {
        if source_rate == target_rate {
            return Ok(Self {
                resampler: None,
                input_buf: Vec::new(),
                chunk_size,
                output_buf: Vec::new(),
            });
        }

        let ratio = target_rate as f64 / source_rate as f64;

        let resampler = FastFixedIn::<f32>::new(
            ratio,
            1.0, // fixed ratio — no dynamic adjustment
            PolynomialDegree::Cubic,
            chunk_size,
            1, // mono
        )
        .map_err(|e| VocetError::Resample(format!("init: {e}")))?;

        let max_out = resampler.output_frames_max();
        let output_buf = vec![vec![0f32; max_out]; 1];

        tracing::info!(source_rate, target_rate, chunk_size, max_out, "resampling enabled");

        Ok(Self {
            resampler: Some(resampler),
            input_buf: Vec::new(),
            chunk_size,
            output_buf,
        })
    }

    /// Process incoming samples, returning converted output (may be empty).
    ///
    /// Samples are accumulated internally until a full `chunk_size` block is
    /// available for rubato. Any remainder is kept for the next call.
    ///
    /// In passthrough mode (same rates), input is returned directly.
    pub fn process(&mut self, samples: &[i16]) -> Vec<i16> {
        let Some(ref mut resampler) = self.resampler else {
            return samples.to_vec();
        };

        self.input_buf
            .extend(samples.iter().map(|&s| f32::from(s) / 32_768.0));

        let mut result = Vec::new();

        while self.input_buf.len() >= self.chunk_size {
            let input_slice = &self.input_buf[..self.chunk_size];

            match resampler.process_into_buffer(&[input_slice], &mut self.output_buf, None) {
                Ok((_consumed, produced)) => {
                    result.extend(
                        self.output_buf[0][..produced]
                            .iter()
                            .map(|&v| (v * 32_768.0).clamp(-32_768.0, 32_767.0) as i16),
                    );
                }
                Err(e) => {
                    error!("resampler process error: {e}");
                }
            }

            self.input_buf.drain(..self.chunk_size);
        }

        result
    }

    /// Returns `true` when source rate == target rate (no resampling occurs).
    pub fn is_passthrough(&self) -> bool {
        self.resampler.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_identity() {
        let mut rc = RateConverter::new(8_000, 8_000, 320).unwrap();
        assert!(rc.is_passthrough());
        let samples: Vec<i16> = (0..480).map(|i| i as i16).collect();
        let out = rc.process(&samples);
        assert_eq!(out, samples);
    }

    #[test]
    fn ratio_48k_to_8k_correct_length() {
        let mut rc = RateConverter::new(48_000, 8_000, 960).unwrap();
        assert!(!rc.is_passthrough());
        // 960 input samples at 48 kHz → ~160 at 8 kHz
        let samples = vec![0i16; 960];
        let out = rc.process(&samples);
        assert!(!out.is_empty(), "expected non-empty output");
        let expected = 160isize;
        assert!(
            (out.len() as isize - expected).unsigned_abs() <= 10,
            "output len={} expected≈{}",
            out.len(),
            expected
        );
    }

    #[test]
    fn partial_accumulation_returns_empty() {
        let mut rc = RateConverter::new(48_000, 8_000, 960).unwrap();
        // Fewer than chunk_size samples → nothing output yet
        let out = rc.process(&vec![0i16; 500]);
        assert!(
            out.is_empty(),
            "expected empty output for partial chunk, got {}",
            out.len()
        );
    }

    #[test]
    fn multiple_partial_chunks_accumulate() {
        let mut rc = RateConverter::new(48_000, 8_000, 960).unwrap();
        // Two 500-sample pushes = 1000 total ≥ 960 chunk_size → output
        let out1 = rc.process(&vec![0i16; 500]);
        assert!(out1.is_empty());
        let out2 = rc.process(&vec![0i16; 500]);
        assert!(!out2.is_empty(), "second push should trigger processing");
    }

    #[test]
    fn output_stays_within_i16_range_for_full_scale_input() {
        let mut rc = RateConverter::new(16_000, 8_000, 320).unwrap();
        let samples: Vec<i16> = (0..640)
            .map(|i| if i % 2 == 0 { i16::MAX } else { i16::MIN })
            .collect();
        // No panic and no wrap — clamping covers resampler overshoot.
        let _ = rc.process(&samples);
    }
}
