//! `EnvelopeCodec` — built-in amplitude-envelope primitive.
//!
//! A deliberately simple codec so the full streaming path (blocks, engine,
//! bit packing) can be exercised end-to-end without an external DSP library.
//! It is a real, deterministic compressor, just a crude one: per frame it
//! keeps only the amplitude envelope.
//!
//! ## Frame layout
//!
//! The 160-sample frame is split into 10 subframes of 16 samples. Each
//! subframe's peak magnitude is quantised to a 5-bit log2 level, giving
//! 10 × 5 = 50 bits, packed MSB-first into the 7-byte payload.
//!
//! ## State
//!
//! A per-subframe decay register: the emitted level never falls more than
//! one step below the previous frame's level for that subframe. This smooths
//! the envelope across frame boundaries and makes the output depend on the
//! full call history, which is exactly the state discipline real vocoders
//! impose on their callers.

use tracing::debug;

use crate::bits::{pack_frame_bits, unpack_frame_bits};
use crate::codec::{SpeechCodec, FRAME_BITS, FRAME_SAMPLES, PAYLOAD_BYTES};
use crate::error::Result;

/// Subframes per frame.
const SUBFRAMES: usize = 10;
/// Samples per subframe.
const SUBFRAME_SAMPLES: usize = FRAME_SAMPLES / SUBFRAMES;
/// Quantiser width per subframe level.
const LEVEL_BITS: usize = FRAME_BITS / SUBFRAMES;
/// Highest representable level: bit length of `i16::MIN.unsigned_abs()`.
const MAX_LEVEL: u8 = 16;

/// Amplitude-envelope codec state.
pub struct EnvelopeCodec {
    /// Last emitted level per subframe, for the cross-frame decay.
    last_levels: [u8; SUBFRAMES],
    frames_encoded: u64,
}

impl EnvelopeCodec {
    pub fn new() -> Self {
        Self {
            last_levels: [0; SUBFRAMES],
            frames_encoded: 0,
        }
    }

    /// Quantise a peak magnitude to its bit length: 0 for silence, up to 16
    /// for full scale.
    fn quantise(peak: u16) -> u8 {
        (u16::BITS - peak.leading_zeros()) as u8
    }

    /// Reconstruction amplitude for a level, the midpoint of its bucket.
    fn amplitude(level: u8) -> i16 {
        if level == 0 {
            return 0;
        }
        1i16 << (level - 1).min(14)
    }
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechCodec for EnvelopeCodec {
    fn encode_frame(&mut self, samples: &[i16; FRAME_SAMPLES]) -> Result<[u8; PAYLOAD_BYTES]> {
        let mut bits = [0u8; FRAME_BITS];

        for (i, subframe) in samples.chunks_exact(SUBFRAME_SAMPLES).enumerate() {
            let peak = subframe.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
            let raw = Self::quantise(peak);
            // Decay register: never drop more than one step per frame.
            let level = raw.max(self.last_levels[i].saturating_sub(1));
            self.last_levels[i] = level;

            for b in 0..LEVEL_BITS {
                bits[i * LEVEL_BITS + b] = (level >> (LEVEL_BITS - 1 - b)) & 1;
            }
        }

        self.frames_encoded += 1;
        if self.frames_encoded % 500 == 0 {
            debug!(frames = self.frames_encoded, "envelope codec progress");
        }

        Ok(pack_frame_bits(&bits))
    }

    fn decode_frame(&mut self, payload: &[u8; PAYLOAD_BYTES]) -> Result<[i16; FRAME_SAMPLES]> {
        let bits = unpack_frame_bits(payload);
        let mut samples = [0i16; FRAME_SAMPLES];

        for i in 0..SUBFRAMES {
            let mut level = 0u8;
            for b in 0..LEVEL_BITS {
                level = (level << 1) | bits[i * LEVEL_BITS + b];
            }
            let amp = Self::amplitude(level.min(MAX_LEVEL));

            // Alternating-sign placeholder synthesis at the envelope amplitude.
            for (j, sample) in samples[i * SUBFRAME_SAMPLES..(i + 1) * SUBFRAME_SAMPLES]
                .iter_mut()
                .enumerate()
            {
                *sample = if j % 2 == 0 { amp } else { -amp };
            }
        }

        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_of(value: i16) -> [i16; FRAME_SAMPLES] {
        [value; FRAME_SAMPLES]
    }

    #[test]
    fn silent_frame_encodes_to_all_zero_payload() {
        let mut codec = EnvelopeCodec::new();
        let payload = codec.encode_frame(&frame_of(0)).unwrap();
        assert_eq!(payload, [0u8; PAYLOAD_BYTES]);
    }

    #[test]
    fn same_sequence_from_fresh_state_is_deterministic() {
        let frames = [frame_of(0), frame_of(12_000), frame_of(3), frame_of(-800)];

        let mut first = EnvelopeCodec::new();
        let mut second = EnvelopeCodec::new();
        for frame in &frames {
            assert_eq!(
                first.encode_frame(frame).unwrap(),
                second.encode_frame(frame).unwrap()
            );
        }
    }

    #[test]
    fn output_depends_on_call_history() {
        // A quiet frame right after a loud one is held up by the decay
        // register, so it encodes differently than from fresh state.
        let loud = frame_of(i16::MAX);
        let quiet = frame_of(1);

        let mut warmed = EnvelopeCodec::new();
        warmed.encode_frame(&loud).unwrap();
        let after_loud = warmed.encode_frame(&quiet).unwrap();

        let mut fresh = EnvelopeCodec::new();
        let from_fresh = fresh.encode_frame(&quiet).unwrap();

        assert_ne!(after_loud, from_fresh);
    }

    #[test]
    fn quantiser_covers_full_i16_range() {
        assert_eq!(EnvelopeCodec::quantise(0), 0);
        assert_eq!(EnvelopeCodec::quantise(1), 1);
        assert_eq!(EnvelopeCodec::quantise(2), 2);
        assert_eq!(EnvelopeCodec::quantise(i16::MAX as u16), 15);
        assert_eq!(EnvelopeCodec::quantise(i16::MIN.unsigned_abs()), 16);
    }

    #[test]
    fn decode_reconstructs_envelope_amplitudes() {
        let mut codec = EnvelopeCodec::new();
        let mut frame = frame_of(0);
        // One loud subframe (the third), rest silent.
        for s in &mut frame[32..48] {
            *s = 4_000;
        }
        let payload = codec.encode_frame(&frame).unwrap();

        let mut decoder = EnvelopeCodec::new();
        let out = decoder.decode_frame(&payload).unwrap();

        assert!(out[..32].iter().all(|&s| s == 0));
        assert!(out[32..48].iter().all(|&s| s.unsigned_abs() > 0));
        // Reconstruction stays within one quantiser bucket of the source.
        let amp = out[32].unsigned_abs();
        assert!((2_048..=4_096).contains(&amp), "amp={amp}");
    }

    #[test]
    fn min_sample_value_does_not_overflow() {
        let mut codec = EnvelopeCodec::new();
        let payload = codec.encode_frame(&frame_of(i16::MIN)).unwrap();
        let mut decoder = EnvelopeCodec::new();
        let out = decoder.decode_frame(&payload).unwrap();
        assert!(out.iter().all(|&s| s.unsigned_abs() <= 16_384));
    }
}
