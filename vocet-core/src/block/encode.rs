//! `EncodeBlock` — fixed 160:1 decimating speech encoder.
//!
//! Consumes contiguous 8 kHz PCM and emits one 50-bit [`BitFrame`] per 160
//! input samples. Frames are only ever encoded whole: leftover input shorter
//! than one frame stays unconsumed until more arrives, and an invocation
//! that cannot complete even one frame reports zero progress rather than an
//! error.

use tracing::{debug, trace};

use crate::block::{Progress, StreamBlock};
use crate::buffering::frame::BitFrame;
use crate::codec::{CodecAdapter, SpeechCodec, FRAME_SAMPLES};
use crate::error::Result;

/// Decimating encoder block. Owns its codec state exclusively; construct one
/// block (and one codec) per stream.
pub struct EncodeBlock {
    adapter: CodecAdapter,
    frames_out: u64,
}

impl EncodeBlock {
    /// Input samples consumed per output frame produced.
    pub const DECIMATION: usize = FRAME_SAMPLES;

    /// Wrap a freshly constructed codec. The codec must not be shared with
    /// any other block — the primitive is stateful and non-reentrant.
    pub fn new(codec: Box<dyn SpeechCodec>) -> Self {
        Self {
            adapter: CodecAdapter::new(codec),
            frames_out: 0,
        }
    }

    /// Total frames produced over this block's lifetime.
    pub fn frames_out(&self) -> u64 {
        self.frames_out
    }
}

impl StreamBlock for EncodeBlock {
    type Input = i16;
    type Output = BitFrame;

    fn process(&mut self, input: &[i16], output: &mut [BitFrame]) -> Result<Progress> {
        let n = (input.len() / FRAME_SAMPLES).min(output.len());
        if n == 0 {
            trace!(
                available = input.len(),
                capacity = output.len(),
                "stalled — waiting for a whole frame of input and a free slot"
            );
            return Ok(Progress::stalled());
        }

        for (i, slot) in output.iter_mut().enumerate().take(n) {
            let group = &input[i * FRAME_SAMPLES..(i + 1) * FRAME_SAMPLES];
            // Each frame is encoded atomically; an error here is fatal and
            // leaves already-written slots unreported.
            let payload = self.adapter.encode(group)?;
            *slot = BitFrame::from_payload(&payload);
        }

        self.frames_out += n as u64;
        debug!(frames = n, consumed = n * FRAME_SAMPLES, "encoded");

        Ok(Progress {
            consumed: n * FRAME_SAMPLES,
            produced: n,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::codec::{EnvelopeCodec, PAYLOAD_BYTES};
    use crate::error::VocetError;

    /// Scripted codec that records every frame it sees and returns payloads
    /// tagged with the call index, so tests can observe exactly what the
    /// block forwards and in which order.
    struct ScriptedCodec {
        seen: Arc<Mutex<Vec<Vec<i16>>>>,
        fail_after: Option<usize>,
    }

    impl ScriptedCodec {
        fn new() -> (Self, Arc<Mutex<Vec<Vec<i16>>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    seen: Arc::clone(&seen),
                    fail_after: None,
                },
                seen,
            )
        }

        fn failing_after(calls: usize) -> Self {
            Self {
                seen: Arc::new(Mutex::new(Vec::new())),
                fail_after: Some(calls),
            }
        }
    }

    impl SpeechCodec for ScriptedCodec {
        fn encode_frame(&mut self, samples: &[i16; FRAME_SAMPLES]) -> Result<[u8; PAYLOAD_BYTES]> {
            let mut seen = self.seen.lock();
            if self.fail_after == Some(seen.len()) {
                return Err(VocetError::CodecFailure("scripted failure".into()));
            }
            seen.push(samples.to_vec());
            let mut payload = [0u8; PAYLOAD_BYTES];
            payload[0] = seen.len() as u8;
            Ok(payload)
        }

        fn decode_frame(&mut self, _payload: &[u8; PAYLOAD_BYTES]) -> Result<[i16; FRAME_SAMPLES]> {
            Ok([0; FRAME_SAMPLES])
        }
    }

    fn slots(n: usize) -> Vec<BitFrame> {
        vec![BitFrame::default(); n]
    }

    fn ramp(len: usize) -> Vec<i16> {
        (0..len).map(|i| i as i16).collect()
    }

    #[test]
    fn short_input_stalls_regardless_of_capacity() {
        let mut block = EncodeBlock::new(Box::new(EnvelopeCodec::new()));
        let mut out = slots(64);
        let progress = block.process(&ramp(159), &mut out).unwrap();
        assert!(progress.is_stalled());
    }

    #[test]
    fn empty_input_stalls() {
        let mut block = EncodeBlock::new(Box::new(EnvelopeCodec::new()));
        let mut out = slots(4);
        assert!(block.process(&[], &mut out).unwrap().is_stalled());
    }

    #[test]
    fn no_output_capacity_stalls() {
        let mut block = EncodeBlock::new(Box::new(EnvelopeCodec::new()));
        let mut out = slots(0);
        assert!(block.process(&ramp(320), &mut out).unwrap().is_stalled());
    }

    #[test]
    fn two_whole_frames_in_one_call() {
        let (codec, _seen) = ScriptedCodec::new();
        let mut block = EncodeBlock::new(Box::new(codec));
        let mut out = slots(4);
        let input = ramp(320);

        let progress = block.process(&input, &mut out).unwrap();
        assert_eq!(progress.consumed, 320);
        assert_eq!(progress.produced, 2);
        // Frames come out in input order.
        assert_eq!(out[0].to_payload()[0], 1);
        assert_eq!(out[1].to_payload()[0], 2);
        assert_eq!(block.frames_out(), 2);
    }

    #[test]
    fn ratio_invariant_holds_under_odd_input_lengths() {
        let mut block = EncodeBlock::new(Box::new(EnvelopeCodec::new()));
        for len in [0usize, 1, 159, 160, 161, 319, 320, 481, 799, 1600] {
            let input = ramp(len);
            let mut out = slots(8);
            let p = block.process(&input, &mut out).unwrap();
            assert_eq!(p.consumed, FRAME_SAMPLES * p.produced, "len={len}");
            assert!(p.consumed <= input.len(), "len={len}");
            assert!(p.produced <= out.len(), "len={len}");
        }
    }

    #[test]
    fn output_capacity_caps_consumption() {
        let (codec, _seen) = ScriptedCodec::new();
        let mut block = EncodeBlock::new(Box::new(codec));
        let mut out = slots(1);
        let progress = block.process(&ramp(480), &mut out).unwrap();
        assert_eq!(progress.consumed, 160);
        assert_eq!(progress.produced, 1);
    }

    #[test]
    fn groups_are_sliced_at_exact_offsets() {
        let (codec, seen) = ScriptedCodec::new();
        let mut block = EncodeBlock::new(Box::new(codec));
        let input = ramp(320);
        let mut out = slots(2);
        block.process(&input, &mut out).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], input[..160].to_vec());
        assert_eq!(seen[1], input[160..320].to_vec());
    }

    #[test]
    fn codec_failure_aborts_the_call() {
        let mut block = EncodeBlock::new(Box::new(ScriptedCodec::failing_after(1)));
        let mut out = slots(4);
        let err = block.process(&ramp(480), &mut out).unwrap_err();
        assert!(matches!(err, VocetError::CodecFailure(_)));
    }

    #[test]
    fn encode_then_unpack_yields_fifty_binary_values() {
        let mut block = EncodeBlock::new(Box::new(EnvelopeCodec::new()));
        let input: Vec<i16> = (0..160).map(|i| ((i * 197) % 7000) as i16 - 3500).collect();
        let mut out = slots(1);
        let p = block.process(&input, &mut out).unwrap();
        assert_eq!(p.produced, 1);
        assert_eq!(out[0].bits().len(), 50);
        assert!(out[0].bits().iter().all(|&b| b <= 1));
    }
}
