//! `DecodeBlock` — fixed 1:160 interpolating speech decoder.
//!
//! The companion to [`crate::block::EncodeBlock`]: consumes 50-bit
//! [`BitFrame`]s, repacks each into its 7-byte payload (zero-padding the
//! 6-bit tail) and synthesises 160 samples of 8 kHz PCM per frame. Wiring an
//! encoder's output straight into a decoder works without glue — both sides
//! use the same MSB-first bit convention.

use tracing::{debug, trace};

use crate::block::{Progress, StreamBlock};
use crate::buffering::frame::BitFrame;
use crate::codec::{CodecAdapter, SpeechCodec, FRAME_SAMPLES};
use crate::error::Result;

/// Interpolating decoder block. Owns its codec state exclusively.
pub struct DecodeBlock {
    adapter: CodecAdapter,
    frames_in: u64,
}

impl DecodeBlock {
    /// Output samples produced per input frame consumed.
    pub const INTERPOLATION: usize = FRAME_SAMPLES;

    /// Wrap a freshly constructed codec; same exclusivity rules as
    /// [`crate::block::EncodeBlock::new`].
    pub fn new(codec: Box<dyn SpeechCodec>) -> Self {
        Self {
            adapter: CodecAdapter::new(codec),
            frames_in: 0,
        }
    }

    /// Total frames consumed over this block's lifetime.
    pub fn frames_in(&self) -> u64 {
        self.frames_in
    }
}

impl StreamBlock for DecodeBlock {
    type Input = BitFrame;
    type Output = i16;

    fn process(&mut self, input: &[BitFrame], output: &mut [i16]) -> Result<Progress> {
        let n = input.len().min(output.len() / FRAME_SAMPLES);
        if n == 0 {
            trace!(
                available = input.len(),
                capacity = output.len(),
                "stalled — waiting for a frame and 160 free sample slots"
            );
            return Ok(Progress::stalled());
        }

        for (i, frame) in input.iter().enumerate().take(n) {
            let payload = frame.to_payload();
            let pcm = self.adapter.decode(&payload)?;
            output[i * FRAME_SAMPLES..(i + 1) * FRAME_SAMPLES].copy_from_slice(&pcm);
        }

        self.frames_in += n as u64;
        debug!(frames = n, produced = n * FRAME_SAMPLES, "decoded");

        Ok(Progress {
            consumed: n,
            produced: n * FRAME_SAMPLES,
        })
    }
}
