//! Speech codec abstraction.
//!
//! The `SpeechCodec` trait decouples the streaming blocks from any specific
//! compression primitive (the built-in envelope placeholder, an FFI-backed
//! vocoder, etc.).
//!
//! `&mut self` on `encode_frame`/`decode_frame` intentionally expresses that
//! codec state is mutable and call-order-dependent. Each block instance owns
//! its codec exclusively — the primitive is non-reentrant, so there is no
//! shared-handle wrapper; run parallel streams by constructing one codec per
//! block.

pub mod adapter;
pub mod envelope;

pub use adapter::CodecAdapter;
pub use envelope::EnvelopeCodec;

use crate::error::Result;

/// Samples per frame: 20 ms at 8 kHz, the unit of encode work.
pub const FRAME_SAMPLES: usize = 160;

/// Bytes per compressed payload. Carries [`FRAME_BITS`] meaningful bits;
/// the remaining 6 bits of the last byte are padding.
pub const PAYLOAD_BYTES: usize = 7;

/// Meaningful bits per compressed frame.
pub const FRAME_BITS: usize = 50;

/// The only sample rate the codec contract is defined for.
pub const CODEC_SAMPLE_RATE: u32 = 8_000;

/// Contract for speech compression primitives.
///
/// Implementations must be deterministic given the same state history: a
/// freshly constructed codec fed the same frame sequence twice produces
/// identical payloads.
pub trait SpeechCodec: Send + 'static {
    /// Compress one frame of 8 kHz PCM into a 7-byte payload.
    ///
    /// # Errors
    /// A well-formed frame is expected to always encode; an error here means
    /// the primitive's internal state can no longer be trusted, and callers
    /// treat it as fatal to the stream rather than retrying.
    fn encode_frame(&mut self, samples: &[i16; FRAME_SAMPLES]) -> Result<[u8; PAYLOAD_BYTES]>;

    /// Reconstruct one frame of 8 kHz PCM from a 7-byte payload.
    ///
    /// # Errors
    /// Same fatality semantics as [`SpeechCodec::encode_frame`].
    fn decode_frame(&mut self, payload: &[u8; PAYLOAD_BYTES]) -> Result<[i16; FRAME_SAMPLES]>;
}
