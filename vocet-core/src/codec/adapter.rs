//! `CodecAdapter` — bridges the streaming blocks to the codec primitive.
//!
//! The adapter is the sole owner of one codec state for the lifetime of its
//! block: constructed with the block, mutated only by sequential encode and
//! decode calls, released when the block is dropped (on every exit path,
//! including panic unwind — `Box` drop is the release).
//!
//! It also enforces the call contract the primitive itself cannot: frames
//! must be exactly [`FRAME_SAMPLES`] samples and payloads exactly
//! [`PAYLOAD_BYTES`] bytes. Anything else is an upstream buffering bug, and
//! partial-length encoding has no defined semantics, so the adapter refuses
//! rather than truncating or padding.

use crate::codec::{SpeechCodec, FRAME_SAMPLES, PAYLOAD_BYTES};
use crate::error::{Result, VocetError};

/// Exclusive owner of one codec state.
pub struct CodecAdapter {
    codec: Box<dyn SpeechCodec>,
}

impl CodecAdapter {
    /// Take ownership of a freshly constructed codec.
    pub fn new(codec: Box<dyn SpeechCodec>) -> Self {
        Self { codec }
    }

    /// Encode exactly one frame of PCM.
    ///
    /// # Errors
    /// - [`VocetError::ContractViolation`] if `pcm` is not exactly 160
    ///   samples — a caller error, not a recoverable runtime condition.
    /// - Any primitive error, which the caller must treat as fatal to the
    ///   stream.
    pub fn encode(&mut self, pcm: &[i16]) -> Result<[u8; PAYLOAD_BYTES]> {
        let frame: &[i16; FRAME_SAMPLES] =
            pcm.try_into().map_err(|_| VocetError::ContractViolation {
                expected: FRAME_SAMPLES,
                got: pcm.len(),
            })?;
        self.codec.encode_frame(frame)
    }

    /// Decode exactly one compressed payload back to PCM.
    ///
    /// # Errors
    /// Mirrors [`CodecAdapter::encode`]: wrong payload length is a
    /// `ContractViolation`, primitive errors are fatal.
    pub fn decode(&mut self, payload: &[u8]) -> Result<[i16; FRAME_SAMPLES]> {
        let payload: &[u8; PAYLOAD_BYTES] =
            payload
                .try_into()
                .map_err(|_| VocetError::ContractViolation {
                    expected: PAYLOAD_BYTES,
                    got: payload.len(),
                })?;
        self.codec.decode_frame(payload)
    }
}

impl std::fmt::Debug for CodecAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecAdapter").finish_non_exhaustive()
    }
}
