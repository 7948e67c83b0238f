//! # vocet-core
//!
//! Fixed-ratio speech-frame streaming blocks, embeddable in any
//! dataflow-style audio pipeline.
//!
//! ## Architecture
//!
//! ```text
//! Caller → SPSC RingBuffer → StreamEngine pipeline thread
//!                                   │
//!                            RateConverter (→ 8 kHz)
//!                                   │
//!                     EncodeBlock::process (160 samples : 1 frame)
//!                                   │
//!                        CodecAdapter → SpeechCodec
//!                                   │
//!                      broadcast::Sender<FrameEvent>
//! ```
//!
//! The blocks themselves are runtime-agnostic: `EncodeBlock` and
//! `DecodeBlock` expose one `process(input, output) -> Progress` method and
//! can be driven by any scheduler that hands them sample and slot views.
//! `StreamEngine` is the smallest host loop that drives a single encoder
//! standalone.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod bits;
pub mod block;
pub mod buffering;
pub mod codec;
pub mod engine;
pub mod error;
pub mod events;
pub mod resample;

// Convenience re-exports for downstream crates
pub use block::{DecodeBlock, EncodeBlock, Progress, StreamBlock};
pub use buffering::frame::BitFrame;
pub use codec::{
    CodecAdapter, EnvelopeCodec, SpeechCodec, CODEC_SAMPLE_RATE, FRAME_BITS, FRAME_SAMPLES,
    PAYLOAD_BYTES,
};
pub use engine::{EngineConfig, StreamEngine};
pub use error::VocetError;
pub use events::{EngineStatus, EngineStatusEvent, FrameEvent};
