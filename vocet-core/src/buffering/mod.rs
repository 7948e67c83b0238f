//! Lock-free SPSC ring buffer for PCM samples.
//!
//! Uses `ringbuf::HeapRb<i16>` which provides a wait-free `push_slice`
//! safe to call from a real-time source callback.

pub mod frame;

use ringbuf::{traits::Split, HeapRb};

pub use ringbuf::traits::{Consumer, Producer};

/// Type alias for the producer half — held by the sample source.
pub type SampleProducer = ringbuf::HeapProd<i16>;

/// Type alias for the consumer half — held by the pipeline thread.
pub type SampleConsumer = ringbuf::HeapCons<i16>;

/// Buffer capacity: 2^20 = 1 048 576 i16 samples ≈ 131 s at 8 kHz.
/// Generous headroom so bursty sources never drop while the encoder runs.
pub const RING_CAPACITY: usize = 1 << 20;

/// Create a matched producer/consumer pair backed by a heap-allocated ring buffer.
///
/// # Panics
/// Never panics — `HeapRb` construction cannot fail for reasonable capacities.
pub fn create_sample_ring() -> (SampleProducer, SampleConsumer) {
    HeapRb::<i16>::new(RING_CAPACITY).split()
}
