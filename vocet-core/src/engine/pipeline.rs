//! Blocking pipeline loop.
//!
//! ## Pipeline stages (per iteration)
//!
//! ```text
//! 1. Drain ring buffer → scratch [i16]
//! 2. RateConverter → 8 kHz PCM, appended to the pending buffer
//! 3. EncodeBlock::process until it stalls (whole frames only)
//! 4. Broadcast a FrameEvent per productive invocation
//! ```
//!
//! The loop runs on a dedicated blocking thread owned by `StreamEngine`.
//! A fatal block error (contract violation, codec failure) aborts the
//! stream: the primitive's state can no longer be trusted and there is no
//! way to tell a transient fault from a permanent one, so nothing is
//! retried. Leftover input shorter than one frame at shutdown is discarded —
//! partial frames are never encoded.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::{
    block::{EncodeBlock, StreamBlock},
    buffering::{frame::BitFrame, Consumer, SampleConsumer},
    codec::CODEC_SAMPLE_RATE,
    engine::EngineConfig,
    events::{EngineStatus, EngineStatusEvent, FrameEvent},
    resample::RateConverter,
};

pub struct PipelineDiagnostics {
    pub samples_in: AtomicUsize,
    pub samples_converted: AtomicUsize,
    pub process_calls: AtomicUsize,
    pub stalled_calls: AtomicUsize,
    pub frames_emitted: AtomicUsize,
}

impl Default for PipelineDiagnostics {
    fn default() -> Self {
        Self {
            samples_in: AtomicUsize::new(0),
            samples_converted: AtomicUsize::new(0),
            process_calls: AtomicUsize::new(0),
            stalled_calls: AtomicUsize::new(0),
            frames_emitted: AtomicUsize::new(0),
        }
    }
}

impl PipelineDiagnostics {
    pub fn reset(&self) {
        self.samples_in.store(0, Ordering::Relaxed);
        self.samples_converted.store(0, Ordering::Relaxed);
        self.process_calls.store(0, Ordering::Relaxed);
        self.stalled_calls.store(0, Ordering::Relaxed);
        self.frames_emitted.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            samples_in: self.samples_in.load(Ordering::Relaxed),
            samples_converted: self.samples_converted.load(Ordering::Relaxed),
            process_calls: self.process_calls.load(Ordering::Relaxed),
            stalled_calls: self.stalled_calls.load(Ordering::Relaxed),
            frames_emitted: self.frames_emitted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsSnapshot {
    pub samples_in: usize,
    pub samples_converted: usize,
    pub process_calls: usize,
    pub stalled_calls: usize,
    pub frames_emitted: usize,
}

/// All context the pipeline needs, passed as one struct so the thread
/// closure stays tidy.
pub struct PipelineContext {
    pub config: EngineConfig,
    pub block: EncodeBlock,
    pub consumer: SampleConsumer,
    pub running: Arc<AtomicBool>,
    pub frame_tx: broadcast::Sender<FrameEvent>,
    pub status_tx: broadcast::Sender<EngineStatusEvent>,
    pub status: Arc<Mutex<EngineStatus>>,
    pub seq: Arc<AtomicU64>,
    pub diagnostics: Arc<PipelineDiagnostics>,
}

/// Samples drained from the ring per iteration: 40 ms at 8 kHz.
const DRAIN_CHUNK: usize = 320;

/// Sleep when the ring is empty (avoids busy-wait burning a core).
const SLEEP_EMPTY_MS: u64 = 5;

/// Run the blocking pipeline until `ctx.running` becomes false or the
/// stream aborts.
pub fn run(mut ctx: PipelineContext) {
    info!(
        source_rate = ctx.config.source_sample_rate,
        codec_rate = CODEC_SAMPLE_RATE,
        "pipeline started"
    );

    // Initialise resampler (passthrough when the source is already 8 kHz)
    let mut converter = match RateConverter::new(
        ctx.config.source_sample_rate,
        CODEC_SAMPLE_RATE,
        DRAIN_CHUNK,
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to create resampler: {e}");
            set_status(&ctx, EngineStatus::Error, Some(e.to_string()));
            return;
        }
    };

    // Scratch buffer, reused each iteration
    let mut raw = vec![0i16; DRAIN_CHUNK];
    // 8 kHz samples awaiting a whole frame
    let mut pending: Vec<i16> = Vec::with_capacity(DRAIN_CHUNK * 4);
    // Pre-allocated output slots for one block invocation
    let mut slots = vec![BitFrame::default(); ctx.config.max_frames_per_call.max(1)];

    loop {
        // ── 0. Check running flag ─────────────────────────────────────────
        if !ctx.running.load(Ordering::Relaxed) {
            break;
        }

        // ── 1. Drain ring buffer ──────────────────────────────────────────
        let n = ctx.consumer.pop_slice(&mut raw);

        if n == 0 {
            // Nothing to process — yield to avoid burning 100 % CPU
            std::thread::sleep(std::time::Duration::from_millis(SLEEP_EMPTY_MS));
            continue;
        }

        ctx.diagnostics.samples_in.fetch_add(n, Ordering::Relaxed);

        // ── 2. Convert to the codec rate ──────────────────────────────────
        let converted = converter.process(&raw[..n]);
        if converted.is_empty() {
            // Partial chunk — waiting for more data to fill rubato's input
            continue;
        }
        ctx.diagnostics
            .samples_converted
            .fetch_add(converted.len(), Ordering::Relaxed);
        pending.extend_from_slice(&converted);

        // ── 3. Run the block until it stalls ──────────────────────────────
        loop {
            ctx.diagnostics.process_calls.fetch_add(1, Ordering::Relaxed);
            match ctx.block.process(&pending, &mut slots) {
                Ok(progress) if progress.is_stalled() => {
                    ctx.diagnostics.stalled_calls.fetch_add(1, Ordering::Relaxed);
                    break;
                }
                Ok(progress) => {
                    pending.drain(..progress.consumed);
                    emit_frames(&mut ctx, &slots[..progress.produced]);
                }
                Err(e) => {
                    // Fatal: codec state may be inconsistent; abort the
                    // stream instead of retrying.
                    error!(error = %e, "block failed — aborting stream");
                    set_status(&ctx, EngineStatus::Error, Some(e.to_string()));
                    ctx.running.store(false, Ordering::SeqCst);
                    return;
                }
            }
        }

        debug!(raw = n, pending = pending.len(), "processed input chunk");
    }

    if !pending.is_empty() {
        // Less than one whole frame by construction; never encoded.
        debug!(
            leftover = pending.len(),
            "discarding sub-frame leftover at shutdown"
        );
    }

    let snap = ctx.diagnostics.snapshot();
    info!(
        samples_in = snap.samples_in,
        samples_converted = snap.samples_converted,
        process_calls = snap.process_calls,
        stalled_calls = snap.stalled_calls,
        frames_emitted = snap.frames_emitted,
        "pipeline stopped — diagnostics"
    );
}

fn emit_frames(ctx: &mut PipelineContext, frames: &[BitFrame]) {
    let seq = ctx.seq.fetch_add(1, Ordering::Relaxed);
    let event = FrameEvent {
        seq,
        frames: frames.to_vec(),
    };
    ctx.diagnostics
        .frames_emitted
        .fetch_add(frames.len(), Ordering::Relaxed);
    // Send fails only when no subscriber exists; the stream keeps running.
    let _ = ctx.frame_tx.send(event);
}

fn set_status(ctx: &PipelineContext, new_status: EngineStatus, detail: Option<String>) {
    *ctx.status.lock() = new_status;
    let _ = ctx.status_tx.send(EngineStatusEvent {
        status: new_status,
        detail,
    });
}
