//! `StreamEngine` — top-level lifecycle controller for one encoder stream.
//!
//! ## Lifecycle
//!
//! ```text
//! StreamEngine::new(config, codec_factory)
//!     └─► start()        → fresh codec built, pipeline spawned, status = Encoding
//!         └─► stop()     → running=false, worker joined, status = Stopped
//! ```
//!
//! `start()`/`stop()` are idempotent: calling them in the wrong state returns
//! an error rather than panicking.
//!
//! ## Ownership
//!
//! The codec factory builds a fresh, exclusively owned codec state for every
//! `start()` — state is never shared across streams or reused across
//! restarts. `stop()` joins the pipeline thread, so any in-flight frame
//! finishes before the codec state is dropped (released).
//!
//! Audio sourcing is the caller's problem by design: `start()` returns the
//! producer half of the sample ring, and whatever owns the samples (file
//! reader, capture callback, network receiver) pushes into it.

pub mod pipeline;

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::info;

use crate::{
    block::EncodeBlock,
    buffering::{create_sample_ring, SampleProducer},
    codec::{SpeechCodec, CODEC_SAMPLE_RATE},
    error::{Result, VocetError},
    events::{EngineStatus, EngineStatusEvent, FrameEvent},
};

/// Broadcast channel capacity: 256 events buffered for slow consumers.
const BROADCAST_CAP: usize = 256;

/// Builds one fresh codec state per stream start.
pub type CodecFactory = Box<dyn Fn() -> Result<Box<dyn SpeechCodec>> + Send + Sync>;

/// Configuration for `StreamEngine`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Sample rate of the PCM pushed into the ring (Hz). Anything other
    /// than 8000 is resampled before encoding. Default: 8000.
    pub source_sample_rate: u32,
    /// Output slots offered to the block per invocation — bounds how many
    /// frames one `FrameEvent` can carry. Default: 16.
    pub max_frames_per_call: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_sample_rate: CODEC_SAMPLE_RATE,
            max_frames_per_call: 16,
        }
    }
}

/// The top-level engine handle.
///
/// `StreamEngine` is `Send + Sync` — all fields use interior mutability, so
/// it can sit behind an `Arc` shared between a controller and event readers.
pub struct StreamEngine {
    config: EngineConfig,
    codec_factory: CodecFactory,
    /// `true` while the pipeline thread is active.
    running: Arc<AtomicBool>,
    /// Canonical status (written via Mutex, read from callers).
    status: Arc<Mutex<EngineStatus>>,
    /// Broadcast sender for frame events.
    frame_tx: broadcast::Sender<FrameEvent>,
    /// Broadcast sender for status events.
    status_tx: broadcast::Sender<EngineStatusEvent>,
    /// Monotonically increasing event sequence counter.
    seq: Arc<AtomicU64>,
    /// Shared pipeline diagnostics counters.
    diagnostics: Arc<pipeline::PipelineDiagnostics>,
    /// Worker handle, joined on stop so teardown waits for in-flight work.
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl StreamEngine {
    /// Create a new engine. Does not start encoding — call `start()`.
    pub fn new(config: EngineConfig, codec_factory: CodecFactory) -> Self {
        let (frame_tx, _) = broadcast::channel(BROADCAST_CAP);
        let (status_tx, _) = broadcast::channel(BROADCAST_CAP);

        Self {
            config,
            codec_factory,
            running: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(EngineStatus::Idle)),
            frame_tx,
            status_tx,
            seq: Arc::new(AtomicU64::new(0)),
            diagnostics: Arc::new(pipeline::PipelineDiagnostics::default()),
            worker: Mutex::new(None),
        }
    }

    /// Start the pipeline and return the sample producer for the caller to
    /// feed.
    ///
    /// # Errors
    /// - `VocetError::AlreadyRunning` if already started.
    /// - `VocetError::CodecInit` if the codec factory fails — fatal, the
    ///   engine stays stopped.
    pub fn start(&self) -> Result<SampleProducer> {
        if self.running.load(Ordering::SeqCst) {
            return Err(VocetError::AlreadyRunning);
        }

        let codec = (self.codec_factory)()?;
        let block = EncodeBlock::new(codec);

        self.diagnostics.reset();
        self.running.store(true, Ordering::SeqCst);
        self.set_status(EngineStatus::Encoding, None);

        let (producer, consumer) = create_sample_ring();

        let ctx = pipeline::PipelineContext {
            config: self.config.clone(),
            block,
            consumer,
            running: Arc::clone(&self.running),
            frame_tx: self.frame_tx.clone(),
            status_tx: self.status_tx.clone(),
            status: Arc::clone(&self.status),
            seq: Arc::clone(&self.seq),
            diagnostics: Arc::clone(&self.diagnostics),
        };

        let handle = std::thread::Builder::new()
            .name("vocet-pipeline".into())
            .spawn(move || pipeline::run(ctx))
            .map_err(VocetError::Io)?;
        *self.worker.lock() = Some(handle);

        info!("engine started — encoding");
        Ok(producer)
    }

    /// Stop the pipeline and wait for it to finish.
    ///
    /// Joining the worker guarantees the codec state is released only after
    /// any in-flight frame has completed.
    ///
    /// # Errors
    /// - `VocetError::NotRunning` if not currently running.
    pub fn stop(&self) -> Result<()> {
        let handle = self.worker.lock().take();
        if !self.running.swap(false, Ordering::SeqCst) && handle.is_none() {
            return Err(VocetError::NotRunning);
        }

        if let Some(handle) = handle {
            if handle.join().is_err() {
                self.set_status(EngineStatus::Error, Some("pipeline thread panicked".into()));
                return Err(VocetError::Other(anyhow::anyhow!(
                    "pipeline thread panicked"
                )));
            }
        }

        // A fatal stream abort already reported Error; don't mask it.
        if *self.status.lock() != EngineStatus::Error {
            self.set_status(EngineStatus::Stopped, None);
        }
        info!("engine stopped");
        Ok(())
    }

    /// Current engine status (snapshot).
    pub fn status(&self) -> EngineStatus {
        *self.status.lock()
    }

    /// Subscribe to encoded frame events.
    pub fn subscribe_frames(&self) -> broadcast::Receiver<FrameEvent> {
        self.frame_tx.subscribe()
    }

    /// Subscribe to status change events.
    pub fn subscribe_status(&self) -> broadcast::Receiver<EngineStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Snapshot of pipeline counters for observability.
    pub fn diagnostics_snapshot(&self) -> pipeline::DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn set_status(&self, new_status: EngineStatus, detail: Option<String>) {
        *self.status.lock() = new_status;
        let _ = self.status_tx.send(EngineStatusEvent {
            status: new_status,
            detail,
        });
    }
}
