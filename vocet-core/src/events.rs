//! Event types broadcast to engine subscribers.

use serde::{Deserialize, Serialize};

use crate::buffering::frame::BitFrame;

// ---------------------------------------------------------------------------
// Frame events
// ---------------------------------------------------------------------------

/// Emitted for every productive block invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Frames produced by this invocation, in input order.
    pub frames: Vec<BitFrame>,
}

// ---------------------------------------------------------------------------
// Engine status events
// ---------------------------------------------------------------------------

/// Emitted when the engine state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatusEvent {
    pub status: EngineStatus,
    /// Optional human-readable detail (e.g. error message).
    pub detail: Option<String>,
}

/// Current state of a `StreamEngine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    /// Engine created but `start()` not yet called.
    Idle,
    /// Pipeline thread running, consuming samples.
    Encoding,
    /// Stopped cleanly; the engine may be restarted.
    Stopped,
    /// Stream aborted on a fatal error — restart required.
    Error,
}
