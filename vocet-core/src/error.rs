use thiserror::Error;

/// All errors produced by vocet-core.
///
/// "Needs more input" is deliberately absent: insufficient buffer space is a
/// cooperative suspension reported through [`crate::block::Progress`], not an
/// error.
#[derive(Debug, Error)]
pub enum VocetError {
    #[error("codec state initialization failed: {0}")]
    CodecInit(String),

    #[error("contract violation: expected {expected} items, got {got}")]
    ContractViolation { expected: usize, got: usize },

    #[error("codec failure: {0}")]
    CodecFailure(String),

    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    #[error("resampler error: {0}")]
    Resample(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VocetError>;
