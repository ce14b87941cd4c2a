//! Error types for the reel engine

use thiserror::Error;

/// Configuration and loading errors.
///
/// Any of these returned from construction means the engine was never built.
#[derive(Error, Debug)]
pub enum MachineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rejected: {0}")]
    Rejected(#[from] SpinRejected),
}

impl MachineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

/// Result type alias
pub type MachineResult<T> = Result<T, MachineError>;

/// Reasons a spin request (or a state change) is refused.
///
/// Both are recoverable; nothing is mutated when one is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinRejected {
    #[error("Not enough credits: stake {stake} exceeds bankroll {bankroll}")]
    InsufficientFunds { stake: u64, bankroll: u64 },

    #[error("Spin already in progress")]
    SpinInProgress,
}
