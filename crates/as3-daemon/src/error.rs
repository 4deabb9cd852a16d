//! Error types for as3d

use as3_reconciler::{GateError, PostEvent, SubmitError};
use thiserror::Error;

/// Errors that stop the daemon
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// The appliance's AS3 version is unusable
    #[error(transparent)]
    Gate(#[from] GateError),

    /// The appliance client could not be created
    #[error("appliance client error: {0}")]
    Submit(#[from] SubmitError),

    /// The appliance refused a one-shot declaration
    #[error("appliance rejected the declaration ({0})")]
    Rejected(PostEvent),

    /// Desired state or override file could not be read
    #[error("failed to read {path}: {reason}")]
    Source { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The reconciler task panicked
    #[error("reconciler task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result type for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
