//! Error types for the lock ledger

use thiserror::Error;

/// Result type for lock ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lock ledger errors
///
/// Every error aborts the entire enclosing operation with no partial
/// mutation; callers re-issue after correcting the precondition.
#[derive(Error, Debug)]
pub enum Error {
    /// Zero amount, implausible timestamp scale, or other bad argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The custodied or receipt asset refused an external transfer
    /// (insufficient balance or allowance)
    #[error("Transfer refused: {0}")]
    TransferRefused(String),

    /// Position id out of range of the assigned id space
    #[error("Position not found: {0}")]
    PositionNotFound(String),

    /// Resolved position lacks the existence flag
    #[error("Position not set: {0}")]
    PositionNotSet(String),

    /// Current time precedes the position's release time
    #[error("Not yet releasable: {0}")]
    NotYetReleasable(String),

    /// Release amount exceeds the remaining locked amount
    #[error("Insufficient locked: {0}")]
    InsufficientLocked(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
