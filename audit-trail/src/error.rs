//! Error types for the audit trail

use thiserror::Error;

/// Audit trail errors
#[derive(Error, Debug)]
pub enum Error {
    /// Log file IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Hash chain verification failed at this sequence number
    #[error("Audit chain broken at sequence {0}")]
    ChainBroken(u64),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
