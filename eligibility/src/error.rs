//! Error types for the eligibility gate

use thiserror::Error;

/// Eligibility error
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown role name
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Unknown verification status name
    #[error("Unknown verification status: {0}")]
    UnknownStatus(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
