//! Error types for the event bus

use thiserror::Error;

/// Event bus error
#[derive(Debug, Error)]
pub enum Error {
    /// Observer failed to process an event
    #[error("Observer error: {0}")]
    Observer(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
