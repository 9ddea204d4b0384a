//! Error types for the tally engine

use thiserror::Error;
use uuid::Uuid;

/// Tally error
#[derive(Debug, Error)]
pub enum Error {
    /// A ballot names a candidate missing from the roster. Votes are
    /// only accepted for attached candidates, so this indicates a
    /// corrupt ledger read, not a user mistake.
    #[error("Ballot for unknown candidate: {0}")]
    UnknownCandidate(Uuid),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
