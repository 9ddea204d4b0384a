//! Error types for the voting core

use eligibility::DenialReason;
use thiserror::Error;

/// Result type for voting core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Voting core errors
#[derive(Error, Debug)]
pub enum Error {
    /// Voter is pending or rejected
    #[error("Voter is not verified")]
    NotVerified,

    /// Election inactive or outside its window
    #[error("Election is not open for voting")]
    ElectionClosed,

    /// A vote already exists for this (voter, election) pair
    #[error("A vote has already been cast in this election")]
    DuplicateVote,

    /// Candidate unapproved or not standing in the election
    #[error("Candidate is not eligible in this election")]
    CandidateNotEligible,

    /// Election window with starts_at >= ends_at
    #[error("Invalid election window: start must precede end")]
    InvalidWindow,

    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Results were already published
    #[error("Results are already published")]
    AlreadyPublished,

    /// Results read before the publish gate opened
    #[error("Results are not published")]
    ResultsNotPublished,

    /// Caller lacks the administrator role
    #[error("Operation requires the administrator role")]
    Forbidden,

    /// Unique field (registration number, party name) already taken
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Party still has registered candidates
    #[error("Party has registered candidates")]
    PartyInUse,

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<DenialReason> for Error {
    fn from(reason: DenialReason) -> Self {
        match reason {
            DenialReason::NotVerified => Error::NotVerified,
            DenialReason::ElectionClosed => Error::ElectionClosed,
            DenialReason::AlreadyVoted => Error::DuplicateVote,
            DenialReason::CandidateNotEligible => Error::CandidateNotEligible,
        }
    }
}

impl From<tally_engine::Error> for Error {
    fn from(err: tally_engine::Error) -> Self {
        // A ballot naming an unknown candidate means the ledger and
        // roster disagree; surface it as a storage-level fault.
        Error::Storage(err.to_string())
    }
}

impl From<audit_trail::Error> for Error {
    fn from(err: audit_trail::Error) -> Self {
        match err {
            audit_trail::Error::Io(e) => Error::Io(e),
            other => Error::Storage(other.to_string()),
        }
    }
}
