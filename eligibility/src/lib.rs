//! Eligibility gate for BallotCore
//!
//! Pure predicate logic deciding who may cast a vote and which
//! candidates may receive one. No storage, no side effects.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod gate;
pub mod types;

pub use error::{Error, Result};
pub use gate::{candidate_decision, voter_decision, DenialReason, GateDecision};
pub use types::{Role, VerificationStatus, VoterIdentity};
