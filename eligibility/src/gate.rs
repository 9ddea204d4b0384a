//! The predicate chain gating cast-vote attempts
//!
//! Checks run in a fixed order and stop at the first failure, so a
//! caller always sees the earliest reason a vote cannot proceed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a cast-vote attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Voter is not verified (pending or rejected)
    NotVerified,
    /// Election inactive or outside its window
    ElectionClosed,
    /// Voter already holds a vote in this election
    AlreadyVoted,
    /// Candidate unapproved or not attached to the election
    CandidateNotEligible,
}

impl DenialReason {
    /// Stable snake_case label (log fields, metric labels)
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::NotVerified => "not_verified",
            DenialReason::ElectionClosed => "election_closed",
            DenialReason::AlreadyVoted => "already_voted",
            DenialReason::CandidateNotEligible => "candidate_not_eligible",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DenialReason::NotVerified => "voter is not verified",
            DenialReason::ElectionClosed => "election is not open for voting",
            DenialReason::AlreadyVoted => "voter has already voted in this election",
            DenialReason::CandidateNotEligible => "candidate is not eligible in this election",
        };
        f.write_str(msg)
    }
}

/// Outcome of a gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// All checks passed
    Allowed,
    /// First failed check
    Denied(DenialReason),
}

impl GateDecision {
    /// Whether the attempt may proceed
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }

    /// The denial reason, if any
    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            GateDecision::Allowed => None,
            GateDecision::Denied(reason) => Some(*reason),
        }
    }
}

/// Decide whether a voter may cast a vote right now.
///
/// Order: verification, then the election window, then the
/// one-vote-per-election check. `election_open` is the registry's
/// is_active AND now ∈ [starts_at, ends_at) predicate; `has_voted` is
/// the ledger's existence check. The ledger re-checks vote uniqueness
/// atomically at insert time; this gate is the user-facing fast path.
pub fn voter_decision(
    status: crate::VerificationStatus,
    election_open: bool,
    has_voted: bool,
) -> GateDecision {
    if !status.is_verified() {
        return GateDecision::Denied(DenialReason::NotVerified);
    }
    if !election_open {
        return GateDecision::Denied(DenialReason::ElectionClosed);
    }
    if has_voted {
        return GateDecision::Denied(DenialReason::AlreadyVoted);
    }
    GateDecision::Allowed
}

/// Decide whether a candidate may receive votes in an election.
///
/// The candidate must be approved and attached to the election.
pub fn candidate_decision(approved: bool, attached: bool) -> GateDecision {
    if approved && attached {
        GateDecision::Allowed
    } else {
        GateDecision::Denied(DenialReason::CandidateNotEligible)
    }
}
