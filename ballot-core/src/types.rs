//! Core domain types
//!
//! Entities are stored bincode-encoded under their UUID. Entity ids
//! are random v4; votes and notifications use time-ordered v7 ids so
//! storage iteration returns them in creation order.

use chrono::{DateTime, Utc};
use eligibility::VerificationStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Registration number printed on a voter card, unique per voter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegNo(String);

impl RegNo {
    /// Wrap a registration number
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// String form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegNo {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A registered voter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voter {
    /// Voter id
    pub id: Uuid,
    /// Unique registration number
    pub reg_no: RegNo,
    /// Full legal name
    pub full_name: String,
    /// Contact number
    pub mobile_no: String,
    /// Residential address
    pub address: String,
    /// Verification state; new voters start pending
    pub verification_status: VerificationStatus,
    /// When the status last left pending
    pub verified_at: Option<DateTime<Utc>>,
    /// When the voter registered
    pub registered_at: DateTime<Utc>,
}

impl Voter {
    /// Register a new voter, pending verification
    pub fn new(
        reg_no: RegNo,
        full_name: impl Into<String>,
        mobile_no: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reg_no,
            full_name: full_name.into(),
            mobile_no: mobile_no.into(),
            address: address.into(),
            verification_status: VerificationStatus::default(),
            verified_at: None,
            registered_at: Utc::now(),
        }
    }

    /// Whether this voter passed verification
    pub fn is_verified(&self) -> bool {
        self.verification_status.is_verified()
    }
}

/// A political party
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    /// Party id
    pub id: Uuid,
    /// Unique party name
    pub name: String,
    /// When the party was created
    pub created_at: DateTime<Utc>,
}

impl Party {
    /// Create a new party
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// A candidate standing for a party
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Candidate id
    pub id: Uuid,
    /// Display name
    pub full_name: String,
    /// Age in years
    pub age: u8,
    /// Constituency or ward
    pub area: String,
    /// Party the candidate stands for
    pub party_id: Uuid,
    /// Eligible to receive votes once approved
    pub approved: bool,
    /// When the candidate registered
    pub registered_at: DateTime<Utc>,
}

impl Candidate {
    /// Register a new candidate, unapproved
    pub fn new(
        full_name: impl Into<String>,
        age: u8,
        area: impl Into<String>,
        party_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            age,
            area: area.into(),
            party_id,
            approved: false,
            registered_at: Utc::now(),
        }
    }
}

/// Contest format of an election
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionKind {
    /// One seat, one winner
    Single,
    /// Multiple seats
    Multi,
    /// Yes/no question
    Referendum,
}

impl ElectionKind {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ElectionKind::Single => "single",
            ElectionKind::Multi => "multi",
            ElectionKind::Referendum => "referendum",
        }
    }
}

impl Default for ElectionKind {
    fn default() -> Self {
        ElectionKind::Single
    }
}

impl fmt::Display for ElectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An election with a voting window and publish gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Election {
    /// Election id
    pub id: Uuid,
    /// Title shown to voters
    pub title: String,
    /// Longer description
    pub description: String,
    /// Contest format
    pub kind: ElectionKind,
    /// Voting opens at this instant (inclusive)
    pub starts_at: DateTime<Utc>,
    /// Voting closes at this instant (exclusive)
    pub ends_at: DateTime<Utc>,
    /// Administrator switch; voting requires it on
    pub is_active: bool,
    /// Publish gate for voter-facing results
    pub results_published: bool,
    /// When the election was created
    pub created_at: DateTime<Utc>,
}

impl Election {
    /// Create a new election, inactive and unpublished.
    ///
    /// Window validity (starts_at < ends_at) is enforced at the
    /// registry boundary, not here.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        kind: ElectionKind,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            kind,
            starts_at,
            ends_at,
            is_active: false,
            results_published: false,
            created_at: Utc::now(),
        }
    }

    /// Whether votes may be cast at `now`: active AND inside
    /// [starts_at, ends_at).
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now < self.ends_at
    }
}

/// Campaign record for a candidate attached to an election.
///
/// Existence of this record is what "attached" means; it is created
/// with an empty message when the candidate is attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Election the candidate stands in
    pub election_id: Uuid,
    /// Attached candidate
    pub candidate_id: Uuid,
    /// Campaign pitch, empty until set
    pub message: String,
    /// When the candidate was attached
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Attachment record with an empty message
    pub fn new(election_id: Uuid, candidate_id: Uuid) -> Self {
        Self {
            election_id,
            candidate_id,
            message: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// A cast vote. Never mutated; removed only by the voter-removal
/// cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// Vote id, time-ordered
    pub id: Uuid,
    /// Election voted in
    pub election_id: Uuid,
    /// Voter who cast it
    pub voter_id: Uuid,
    /// Candidate voted for
    pub candidate_id: Uuid,
    /// When the vote committed
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    /// New vote with a fresh time-ordered id
    pub fn new(election_id: Uuid, voter_id: Uuid, candidate_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            election_id,
            voter_id,
            candidate_id,
            cast_at: Utc::now(),
        }
    }
}

/// Classes of inbox notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Registration was received
    Registration,
    /// Verification outcome
    Verification,
    /// An election opened for voting
    ElectionOpen,
    /// Reminder before an election closes
    ElectionReminder,
    /// A cast vote was recorded
    VoteConfirmation,
    /// Results were published
    ResultsAvailable,
    /// Anything else
    System,
}

impl NotificationKind {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Registration => "registration",
            NotificationKind::Verification => "verification",
            NotificationKind::ElectionOpen => "election_open",
            NotificationKind::ElectionReminder => "election_reminder",
            NotificationKind::VoteConfirmation => "vote_confirmation",
            NotificationKind::ResultsAvailable => "results_available",
            NotificationKind::System => "system",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inbox notification. `read` is the only mutable field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Notification id, time-ordered
    pub id: Uuid,
    /// Recipient voter
    pub voter_id: Uuid,
    /// Short title
    pub title: String,
    /// Body text
    pub message: String,
    /// Notification class
    pub kind: NotificationKind,
    /// Whether the voter has read it
    pub read: bool,
    /// Election it concerns, if any
    pub election_id: Option<Uuid>,
    /// When it was enqueued
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// New unread notification
    pub fn new(
        voter_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            voter_id,
            title: title.into(),
            message: message.into(),
            kind,
            read: false,
            election_id: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the election the notification concerns
    pub fn with_election(mut self, election_id: Uuid) -> Self {
        self.election_id = Some(election_id);
        self
    }
}

/// Rows removed by a voter-removal cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeReport {
    /// Removed voter
    pub voter_id: Uuid,
    /// Votes deleted with the voter
    pub votes_removed: u64,
    /// Notifications deleted with the voter
    pub notifications_removed: u64,
}

/// Counters for the administrative dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineStats {
    /// Registered voters
    pub voters: u64,
    /// Candidates awaiting approval
    pub pending_approvals: u64,
    /// Parties
    pub parties: u64,
    /// Candidates
    pub candidates: u64,
    /// Elections
    pub elections: u64,
    /// Elections currently active
    pub active_elections: u64,
    /// Votes cast across all elections
    pub votes_cast: u64,
    /// Elections that ended and were deactivated
    pub results_ready: u64,
}
