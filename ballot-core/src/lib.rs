//! BallotCore
//!
//! Vote-casting and tallying engine for elections.
//!
//! # Architecture
//!
//! - **Single Writer**: every mutation runs through one actor task,
//!   so check-then-write sequences (ballot keys, uniqueness indices)
//!   cannot interleave
//! - **Eligibility Gate**: verification, window, and one-vote checks
//!   run before a vote reaches the writer; the ballot key re-check at
//!   insert time is authoritative
//! - **Post-Commit Events**: durable writes publish to an in-process
//!   bus; observers append audit entries and inbox notifications and
//!   never fail the triggering operation
//! - **On-Demand Tally**: rankings are recomputed from the vote rows
//!   behind a results-published gate

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod actor;
pub mod config;
mod electorate;
pub mod engine;
pub mod error;
pub mod inbox;
mod ledger;
pub mod metrics;
mod registry;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};
pub use inbox::Notifier;
pub use metrics::EngineMetrics;
pub use storage::Storage;
pub use types::{
    Campaign, Candidate, CascadeReport, Election, ElectionKind, EngineStats, Notification,
    NotificationKind, Party, RegNo, Vote, Voter,
};

// The collaborating crates most callers need alongside the engine
pub use audit_trail::{AuditEntry, AuditRecorder, AuditTrailConfig};
pub use eligibility::{DenialReason, GateDecision, Role, VerificationStatus, VoterIdentity};
pub use event_bus::{ActionKind, Event, EventBus, EventKind, EventObserver, TargetKind};
pub use tally_engine::{Ranking, RankingLine, Roster};
