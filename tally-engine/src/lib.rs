//! Tally engine for BallotCore
//!
//! On-demand aggregation of cast votes into a ranked result. Pure
//! computation: callers supply the candidate roster and the ballots,
//! and re-running over fresh reads yields fresh results. Whether a
//! ranking may be shown to voters (the publish gate) is the election
//! registry's concern, not this crate's.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod ranking;

pub use error::{Error, Result};
pub use ranking::{rank, Ranking, RankingLine, Roster};
