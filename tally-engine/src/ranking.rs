//! Ranked per-candidate vote aggregation

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Candidates standing in one election, keyed by candidate id
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: HashMap<Uuid, (String, String)>,
}

impl Roster {
    /// Empty roster
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate with display name and party name
    pub fn insert(&mut self, candidate_id: Uuid, name: impl Into<String>, party: impl Into<String>) {
        self.entries.insert(candidate_id, (name.into(), party.into()));
    }

    /// Whether the roster lists this candidate
    pub fn contains(&self, candidate_id: &Uuid) -> bool {
        self.entries.contains_key(candidate_id)
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One candidate's line in a ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingLine {
    /// Candidate id
    pub candidate_id: Uuid,
    /// Candidate display name
    pub candidate_name: String,
    /// Party name
    pub party_name: String,
    /// Votes received
    pub votes: u64,
    /// Share of the total, 0–100, two decimal places
    pub percentage: Decimal,
}

/// Ranked result of one election
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ranking {
    /// Election the ranking belongs to
    pub election_id: Uuid,
    /// Total ballots counted
    pub total_votes: u64,
    /// Lines ordered by votes descending, candidate id ascending on ties
    pub lines: Vec<RankingLine>,
    /// When the ranking was computed
    pub computed_at: DateTime<Utc>,
}

impl Ranking {
    /// Leading line, if any votes were cast
    pub fn winner(&self) -> Option<&RankingLine> {
        if self.total_votes == 0 {
            return None;
        }
        self.lines.first()
    }
}

/// Aggregate ballots into a ranking.
///
/// `ballots` is the candidate id of each cast vote. Every roster
/// candidate gets a line, zero-vote candidates included. With no
/// ballots every percentage is zero; there is no division by the
/// empty total. Ballots for candidates missing from the roster fail
/// with [`Error::UnknownCandidate`].
pub fn rank(
    election_id: Uuid,
    roster: &Roster,
    ballots: impl IntoIterator<Item = Uuid>,
) -> Result<Ranking> {
    let mut counts: HashMap<Uuid, u64> = HashMap::with_capacity(roster.len());
    let mut total: u64 = 0;

    for candidate_id in ballots {
        if !roster.contains(&candidate_id) {
            return Err(Error::UnknownCandidate(candidate_id));
        }
        *counts.entry(candidate_id).or_insert(0) += 1;
        total += 1;
    }

    let mut lines: Vec<RankingLine> = roster
        .entries
        .iter()
        .map(|(candidate_id, (name, party))| {
            let votes = counts.get(candidate_id).copied().unwrap_or(0);
            RankingLine {
                candidate_id: *candidate_id,
                candidate_name: name.clone(),
                party_name: party.clone(),
                votes,
                percentage: percentage(votes, total),
            }
        })
        .collect();

    lines.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });

    Ok(Ranking {
        election_id,
        total_votes: total,
        lines,
        computed_at: Utc::now(),
    })
}

/// 100 * votes / total, two decimal places; zero when no votes exist
fn percentage(votes: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(votes) * Decimal::from(100u32) / Decimal::from(total)).round_dp(2)
}
