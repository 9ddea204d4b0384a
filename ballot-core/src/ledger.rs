//! Vote ledger operations
//!
//! The cast path runs the eligibility gate as a fast pre-check, then
//! submits the insert to the writer actor. The actor's ballot-key
//! check is the authoritative duplicate guard: two concurrent casts
//! for the same (voter, election) cannot both succeed.

use crate::{
    engine::Engine,
    error::{Error, Result},
    types::Vote,
};
use chrono::Utc;
use eligibility::{candidate_decision, voter_decision, VoterIdentity};
use event_bus::{Event, EventKind};
use serde_json::json;
use uuid::Uuid;

impl Engine {
    /// Cast one vote for the calling voter.
    ///
    /// Resolves the voter, candidate, and election (`NotFound`), runs
    /// the eligibility gate, then records the vote. On success a
    /// VoteCast event reaches the observers, so the voter receives a
    /// confirmation notification and the audit log an entry.
    pub async fn cast_vote(
        &self,
        actor: &VoterIdentity,
        candidate_id: Uuid,
        election_id: Uuid,
    ) -> Result<Vote> {
        let started = std::time::Instant::now();

        let voter = self
            .storage
            .get_voter(&actor.id)?
            .ok_or_else(|| Error::NotFound(format!("voter {}", actor.id)))?;
        let candidate = self
            .storage
            .get_candidate(&candidate_id)?
            .ok_or_else(|| Error::NotFound(format!("candidate {}", candidate_id)))?;
        let election = self
            .storage
            .get_election(&election_id)?
            .ok_or_else(|| Error::NotFound(format!("election {}", election_id)))?;

        let now = Utc::now();

        // Fast-path gate; the insert re-checks the ballot key.
        let has_voted = self.storage.has_voted(&voter.id, &election_id)?;
        let voter_gate = voter_decision(
            voter.verification_status,
            election.is_open_at(now),
            has_voted,
        );
        if let Some(reason) = voter_gate.denial() {
            self.metrics.record_gate_denial(reason.as_str());
            tracing::debug!(voter_id = %voter.id, reason = reason.as_str(), "Vote refused");
            return Err(reason.into());
        }

        let attached = self
            .storage
            .get_campaign(&election_id, &candidate_id)?
            .is_some();
        if let Some(reason) = candidate_decision(candidate.approved, attached).denial() {
            self.metrics.record_gate_denial(reason.as_str());
            tracing::debug!(candidate_id = %candidate_id, reason = reason.as_str(), "Vote refused");
            return Err(reason.into());
        }

        let result = self
            .handle
            .cast_ballot(voter.id, election_id, candidate_id)
            .await;
        self.record_outcome("cast_vote", &result);
        let vote = result?;

        self.metrics.record_vote_cast();
        self.metrics
            .record_cast_duration(started.elapsed().as_secs_f64());

        self.emit(
            Event::new(EventKind::VoteCast, vote.id, &candidate.full_name)
                .with_actor(actor.id)
                .with_voter(voter.id)
                .with_election(election_id)
                .with_payload(json!({ "election_title": election.title })),
        )
        .await;

        tracing::info!(vote_id = %vote.id, election_id = %election_id, "Vote cast");
        Ok(vote)
    }

    /// Whether a voter already holds a vote in an election
    pub fn has_voted(&self, voter_id: &Uuid, election_id: &Uuid) -> Result<bool> {
        self.storage.has_voted(voter_id, election_id)
    }

    /// Votes cast by a voter
    pub fn votes_of(&self, voter_id: &Uuid) -> Result<Vec<Vote>> {
        self.storage.votes_of(voter_id)
    }

    /// Votes cast in an election, in cast order
    pub fn votes_for_election(&self, election_id: &Uuid) -> Result<Vec<Vote>> {
        self.storage.votes_for_election(election_id)
    }
}
