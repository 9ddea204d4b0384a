//! Election and campaign operations
//!
//! Elections own the voting window, the active flag, and the
//! results-published gate. Candidate attachment is the campaign
//! relation; attaching creates an empty campaign record once.

use crate::{
    engine::Engine,
    error::{Error, Result},
    types::{Campaign, Candidate, Election, ElectionKind},
};
use chrono::{DateTime, Utc};
use eligibility::VoterIdentity;
use event_bus::{Event, EventKind};
use serde_json::json;
use uuid::Uuid;

impl Engine {
    /// Create an election. New elections are inactive with
    /// unpublished results; `InvalidWindow` unless starts_at < ends_at.
    pub async fn create_election(
        &self,
        actor: &VoterIdentity,
        title: &str,
        description: &str,
        kind: ElectionKind,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<Election> {
        Self::require_admin(actor)?;

        if starts_at >= ends_at {
            return Err(Error::InvalidWindow);
        }

        let election = Election::new(title, description, kind, starts_at, ends_at);
        let result = self.handle.create_election(election.clone()).await;
        self.record_outcome("create_election", &result);
        result?;

        self.emit(
            Event::new(EventKind::ElectionCreated, election.id, &election.title)
                .with_actor(actor.id)
                .with_election(election.id)
                .with_payload(json!({
                    "kind": election.kind,
                    "starts_at": election.starts_at,
                    "ends_at": election.ends_at,
                })),
        )
        .await;

        tracing::info!(election_id = %election.id, title = %election.title, "Election created");
        Ok(election)
    }

    /// Attach a candidate to an election. Idempotent: re-attaching
    /// returns the existing campaign and publishes nothing.
    pub async fn attach_candidate(
        &self,
        actor: &VoterIdentity,
        election_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Campaign> {
        Self::require_admin(actor)?;

        let candidate = self
            .storage
            .get_candidate(&candidate_id)?
            .ok_or_else(|| Error::NotFound(format!("candidate {}", candidate_id)))?;

        let result = self.handle.attach_candidate(election_id, candidate_id).await;
        self.record_outcome("attach_candidate", &result);
        let (campaign, newly_attached) = result?;

        if newly_attached {
            self.emit(
                Event::new(EventKind::CandidateAttached, candidate_id, &candidate.full_name)
                    .with_actor(actor.id)
                    .with_election(election_id),
            )
            .await;
        }

        Ok(campaign)
    }

    /// Update the campaign message of an attached pair
    pub async fn set_campaign_message(
        &self,
        actor: &VoterIdentity,
        election_id: Uuid,
        candidate_id: Uuid,
        message: &str,
    ) -> Result<Campaign> {
        Self::require_admin(actor)?;

        let result = self
            .handle
            .set_campaign_message(election_id, candidate_id, message.to_string())
            .await;
        self.record_outcome("set_campaign_message", &result);
        let campaign = result?;

        self.emit(
            Event::new(
                EventKind::CampaignUpdated,
                candidate_id,
                format!("campaign of {}", candidate_id),
            )
            .with_actor(actor.id)
            .with_election(election_id)
            .with_payload(json!({ "message": campaign.message })),
        )
        .await;

        Ok(campaign)
    }

    /// Flip an election's active flag. Already-cast votes are
    /// unaffected.
    pub async fn toggle_active(&self, actor: &VoterIdentity, election_id: Uuid) -> Result<Election> {
        Self::require_admin(actor)?;

        let result = self.handle.toggle_election(election_id).await;
        self.record_outcome("toggle_active", &result);
        let election = result?;

        self.emit(
            Event::new(EventKind::ElectionToggled, election.id, &election.title)
                .with_actor(actor.id)
                .with_election(election.id)
                .with_payload(json!({ "active": election.is_active })),
        )
        .await;

        tracing::info!(
            election_id = %election.id,
            active = election.is_active,
            "Election toggled"
        );
        Ok(election)
    }

    /// Publish an election's results. Fails with `AlreadyPublished`
    /// when the flag is already set; there is no unpublish.
    pub async fn publish_results(
        &self,
        actor: &VoterIdentity,
        election_id: Uuid,
    ) -> Result<Election> {
        Self::require_admin(actor)?;

        let result = self.handle.publish_results(election_id).await;
        self.record_outcome("publish_results", &result);
        let election = result?;

        self.emit(
            Event::new(EventKind::ResultsPublished, election.id, &election.title)
                .with_actor(actor.id)
                .with_election(election.id),
        )
        .await;

        tracing::info!(election_id = %election.id, "Results published");
        Ok(election)
    }

    // Read paths

    /// Election by id
    pub fn election(&self, election_id: &Uuid) -> Result<Option<Election>> {
        self.storage.get_election(election_id)
    }

    /// All elections, newest first
    pub fn list_elections(&self) -> Result<Vec<Election>> {
        self.storage.list_elections()
    }

    /// Elections open for voting at `now`
    pub fn list_open_elections(&self, now: DateTime<Utc>) -> Result<Vec<Election>> {
        Ok(self
            .list_elections()?
            .into_iter()
            .filter(|election| election.is_open_at(now))
            .collect())
    }

    /// Candidates attached to an election
    pub fn candidates_for(&self, election_id: &Uuid) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::new();
        for candidate_id in self.storage.candidate_ids_for(election_id)? {
            if let Some(candidate) = self.storage.get_candidate(&candidate_id)? {
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }

    /// Campaign records of an election
    pub fn campaigns_for(&self, election_id: &Uuid) -> Result<Vec<Campaign>> {
        self.storage.campaigns_for(election_id)
    }
}
