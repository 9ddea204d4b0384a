//! Voter, party, and candidate operations
//!
//! Registration is self-service; everything else here requires the
//! administrator role. Each successful mutation publishes one event
//! after the write is durable.

use crate::{
    engine::Engine,
    error::{Error, Result},
    types::{Candidate, CascadeReport, Party, RegNo, Voter},
};
use eligibility::{VerificationStatus, VoterIdentity};
use event_bus::{Event, EventKind};
use serde_json::json;
use uuid::Uuid;

impl Engine {
    /// Register a voter, pending verification. Self-service: any role.
    pub async fn register_voter(
        &self,
        actor: &VoterIdentity,
        reg_no: RegNo,
        full_name: &str,
        mobile_no: &str,
        address: &str,
    ) -> Result<Voter> {
        let voter = Voter::new(reg_no, full_name, mobile_no, address);

        let result = self.handle.register_voter(voter.clone()).await;
        self.record_outcome("register_voter", &result);
        result?;

        self.emit(
            Event::new(EventKind::VoterRegistered, voter.id, &voter.full_name)
                .with_actor(actor.id)
                .with_voter(voter.id)
                .with_payload(json!({ "reg_no": voter.reg_no })),
        )
        .await;

        tracing::info!(voter_id = %voter.id, reg_no = %voter.reg_no, "Voter registered");
        Ok(voter)
    }

    /// Set a voter's verification status
    pub async fn verify_voter(
        &self,
        actor: &VoterIdentity,
        voter_id: Uuid,
        status: VerificationStatus,
    ) -> Result<Voter> {
        Self::require_admin(actor)?;

        let result = self.handle.set_verification(voter_id, status).await;
        self.record_outcome("verify_voter", &result);
        let voter = result?;

        self.emit(
            Event::new(EventKind::VoterVerified, voter.id, &voter.full_name)
                .with_actor(actor.id)
                .with_voter(voter.id)
                .with_payload(json!({ "status": status.as_str() })),
        )
        .await;

        tracing::info!(voter_id = %voter.id, status = %status, "Voter verification set");
        Ok(voter)
    }

    /// Remove a voter together with their votes and notifications
    pub async fn remove_voter(
        &self,
        actor: &VoterIdentity,
        voter_id: Uuid,
    ) -> Result<CascadeReport> {
        Self::require_admin(actor)?;

        // The name survives in the event label after the row is gone.
        let voter = self
            .storage
            .get_voter(&voter_id)?
            .ok_or_else(|| Error::NotFound(format!("voter {}", voter_id)))?;

        let result = self.handle.purge_voter(voter_id).await;
        self.record_outcome("remove_voter", &result);
        let report = result?;

        self.emit(
            Event::new(EventKind::VoterRemoved, voter_id, &voter.full_name)
                .with_actor(actor.id)
                .with_payload(json!({
                    "votes_removed": report.votes_removed,
                    "notifications_removed": report.notifications_removed,
                })),
        )
        .await;

        Ok(report)
    }

    /// Create a party with a unique name
    pub async fn create_party(&self, actor: &VoterIdentity, name: &str) -> Result<Party> {
        Self::require_admin(actor)?;

        let party = Party::new(name);
        let result = self.handle.create_party(party.clone()).await;
        self.record_outcome("create_party", &result);
        result?;

        self.emit(
            Event::new(EventKind::PartyCreated, party.id, &party.name).with_actor(actor.id),
        )
        .await;

        Ok(party)
    }

    /// Rename a party; the new name must be free
    pub async fn rename_party(
        &self,
        actor: &VoterIdentity,
        party_id: Uuid,
        new_name: &str,
    ) -> Result<Party> {
        Self::require_admin(actor)?;

        let old_name = self
            .storage
            .get_party(&party_id)?
            .ok_or_else(|| Error::NotFound(format!("party {}", party_id)))?
            .name;

        let result = self
            .handle
            .rename_party(party_id, new_name.to_string())
            .await;
        self.record_outcome("rename_party", &result);
        let party = result?;

        self.emit(
            Event::new(EventKind::PartyRenamed, party.id, &party.name)
                .with_actor(actor.id)
                .with_payload(json!({ "from": old_name, "to": party.name })),
        )
        .await;

        Ok(party)
    }

    /// Remove a party; fails with [`Error::PartyInUse`] while any
    /// candidate references it
    pub async fn remove_party(&self, actor: &VoterIdentity, party_id: Uuid) -> Result<()> {
        Self::require_admin(actor)?;

        let result = self.handle.remove_party(party_id).await;
        self.record_outcome("remove_party", &result);
        let party = result?;

        self.emit(
            Event::new(EventKind::PartyRemoved, party.id, &party.name).with_actor(actor.id),
        )
        .await;

        Ok(())
    }

    /// Register a candidate for an existing party, unapproved
    pub async fn register_candidate(
        &self,
        actor: &VoterIdentity,
        full_name: &str,
        age: u8,
        area: &str,
        party_id: Uuid,
    ) -> Result<Candidate> {
        Self::require_admin(actor)?;

        let candidate = Candidate::new(full_name, age, area, party_id);
        let result = self.handle.register_candidate(candidate.clone()).await;
        self.record_outcome("register_candidate", &result);
        result?;

        self.emit(
            Event::new(EventKind::CandidateRegistered, candidate.id, &candidate.full_name)
                .with_actor(actor.id)
                .with_payload(json!({ "party_id": party_id, "area": candidate.area })),
        )
        .await;

        Ok(candidate)
    }

    /// Approve a candidate for receiving votes
    pub async fn approve_candidate(
        &self,
        actor: &VoterIdentity,
        candidate_id: Uuid,
    ) -> Result<Candidate> {
        Self::require_admin(actor)?;

        let result = self.handle.set_candidate_approval(candidate_id, true).await;
        self.record_outcome("approve_candidate", &result);
        let candidate = result?;

        self.emit(
            Event::new(EventKind::CandidateApproved, candidate.id, &candidate.full_name)
                .with_actor(actor.id),
        )
        .await;

        Ok(candidate)
    }

    /// Remove a candidate and their election attachments
    pub async fn remove_candidate(&self, actor: &VoterIdentity, candidate_id: Uuid) -> Result<()> {
        Self::require_admin(actor)?;

        let result = self.handle.remove_candidate(candidate_id).await;
        self.record_outcome("remove_candidate", &result);
        let candidate = result?;

        self.emit(
            Event::new(EventKind::CandidateRemoved, candidate.id, &candidate.full_name)
                .with_actor(actor.id),
        )
        .await;

        Ok(())
    }

    // Read paths

    /// Voter by id
    pub fn voter(&self, voter_id: &Uuid) -> Result<Option<Voter>> {
        self.storage.get_voter(voter_id)
    }

    /// Voter by registration number
    pub fn voter_by_reg_no(&self, reg_no: &RegNo) -> Result<Option<Voter>> {
        self.storage.voter_by_reg_no(reg_no)
    }

    /// Party by id
    pub fn party(&self, party_id: &Uuid) -> Result<Option<Party>> {
        self.storage.get_party(party_id)
    }

    /// Candidate by id
    pub fn candidate(&self, candidate_id: &Uuid) -> Result<Option<Candidate>> {
        self.storage.get_candidate(candidate_id)
    }

    /// All voters, ordered by registration number
    pub fn list_voters(&self) -> Result<Vec<Voter>> {
        self.storage.list_voters()
    }

    /// All parties, ordered by name
    pub fn list_parties(&self) -> Result<Vec<Party>> {
        self.storage.list_parties()
    }

    /// All candidates, ordered by name
    pub fn list_candidates(&self) -> Result<Vec<Candidate>> {
        self.storage.list_candidates()
    }
}
