//! Actor-based writer for serialized mutations
//!
//! Every mutation goes through one actor task that owns the write
//! path. Check-then-write sequences (ballot keys, uniqueness indices)
//! are atomic because no other task writes. Reads bypass the actor
//! and hit storage directly.

use crate::{
    error::{Error, Result},
    storage::Storage,
    types::{Campaign, Candidate, CascadeReport, Election, Notification, Party, Vote, Voter},
};
use chrono::Utc;
use eligibility::VerificationStatus;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Messages that can be sent to the ballot actor
pub enum BallotMessage {
    /// Register a new voter
    RegisterVoter {
        voter: Voter,
        response: oneshot::Sender<Result<()>>,
    },
    /// Set a voter's verification status
    SetVerification {
        voter_id: Uuid,
        status: VerificationStatus,
        response: oneshot::Sender<Result<Voter>>,
    },
    /// Remove a voter with their votes and notifications
    PurgeVoter {
        voter_id: Uuid,
        response: oneshot::Sender<Result<CascadeReport>>,
    },
    /// Create a party
    CreateParty {
        party: Party,
        response: oneshot::Sender<Result<()>>,
    },
    /// Rename a party
    RenameParty {
        party_id: Uuid,
        new_name: String,
        response: oneshot::Sender<Result<Party>>,
    },
    /// Remove a party with no candidates
    RemoveParty {
        party_id: Uuid,
        response: oneshot::Sender<Result<Party>>,
    },
    /// Register a candidate
    RegisterCandidate {
        candidate: Candidate,
        response: oneshot::Sender<Result<()>>,
    },
    /// Flip a candidate's approval flag
    SetCandidateApproval {
        candidate_id: Uuid,
        approved: bool,
        response: oneshot::Sender<Result<Candidate>>,
    },
    /// Remove a candidate and their attachments
    RemoveCandidate {
        candidate_id: Uuid,
        response: oneshot::Sender<Result<Candidate>>,
    },
    /// Create an election
    CreateElection {
        election: Election,
        response: oneshot::Sender<Result<()>>,
    },
    /// Attach a candidate to an election (idempotent)
    AttachCandidate {
        election_id: Uuid,
        candidate_id: Uuid,
        response: oneshot::Sender<Result<(Campaign, bool)>>,
    },
    /// Update an attachment's campaign message
    SetCampaignMessage {
        election_id: Uuid,
        candidate_id: Uuid,
        message: String,
        response: oneshot::Sender<Result<Campaign>>,
    },
    /// Flip an election's active flag
    ToggleElection {
        election_id: Uuid,
        response: oneshot::Sender<Result<Election>>,
    },
    /// Set an election's results-published flag
    PublishResults {
        election_id: Uuid,
        response: oneshot::Sender<Result<Election>>,
    },
    /// Record one vote; fails on an existing ballot key
    CastBallot {
        voter_id: Uuid,
        election_id: Uuid,
        candidate_id: Uuid,
        response: oneshot::Sender<Result<Vote>>,
    },
    /// Append a notification to a voter's inbox
    InsertNotification {
        notification: Notification,
        response: oneshot::Sender<Result<()>>,
    },
    /// Mark all of a voter's notifications read
    MarkAllRead {
        voter_id: Uuid,
        response: oneshot::Sender<Result<u64>>,
    },
    /// Shutdown the actor
    Shutdown,
}

/// The ballot actor processes messages sequentially
pub struct BallotActor {
    storage: Arc<Storage>,
    mailbox: mpsc::Receiver<BallotMessage>,
}

impl BallotActor {
    /// Create a new actor with storage and mailbox
    pub fn new(storage: Arc<Storage>, mailbox: mpsc::Receiver<BallotMessage>) -> Self {
        Self { storage, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        tracing::info!("Ballot actor started");

        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                BallotMessage::RegisterVoter { voter, response } => {
                    let result = self.handle_register_voter(&voter);
                    let _ = response.send(result);
                }
                BallotMessage::SetVerification {
                    voter_id,
                    status,
                    response,
                } => {
                    let result = self.handle_set_verification(&voter_id, status);
                    let _ = response.send(result);
                }
                BallotMessage::PurgeVoter { voter_id, response } => {
                    let result = self.storage.purge_voter(&voter_id);
                    let _ = response.send(result);
                }
                BallotMessage::CreateParty { party, response } => {
                    let result = self.storage.insert_party(&party);
                    let _ = response.send(result);
                }
                BallotMessage::RenameParty {
                    party_id,
                    new_name,
                    response,
                } => {
                    let result = self.storage.rename_party(&party_id, &new_name);
                    let _ = response.send(result);
                }
                BallotMessage::RemoveParty { party_id, response } => {
                    let result = self.storage.remove_party(&party_id);
                    let _ = response.send(result);
                }
                BallotMessage::RegisterCandidate {
                    candidate,
                    response,
                } => {
                    let result = self.handle_register_candidate(&candidate);
                    let _ = response.send(result);
                }
                BallotMessage::SetCandidateApproval {
                    candidate_id,
                    approved,
                    response,
                } => {
                    let result = self.handle_set_candidate_approval(&candidate_id, approved);
                    let _ = response.send(result);
                }
                BallotMessage::RemoveCandidate {
                    candidate_id,
                    response,
                } => {
                    let result = self.storage.remove_candidate(&candidate_id);
                    let _ = response.send(result);
                }
                BallotMessage::CreateElection { election, response } => {
                    let result = self.storage.insert_election(&election);
                    let _ = response.send(result);
                }
                BallotMessage::AttachCandidate {
                    election_id,
                    candidate_id,
                    response,
                } => {
                    let result = self.handle_attach_candidate(&election_id, &candidate_id);
                    let _ = response.send(result);
                }
                BallotMessage::SetCampaignMessage {
                    election_id,
                    candidate_id,
                    message,
                    response,
                } => {
                    let result =
                        self.handle_set_campaign_message(&election_id, &candidate_id, message);
                    let _ = response.send(result);
                }
                BallotMessage::ToggleElection {
                    election_id,
                    response,
                } => {
                    let result = self.handle_toggle_election(&election_id);
                    let _ = response.send(result);
                }
                BallotMessage::PublishResults {
                    election_id,
                    response,
                } => {
                    let result = self.handle_publish_results(&election_id);
                    let _ = response.send(result);
                }
                BallotMessage::CastBallot {
                    voter_id,
                    election_id,
                    candidate_id,
                    response,
                } => {
                    let result = self.handle_cast_ballot(voter_id, election_id, candidate_id);
                    let _ = response.send(result);
                }
                BallotMessage::InsertNotification {
                    notification,
                    response,
                } => {
                    let result = self.storage.insert_notification(&notification);
                    let _ = response.send(result);
                }
                BallotMessage::MarkAllRead { voter_id, response } => {
                    let result = self.storage.mark_all_read(&voter_id);
                    let _ = response.send(result);
                }
                BallotMessage::Shutdown => {
                    tracing::info!("Ballot actor shutting down");
                    break;
                }
            }
        }

        tracing::info!("Ballot actor stopped");
    }

    fn handle_register_voter(&self, voter: &Voter) -> Result<()> {
        self.storage.insert_voter(voter)
    }

    fn handle_set_verification(
        &self,
        voter_id: &Uuid,
        status: VerificationStatus,
    ) -> Result<Voter> {
        let mut voter = self
            .storage
            .get_voter(voter_id)?
            .ok_or_else(|| Error::NotFound(format!("voter {}", voter_id)))?;

        voter.verification_status = status;
        // verified_at marks when the status left Pending.
        voter.verified_at = match status {
            VerificationStatus::Pending => None,
            _ => Some(Utc::now()),
        };
        self.storage.update_voter(&voter)?;
        Ok(voter)
    }

    fn handle_register_candidate(&self, candidate: &Candidate) -> Result<()> {
        if self.storage.get_party(&candidate.party_id)?.is_none() {
            return Err(Error::NotFound(format!("party {}", candidate.party_id)));
        }
        self.storage.insert_candidate(candidate)
    }

    fn handle_set_candidate_approval(
        &self,
        candidate_id: &Uuid,
        approved: bool,
    ) -> Result<Candidate> {
        let mut candidate = self
            .storage
            .get_candidate(candidate_id)?
            .ok_or_else(|| Error::NotFound(format!("candidate {}", candidate_id)))?;

        candidate.approved = approved;
        self.storage.update_candidate(&candidate)?;
        Ok(candidate)
    }

    /// Returns the attachment record and whether it was newly created.
    fn handle_attach_candidate(
        &self,
        election_id: &Uuid,
        candidate_id: &Uuid,
    ) -> Result<(Campaign, bool)> {
        if self.storage.get_election(election_id)?.is_none() {
            return Err(Error::NotFound(format!("election {}", election_id)));
        }
        if self.storage.get_candidate(candidate_id)?.is_none() {
            return Err(Error::NotFound(format!("candidate {}", candidate_id)));
        }

        // Re-attaching is a no-op.
        if let Some(existing) = self.storage.get_campaign(election_id, candidate_id)? {
            return Ok((existing, false));
        }

        let campaign = Campaign::new(*election_id, *candidate_id);
        self.storage.put_campaign(&campaign)?;
        Ok((campaign, true))
    }

    fn handle_set_campaign_message(
        &self,
        election_id: &Uuid,
        candidate_id: &Uuid,
        message: String,
    ) -> Result<Campaign> {
        let mut campaign = self
            .storage
            .get_campaign(election_id, candidate_id)?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "campaign for candidate {} in election {}",
                    candidate_id, election_id
                ))
            })?;

        campaign.message = message;
        self.storage.put_campaign(&campaign)?;
        Ok(campaign)
    }

    fn handle_toggle_election(&self, election_id: &Uuid) -> Result<Election> {
        let mut election = self
            .storage
            .get_election(election_id)?
            .ok_or_else(|| Error::NotFound(format!("election {}", election_id)))?;

        election.is_active = !election.is_active;
        self.storage.update_election(&election)?;
        Ok(election)
    }

    fn handle_publish_results(&self, election_id: &Uuid) -> Result<Election> {
        let mut election = self
            .storage
            .get_election(election_id)?
            .ok_or_else(|| Error::NotFound(format!("election {}", election_id)))?;

        if election.results_published {
            tracing::warn!(election_id = %election_id, "Results already published");
            return Err(Error::AlreadyPublished);
        }

        election.results_published = true;
        self.storage.update_election(&election)?;
        Ok(election)
    }

    /// The authoritative duplicate check lives in the storage insert;
    /// the actor only guarantees no interleaving write.
    fn handle_cast_ballot(
        &self,
        voter_id: Uuid,
        election_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vote> {
        let vote = Vote::new(election_id, voter_id, candidate_id);
        self.storage.insert_vote(&vote)?;
        Ok(vote)
    }
}

/// Handle for sending messages to the ballot actor
#[derive(Clone)]
pub struct BallotHandle {
    sender: mpsc::Sender<BallotMessage>,
}

impl BallotHandle {
    /// Register a voter
    pub async fn register_voter(&self, voter: Voter) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::RegisterVoter {
                voter,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Set a voter's verification status
    pub async fn set_verification(
        &self,
        voter_id: Uuid,
        status: VerificationStatus,
    ) -> Result<Voter> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::SetVerification {
                voter_id,
                status,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Remove a voter and their dependent rows
    pub async fn purge_voter(&self, voter_id: Uuid) -> Result<CascadeReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::PurgeVoter {
                voter_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Create a party
    pub async fn create_party(&self, party: Party) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::CreateParty {
                party,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Rename a party
    pub async fn rename_party(&self, party_id: Uuid, new_name: String) -> Result<Party> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::RenameParty {
                party_id,
                new_name,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Remove a party
    pub async fn remove_party(&self, party_id: Uuid) -> Result<Party> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::RemoveParty {
                party_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Register a candidate
    pub async fn register_candidate(&self, candidate: Candidate) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::RegisterCandidate {
                candidate,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Flip a candidate's approval flag
    pub async fn set_candidate_approval(
        &self,
        candidate_id: Uuid,
        approved: bool,
    ) -> Result<Candidate> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::SetCandidateApproval {
                candidate_id,
                approved,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Remove a candidate
    pub async fn remove_candidate(&self, candidate_id: Uuid) -> Result<Candidate> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::RemoveCandidate {
                candidate_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Create an election
    pub async fn create_election(&self, election: Election) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::CreateElection {
                election,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Attach a candidate to an election; the flag reports whether
    /// the attachment is new
    pub async fn attach_candidate(
        &self,
        election_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<(Campaign, bool)> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::AttachCandidate {
                election_id,
                candidate_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Update an attachment's campaign message
    pub async fn set_campaign_message(
        &self,
        election_id: Uuid,
        candidate_id: Uuid,
        message: String,
    ) -> Result<Campaign> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::SetCampaignMessage {
                election_id,
                candidate_id,
                message,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Flip an election's active flag
    pub async fn toggle_election(&self, election_id: Uuid) -> Result<Election> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::ToggleElection {
                election_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Set an election's results-published flag
    pub async fn publish_results(&self, election_id: Uuid) -> Result<Election> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::PublishResults {
                election_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Record one vote
    pub async fn cast_ballot(
        &self,
        voter_id: Uuid,
        election_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vote> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::CastBallot {
                voter_id,
                election_id,
                candidate_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Append a notification
    pub async fn insert_notification(&self, notification: Notification) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::InsertNotification {
                notification,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Mark all of a voter's notifications read
    pub async fn mark_all_read(&self, voter_id: Uuid) -> Result<u64> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(BallotMessage::MarkAllRead {
                voter_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Send shutdown signal
    pub async fn shutdown(&self) {
        let _ = self.sender.send(BallotMessage::Shutdown).await;
    }
}

/// Spawn the ballot actor and return a handle to it
pub fn spawn_ballot_actor(storage: Arc<Storage>, mailbox_capacity: usize) -> BallotHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = BallotActor::new(storage, rx);
    tokio::spawn(actor.run());
    BallotHandle { sender: tx }
}
