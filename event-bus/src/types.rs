//! Type definitions for the event bus

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of events the core publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Voter record created
    VoterRegistered,
    /// Verification status changed
    VoterVerified,
    /// Voter removed, votes and notifications cascaded
    VoterRemoved,
    /// Candidate record created
    CandidateRegistered,
    /// Candidate approved to receive votes
    CandidateApproved,
    /// Candidate removed
    CandidateRemoved,
    /// Party created
    PartyCreated,
    /// Party renamed
    PartyRenamed,
    /// Party removed
    PartyRemoved,
    /// Election created
    ElectionCreated,
    /// Candidate attached to an election
    CandidateAttached,
    /// Campaign message updated
    CampaignUpdated,
    /// Election active flag flipped
    ElectionToggled,
    /// Election results published
    ResultsPublished,
    /// Vote durably recorded
    VoteCast,
}

impl EventKind {
    /// Dotted event name, used in logs and metric labels
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::VoterRegistered => "voter.registered",
            EventKind::VoterVerified => "voter.verified",
            EventKind::VoterRemoved => "voter.removed",
            EventKind::CandidateRegistered => "candidate.registered",
            EventKind::CandidateApproved => "candidate.approved",
            EventKind::CandidateRemoved => "candidate.removed",
            EventKind::PartyCreated => "party.created",
            EventKind::PartyRenamed => "party.renamed",
            EventKind::PartyRemoved => "party.removed",
            EventKind::ElectionCreated => "election.created",
            EventKind::CandidateAttached => "election.candidate_attached",
            EventKind::CampaignUpdated => "election.campaign_updated",
            EventKind::ElectionToggled => "election.toggled",
            EventKind::ResultsPublished => "election.results_published",
            EventKind::VoteCast => "vote.cast",
        }
    }

    /// Entity kind the event targets
    pub fn target(&self) -> TargetKind {
        match self {
            EventKind::VoterRegistered | EventKind::VoterVerified | EventKind::VoterRemoved => {
                TargetKind::Voter
            }
            EventKind::CandidateRegistered
            | EventKind::CandidateApproved
            | EventKind::CandidateRemoved => TargetKind::Candidate,
            EventKind::PartyCreated | EventKind::PartyRenamed | EventKind::PartyRemoved => {
                TargetKind::Party
            }
            EventKind::ElectionCreated
            | EventKind::CandidateAttached
            | EventKind::CampaignUpdated
            | EventKind::ElectionToggled
            | EventKind::ResultsPublished => TargetKind::Election,
            EventKind::VoteCast => TargetKind::Vote,
        }
    }

    /// Mutation class of the event
    pub fn action(&self) -> ActionKind {
        match self {
            EventKind::VoterRegistered
            | EventKind::CandidateRegistered
            | EventKind::PartyCreated
            | EventKind::ElectionCreated
            | EventKind::VoteCast => ActionKind::Create,
            EventKind::VoterVerified
            | EventKind::CandidateApproved
            | EventKind::PartyRenamed
            | EventKind::CandidateAttached
            | EventKind::CampaignUpdated
            | EventKind::ElectionToggled
            | EventKind::ResultsPublished => ActionKind::Update,
            EventKind::VoterRemoved | EventKind::CandidateRemoved | EventKind::PartyRemoved => {
                ActionKind::Delete
            }
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Entity kinds that mutation events target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Voter record
    Voter,
    /// Candidate record
    Candidate,
    /// Party record
    Party,
    /// Election record (including attachment and publish state)
    Election,
    /// Vote record
    Vote,
}

impl TargetKind {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Voter => "voter",
            TargetKind::Candidate => "candidate",
            TargetKind::Party => "party",
            TargetKind::Election => "election",
            TargetKind::Vote => "vote",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutation classes recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Entity created
    Create,
    /// Entity updated
    Update,
    /// Entity deleted
    Delete,
    /// Anything else (external tooling)
    Other,
}

impl ActionKind {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::Other => "other",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_targets() {
        assert_eq!(EventKind::VoteCast.target(), TargetKind::Vote);
        assert_eq!(EventKind::VoterVerified.target(), TargetKind::Voter);
        assert_eq!(EventKind::ResultsPublished.target(), TargetKind::Election);
        assert_eq!(EventKind::PartyRemoved.target(), TargetKind::Party);
    }

    #[test]
    fn test_kind_actions() {
        assert_eq!(EventKind::VoteCast.action(), ActionKind::Create);
        assert_eq!(EventKind::VoterVerified.action(), ActionKind::Update);
        assert_eq!(EventKind::VoterRemoved.action(), ActionKind::Delete);
    }

    #[test]
    fn test_names_are_dotted() {
        assert_eq!(EventKind::VoteCast.name(), "vote.cast");
        assert_eq!(
            EventKind::ResultsPublished.name(),
            "election.results_published"
        );
    }
}
