//! Event envelope published after a mutation commits

use crate::types::EventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A committed mutation, as delivered to observers.
///
/// Events are published only after the write is durable, so an
/// observer never sees a mutation that later failed. The `payload`
/// carries an entity snapshot as loose JSON so downstream crates do
/// not need the core's type definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event id, time-ordered
    pub id: Uuid,
    /// What happened
    pub kind: EventKind,
    /// Admin or voter who performed the mutation, if known
    pub actor: Option<Uuid>,
    /// Id of the entity the event targets
    pub subject_id: Uuid,
    /// Human-readable label for the subject (name, title, registration number)
    pub subject: String,
    /// Voter the event concerns, when distinct from the subject
    pub voter_id: Option<Uuid>,
    /// Election the event concerns, if any
    pub election_id: Option<Uuid>,
    /// Snapshot of the entity after the mutation
    pub payload: serde_json::Value,
    /// When the mutation committed
    pub occurred_at: DateTime<Utc>,
}

impl Event {
    /// Create a new event for a committed mutation
    pub fn new(kind: EventKind, subject_id: Uuid, subject: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            actor: None,
            subject_id,
            subject: subject.into(),
            voter_id: None,
            election_id: None,
            payload: serde_json::Value::Null,
            occurred_at: Utc::now(),
        }
    }

    /// Attach the acting user
    pub fn with_actor(mut self, actor: Uuid) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attach the voter the event concerns
    pub fn with_voter(mut self, voter_id: Uuid) -> Self {
        self.voter_id = Some(voter_id);
        self
    }

    /// Attach the election the event concerns
    pub fn with_election(mut self, election_id: Uuid) -> Self {
        self.election_id = Some(election_id);
        self
    }

    /// Attach an entity snapshot
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_creation() {
        let subject = Uuid::new_v4();
        let event = Event::new(EventKind::VoterRegistered, subject, "VR-2024-0001");

        assert_eq!(event.kind, EventKind::VoterRegistered);
        assert_eq!(event.subject_id, subject);
        assert_eq!(event.subject, "VR-2024-0001");
        assert!(event.actor.is_none());
        assert!(event.payload.is_null());
    }

    #[test]
    fn test_event_builders() {
        let subject = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let election = Uuid::new_v4();

        let event = Event::new(EventKind::VoteCast, subject, "ballot")
            .with_actor(actor)
            .with_voter(actor)
            .with_election(election)
            .with_payload(json!({"candidate": "Jane Doe"}));

        assert_eq!(event.actor, Some(actor));
        assert_eq!(event.voter_id, Some(actor));
        assert_eq!(event.election_id, Some(election));
        assert_eq!(event.payload["candidate"], "Jane Doe");
    }

    #[test]
    fn test_event_ids_are_time_ordered() {
        let a = Event::new(EventKind::PartyCreated, Uuid::new_v4(), "Unity");
        let b = Event::new(EventKind::PartyCreated, Uuid::new_v4(), "Progress");
        assert!(a.id <= b.id);
    }
}
