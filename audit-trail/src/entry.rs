//! Audit entry shape and hash chaining

use chrono::{DateTime, SecondsFormat, Utc};
use event_bus::{ActionKind, Event, TargetKind};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Previous-hash value for the first entry in a log
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// One line of the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry id (time-ordered)
    pub id: Uuid,
    /// Position in the log, starting at 0
    pub sequence: u64,
    /// User who performed the action, if known
    pub actor: Option<Uuid>,
    /// What happened to the target
    pub action: ActionKind,
    /// Kind of entity acted on
    pub target: TargetKind,
    /// Id of the entity acted on
    pub target_id: Uuid,
    /// Human-readable label for the target at the time of the action
    pub target_label: String,
    /// Structured snapshot of the change
    pub detail: serde_json::Value,
    /// When the entry was recorded
    pub recorded_at: DateTime<Utc>,
    /// Hash of the preceding entry, or [`GENESIS_HASH`]
    pub previous_hash: String,
    /// SHA-256 over this entry's canonical fields
    pub hash: String,
}

impl AuditEntry {
    /// Build an entry and seal its hash
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        actor: Option<Uuid>,
        action: ActionKind,
        target: TargetKind,
        target_id: Uuid,
        target_label: impl Into<String>,
        detail: serde_json::Value,
        previous_hash: impl Into<String>,
    ) -> Self {
        let mut entry = Self {
            id: Uuid::now_v7(),
            sequence,
            actor,
            action,
            target,
            target_id,
            target_label: target_label.into(),
            detail,
            recorded_at: Utc::now(),
            previous_hash: previous_hash.into(),
            hash: String::new(),
        };
        entry.hash = entry.compute_hash();
        entry
    }

    /// Build an entry from a committed mutation event
    pub fn from_event(event: &Event, sequence: u64, previous_hash: impl Into<String>) -> Self {
        let detail = json!({
            "event": event.kind.name(),
            "election_id": event.election_id,
            "payload": event.payload,
        });
        let mut entry = Self {
            id: Uuid::now_v7(),
            sequence,
            actor: event.actor,
            action: event.kind.action(),
            target: event.kind.target(),
            target_id: event.subject_id,
            target_label: event.subject.clone(),
            detail,
            recorded_at: event.occurred_at,
            previous_hash: previous_hash.into(),
            hash: String::new(),
        };
        entry.hash = entry.compute_hash();
        entry
    }

    /// SHA-256 over the canonical field encoding. The `hash` field
    /// itself is excluded.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sequence.to_be_bytes());
        hasher.update(self.id.as_bytes());
        if let Some(actor) = self.actor {
            hasher.update(actor.as_bytes());
        }
        hasher.update(self.action.as_str().as_bytes());
        hasher.update(self.target.as_str().as_bytes());
        hasher.update(self.target_id.as_bytes());
        hasher.update(self.target_label.as_bytes());
        // serde_json::Value keeps object keys sorted, so this string
        // is stable across serialize/deserialize cycles.
        hasher.update(self.detail.to_string().as_bytes());
        hasher.update(
            self.recorded_at
                .to_rfc3339_opts(SecondsFormat::Nanos, true)
                .as_bytes(),
        );
        hasher.update(self.previous_hash.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// True when the stored hash matches the recomputed one
    pub fn verify_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_bus::EventKind;

    #[test]
    fn test_new_entry_is_sealed() {
        let entry = AuditEntry::new(
            0,
            None,
            ActionKind::Create,
            TargetKind::Party,
            Uuid::new_v4(),
            "Unity",
            json!({"name": "Unity"}),
            GENESIS_HASH,
        );
        assert!(entry.verify_hash());
        assert_eq!(entry.hash.len(), 64);
    }

    #[test]
    fn test_tampering_breaks_hash() {
        let mut entry = AuditEntry::new(
            3,
            Some(Uuid::new_v4()),
            ActionKind::Update,
            TargetKind::Voter,
            Uuid::new_v4(),
            "VR-2024-0001",
            json!({"verification_status": "verified"}),
            GENESIS_HASH,
        );
        assert!(entry.verify_hash());

        entry.target_label = "VR-2024-0002".to_string();
        assert!(!entry.verify_hash());
    }

    #[test]
    fn test_hash_survives_json_roundtrip() {
        let entry = AuditEntry::new(
            7,
            None,
            ActionKind::Delete,
            TargetKind::Candidate,
            Uuid::new_v4(),
            "Jane Doe",
            json!({"reason": "withdrawn", "area": "North Ward"}),
            GENESIS_HASH,
        );

        let line = serde_json::to_string(&entry).unwrap();
        let restored: AuditEntry = serde_json::from_str(&line).unwrap();
        assert!(restored.verify_hash());
        assert_eq!(restored.hash, entry.hash);
    }

    #[test]
    fn test_from_event_maps_kind() {
        let voter = Uuid::new_v4();
        let event = Event::new(EventKind::VoterVerified, voter, "VR-2024-0001")
            .with_payload(json!({"verification_status": "verified"}));

        let entry = AuditEntry::from_event(&event, 0, GENESIS_HASH);
        assert_eq!(entry.action, ActionKind::Update);
        assert_eq!(entry.target, TargetKind::Voter);
        assert_eq!(entry.target_id, voter);
        assert_eq!(entry.detail["event"], "voter.verified");
        assert!(entry.verify_hash());
    }
}
