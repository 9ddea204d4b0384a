//! Notification inbox
//!
//! The emitter observes the event bus and enqueues inbox records for
//! the affected voters; delivery to any real channel is someone
//! else's job. Failures are reported to the bus, which logs and
//! isolates them, so a lost notification never fails the triggering
//! operation.

use crate::{
    actor::BallotHandle,
    error::Result,
    storage::Storage,
    types::{Notification, NotificationKind},
};
use async_trait::async_trait;
use event_bus::{Event, EventKind, EventObserver};
use std::sync::Arc;
use uuid::Uuid;

/// Bus observer that turns events into inbox records
pub struct Notifier {
    storage: Arc<Storage>,
    handle: BallotHandle,
}

impl Notifier {
    /// Create an emitter writing through the given actor handle
    pub fn new(storage: Arc<Storage>, handle: BallotHandle) -> Self {
        Self { storage, handle }
    }

    async fn push(&self, notification: Notification) -> event_bus::Result<()> {
        self.handle
            .insert_notification(notification)
            .await
            .map_err(|e| event_bus::Error::Observer(format!("notification insert failed: {}", e)))
    }
}

#[async_trait]
impl EventObserver for Notifier {
    fn name(&self) -> &str {
        "notification-emitter"
    }

    async fn observe(&self, event: &Event) -> event_bus::Result<()> {
        match event.kind {
            EventKind::VoterRegistered => {
                let voter_id = match event.voter_id {
                    Some(id) => id,
                    None => return Ok(()),
                };
                self.push(Notification::new(
                    voter_id,
                    NotificationKind::Registration,
                    "Registration received",
                    format!(
                        "Welcome {}. Your registration is awaiting verification.",
                        event.subject
                    ),
                ))
                .await
            }
            EventKind::VoterVerified => {
                let voter_id = match event.voter_id {
                    Some(id) => id,
                    None => return Ok(()),
                };
                let (title, message) = match event.payload["status"].as_str() {
                    Some("verified") => (
                        "Registration verified",
                        "Your voter registration has been verified. You may vote in open elections.",
                    ),
                    Some("rejected") => (
                        "Registration rejected",
                        "Your voter registration was rejected. Contact the election office for details.",
                    ),
                    // A reset to pending carries no message.
                    _ => return Ok(()),
                };
                self.push(Notification::new(
                    voter_id,
                    NotificationKind::Verification,
                    title,
                    message,
                ))
                .await
            }
            EventKind::VoteCast => {
                let voter_id = match event.voter_id {
                    Some(id) => id,
                    None => return Ok(()),
                };
                let election_title = event.payload["election_title"]
                    .as_str()
                    .unwrap_or("the election");
                let mut notification = Notification::new(
                    voter_id,
                    NotificationKind::VoteConfirmation,
                    "Vote recorded",
                    format!("Your vote in {} has been recorded.", election_title),
                );
                if let Some(election_id) = event.election_id {
                    notification = notification.with_election(election_id);
                }
                self.push(notification).await
            }
            EventKind::ResultsPublished => {
                let election_id = match event.election_id {
                    Some(id) => id,
                    None => return Ok(()),
                };
                // Everyone who cast a vote in the election hears
                // about the results.
                let votes = self
                    .storage
                    .votes_for_election(&election_id)
                    .map_err(|e| event_bus::Error::Observer(format!("vote scan failed: {}", e)))?;
                for vote in votes {
                    self.push(
                        Notification::new(
                            vote.voter_id,
                            NotificationKind::ResultsAvailable,
                            "Results available",
                            format!("Results for {} have been published.", event.subject),
                        )
                        .with_election(election_id),
                    )
                    .await?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl crate::engine::Engine {
    /// A voter's notifications, newest first
    pub fn notifications(&self, voter_id: &Uuid, unread_only: bool) -> Result<Vec<Notification>> {
        self.storage.notifications_of(voter_id, unread_only)
    }

    /// Unread notification count
    pub fn unread_count(&self, voter_id: &Uuid) -> Result<u64> {
        self.storage.unread_count(voter_id)
    }

    /// Mark all of a voter's notifications read; returns how many
    /// flipped
    pub async fn mark_all_read(&self, voter_id: Uuid) -> Result<u64> {
        let result = self.handle.mark_all_read(voter_id).await;
        self.record_outcome("mark_all_read", &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::spawn_ballot_actor;
    use crate::types::Vote;
    use crate::Config;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_notifier() -> (Notifier, Arc<Storage>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        let storage = Arc::new(Storage::open(&config).unwrap());
        let handle = spawn_ballot_actor(storage.clone(), 1000);
        (Notifier::new(storage.clone(), handle), storage, temp_dir)
    }

    #[tokio::test]
    async fn test_registration_notification() {
        let (notifier, storage, _temp) = test_notifier();
        let voter_id = Uuid::new_v4();

        let event = Event::new(EventKind::VoterRegistered, voter_id, "Asha Rao")
            .with_voter(voter_id);
        notifier.observe(&event).await.unwrap();

        let inbox = storage.notifications_of(&voter_id, false).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::Registration);
        assert!(inbox[0].message.contains("Asha Rao"));
    }

    #[tokio::test]
    async fn test_verification_wording_depends_on_status() {
        let (notifier, storage, _temp) = test_notifier();
        let voter_id = Uuid::new_v4();

        let verified = Event::new(EventKind::VoterVerified, voter_id, "Asha Rao")
            .with_voter(voter_id)
            .with_payload(json!({ "status": "verified" }));
        notifier.observe(&verified).await.unwrap();

        let rejected = Event::new(EventKind::VoterVerified, voter_id, "Asha Rao")
            .with_voter(voter_id)
            .with_payload(json!({ "status": "rejected" }));
        notifier.observe(&rejected).await.unwrap();

        // Back to pending: silent.
        let pending = Event::new(EventKind::VoterVerified, voter_id, "Asha Rao")
            .with_voter(voter_id)
            .with_payload(json!({ "status": "pending" }));
        notifier.observe(&pending).await.unwrap();

        let inbox = storage.notifications_of(&voter_id, false).unwrap();
        assert_eq!(inbox.len(), 2);
        // Newest first.
        assert_eq!(inbox[0].title, "Registration rejected");
        assert_eq!(inbox[1].title, "Registration verified");
    }

    #[tokio::test]
    async fn test_results_fan_out_to_participants() {
        let (notifier, storage, _temp) = test_notifier();
        let election_id = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        storage
            .insert_vote(&Vote::new(election_id, alice, Uuid::new_v4()))
            .unwrap();
        storage
            .insert_vote(&Vote::new(election_id, bob, Uuid::new_v4()))
            .unwrap();
        // A vote in some other election stays out of the fan-out.
        let carol = Uuid::new_v4();
        storage
            .insert_vote(&Vote::new(Uuid::new_v4(), carol, Uuid::new_v4()))
            .unwrap();

        let event = Event::new(EventKind::ResultsPublished, election_id, "City Council")
            .with_election(election_id);
        notifier.observe(&event).await.unwrap();

        for voter_id in [alice, bob] {
            let inbox = storage.notifications_of(&voter_id, false).unwrap();
            assert_eq!(inbox.len(), 1);
            assert_eq!(inbox[0].kind, NotificationKind::ResultsAvailable);
            assert_eq!(inbox[0].election_id, Some(election_id));
        }
        assert!(storage.notifications_of(&carol, false).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unrelated_events_ignored() {
        let (notifier, storage, _temp) = test_notifier();
        let voter_id = Uuid::new_v4();

        let event = Event::new(EventKind::PartyCreated, Uuid::new_v4(), "Unity")
            .with_voter(voter_id);
        notifier.observe(&event).await.unwrap();

        assert!(storage.notifications_of(&voter_id, false).unwrap().is_empty());
    }
}
