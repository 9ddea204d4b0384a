//! Engine facade
//!
//! Wires the storage layer, the writer actor, the event bus, the
//! audit recorder, and the notification emitter into one handle.
//! Mutations flow through the actor; events are published to
//! observers only after the actor confirms the durable write. Reads
//! go straight to storage.

use crate::{
    actor::{spawn_ballot_actor, BallotHandle},
    config::Config,
    error::{Error, Result},
    inbox::Notifier,
    metrics::EngineMetrics,
    storage::Storage,
    types::{Election, EngineStats},
};
use audit_trail::{AuditEntry, AuditRecorder};
use chrono::Utc;
use eligibility::VoterIdentity;
use event_bus::{ActionKind, Event, EventBus, EventObserver, TargetKind};
use std::sync::Arc;
use tally_engine::{rank, Ranking, Roster};
use uuid::Uuid;

/// The voting engine
pub struct Engine {
    /// Configuration
    pub(crate) config: Config,
    /// Storage layer (direct reads)
    pub(crate) storage: Arc<Storage>,
    /// Writer actor handle
    pub(crate) handle: BallotHandle,
    /// Post-commit event bus
    pub(crate) bus: Arc<EventBus>,
    /// Audit recorder; registered on the bus, kept for reads
    pub(crate) audit: Arc<AuditRecorder>,
    /// Metrics collector
    pub(crate) metrics: EngineMetrics,
}

impl Engine {
    /// Open the engine with the given configuration.
    ///
    /// Spawns the writer actor and registers the built-in observers
    /// (audit recorder, notification emitter) on the event bus.
    pub async fn open(config: Config) -> Result<Self> {
        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            data_dir = %config.data_dir.display(),
            "Opening ballot engine"
        );

        let storage = Arc::new(Storage::open(&config)?);
        let handle = spawn_ballot_actor(storage.clone(), config.actor.mailbox_capacity);

        let audit = Arc::new(AuditRecorder::new(config.audit.clone())?);

        let bus = Arc::new(EventBus::new());
        bus.register(audit.clone());
        bus.register(Arc::new(Notifier::new(storage.clone(), handle.clone())));

        let metrics = EngineMetrics::new()
            .map_err(|e| Error::Config(format!("Failed to create metrics: {}", e)))?;

        Ok(Self {
            config,
            storage,
            handle,
            bus,
            audit,
            metrics,
        })
    }

    /// Register an additional event observer
    pub fn register_observer(&self, observer: Arc<dyn EventObserver>) {
        self.bus.register(observer);
    }

    /// Fail with [`Error::Forbidden`] unless the caller is an admin
    pub(crate) fn require_admin(actor: &VoterIdentity) -> Result<()> {
        if actor.role.can_administer() {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }

    /// Publish a post-commit event to the registered observers.
    /// Observer failures are logged by the bus, never surfaced.
    pub(crate) async fn emit(&self, event: Event) {
        self.bus.publish(&event).await;
    }

    /// Count an operation outcome in the metrics
    pub(crate) fn record_outcome<T>(&self, operation: &str, result: &Result<T>) {
        let status = if result.is_ok() { "ok" } else { "error" };
        self.metrics.record_operation(operation, status);
    }

    // Results

    /// Rank an election's votes regardless of the publish gate.
    /// Administrative; voters read through [`Engine::published_results`].
    pub fn tally(&self, actor: &VoterIdentity, election_id: &Uuid) -> Result<Ranking> {
        Self::require_admin(actor)?;
        let election = self
            .storage
            .get_election(election_id)?
            .ok_or_else(|| Error::NotFound(format!("election {}", election_id)))?;
        self.compute_ranking(&election)
    }

    /// The voter-facing results read, gated on the published flag
    pub fn published_results(&self, election_id: &Uuid) -> Result<Ranking> {
        let election = self
            .storage
            .get_election(election_id)?
            .ok_or_else(|| Error::NotFound(format!("election {}", election_id)))?;

        if !election.results_published {
            return Err(Error::ResultsNotPublished);
        }
        self.compute_ranking(&election)
    }

    fn compute_ranking(&self, election: &Election) -> Result<Ranking> {
        let mut roster = Roster::new();
        for candidate_id in self.storage.candidate_ids_for(&election.id)? {
            if let Some(candidate) = self.storage.get_candidate(&candidate_id)? {
                let party_name = self
                    .storage
                    .get_party(&candidate.party_id)?
                    .map(|party| party.name)
                    .unwrap_or_default();
                roster.insert(candidate.id, candidate.full_name, party_name);
            }
        }

        let ballots: Vec<Uuid> = self
            .storage
            .votes_for_election(&election.id)?
            .into_iter()
            .map(|vote| vote.candidate_id)
            .collect();

        Ok(rank(election.id, &roster, ballots)?)
    }

    // Audit reads

    /// Audit entries, newest first, optionally filtered
    pub fn audit_entries(
        &self,
        actor: &VoterIdentity,
        target: Option<TargetKind>,
        action: Option<ActionKind>,
    ) -> Result<Vec<AuditEntry>> {
        Self::require_admin(actor)?;
        Ok(self.audit.entries(target, action)?)
    }

    /// Walk the audit hash chain; returns the verified entry count
    pub fn verify_audit_chain(&self, actor: &VoterIdentity) -> Result<u64> {
        Self::require_admin(actor)?;
        Ok(self.audit.verify_integrity()?)
    }

    // Overview

    /// Dashboard counters. Voter, party, and vote totals are RocksDB
    /// estimates; the candidate and election figures are exact.
    pub fn stats(&self) -> Result<EngineStats> {
        let now = Utc::now();
        let (candidates, pending_approvals) = self.storage.candidate_counts()?;
        let (elections, active_elections, results_ready) = self.storage.election_counts(now)?;

        Ok(EngineStats {
            voters: self.storage.voter_count()?,
            pending_approvals,
            parties: self.storage.party_count()?,
            candidates,
            elections,
            active_elections,
            votes_cast: self.storage.vote_count()?,
            results_ready,
        })
    }

    /// Engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics collector
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Shutdown the engine gracefully
    pub async fn shutdown(self) {
        tracing::info!("Shutting down ballot engine");
        self.handle.shutdown().await;
    }
}
