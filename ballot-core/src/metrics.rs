//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the engine.
//!
//! # Metrics
//!
//! - `ballot_operations_total` - Mutating operations by name and outcome
//! - `ballot_votes_cast_total` - Total number of votes recorded
//! - `ballot_gate_denials_total` - Vote gate denials by reason
//! - `ballot_cast_duration_seconds` - Histogram of cast_vote latencies

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
};
use std::sync::Arc;

/// Metrics collector
///
/// Every metric lives in the instance registry, so multiple engines
/// in one process never collide.
#[derive(Clone)]
pub struct EngineMetrics {
    /// Mutating operations by name and outcome
    pub operations: IntCounterVec,

    /// Total votes recorded
    pub votes_cast: IntCounter,

    /// Vote gate denials by reason
    pub gate_denials: IntCounterVec,

    /// cast_vote duration histogram
    pub cast_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl EngineMetrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations = IntCounterVec::new(
            Opts::new(
                "ballot_operations_total",
                "Mutating operations by name and outcome",
            ),
            &["operation", "status"],
        )?;
        registry.register(Box::new(operations.clone()))?;

        let votes_cast = IntCounter::new(
            "ballot_votes_cast_total",
            "Total number of votes recorded",
        )?;
        registry.register(Box::new(votes_cast.clone()))?;

        let gate_denials = IntCounterVec::new(
            Opts::new("ballot_gate_denials_total", "Vote gate denials by reason"),
            &["reason"],
        )?;
        registry.register(Box::new(gate_denials.clone()))?;

        let cast_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ballot_cast_duration_seconds",
                "Histogram of cast_vote latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(cast_duration.clone()))?;

        Ok(Self {
            operations,
            votes_cast,
            gate_denials,
            cast_duration,
            registry,
        })
    }

    /// Record a mutating operation outcome
    pub fn record_operation(&self, operation: &str, status: &str) {
        self.operations.with_label_values(&[operation, status]).inc();
    }

    /// Record a successful vote
    pub fn record_vote_cast(&self) {
        self.votes_cast.inc();
    }

    /// Record a vote gate denial
    pub fn record_gate_denial(&self, reason: &str) {
        self.gate_denials.with_label_values(&[reason]).inc();
    }

    /// Record cast_vote duration
    pub fn record_cast_duration(&self, duration_seconds: f64) {
        self.cast_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
