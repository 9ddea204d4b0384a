//! Prometheus metrics for event delivery

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec,
};

lazy_static! {
    /// Events published, by kind
    pub static ref EVENTS_PUBLISHED: CounterVec = register_counter_vec!(
        "ballot_events_published_total",
        "Total events published on the bus",
        &["kind"]
    )
    .unwrap();

    /// Per-observer delivery outcomes
    pub static ref EVENTS_DELIVERED: CounterVec = register_counter_vec!(
        "ballot_events_delivered_total",
        "Observer delivery outcomes",
        &["kind", "observer", "status"]
    )
    .unwrap();

    /// Time spent inside a single observer
    pub static ref DELIVERY_DURATION: HistogramVec = register_histogram_vec!(
        "ballot_event_delivery_seconds",
        "Observer handling duration in seconds",
        &["observer"],
        vec![0.0001, 0.001, 0.01, 0.05, 0.1, 0.5, 1.0]
    )
    .unwrap();
}
