//! Synchronous in-process event dispatch

use crate::event::Event;
use crate::metrics;
use crate::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Receives committed mutation events.
///
/// Observers run inline on the publishing task, in registration
/// order, after the mutation is durable. An observer returning an
/// error is logged and skipped; it never rolls back the mutation or
/// prevents delivery to later observers.
#[async_trait]
pub trait EventObserver: Send + Sync {
    /// Stable name, used in logs and metric labels
    fn name(&self) -> &str;

    /// Handle one committed event
    async fn observe(&self, event: &Event) -> Result<()>;
}

/// Registry of observers with synchronous post-commit delivery
pub struct EventBus {
    observers: RwLock<Vec<Arc<dyn EventObserver>>>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Register an observer. Delivery order follows registration order.
    pub fn register(&self, observer: Arc<dyn EventObserver>) {
        debug!(observer = observer.name(), "registering event observer");
        self.observers.write().push(observer);
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Deliver an event to every registered observer.
    ///
    /// Returns the number of observers that handled the event without
    /// error. Failures are logged per observer and do not stop the
    /// remaining deliveries.
    pub async fn publish(&self, event: &Event) -> usize {
        // Snapshot under the lock; observe() may suspend.
        let observers: Vec<Arc<dyn EventObserver>> = self.observers.read().clone();

        let mut delivered = 0;
        for observer in &observers {
            let start = Instant::now();
            match observer.observe(event).await {
                Ok(()) => {
                    delivered += 1;
                    metrics::EVENTS_DELIVERED
                        .with_label_values(&[event.kind.name(), observer.name(), "ok"])
                        .inc();
                }
                Err(e) => {
                    warn!(
                        observer = observer.name(),
                        kind = event.kind.name(),
                        event_id = %event.id,
                        error = %e,
                        "event observer failed"
                    );
                    metrics::EVENTS_DELIVERED
                        .with_label_values(&[event.kind.name(), observer.name(), "error"])
                        .inc();
                }
            }
            metrics::DELIVERY_DURATION
                .with_label_values(&[observer.name()])
                .observe(start.elapsed().as_secs_f64());
        }

        metrics::EVENTS_PUBLISHED
            .with_label_values(&[event.kind.name()])
            .inc();

        delivered
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct CountingObserver {
        name: &'static str,
        seen: AtomicUsize,
    }

    #[async_trait]
    impl EventObserver for CountingObserver {
        fn name(&self) -> &str {
            self.name
        }

        async fn observe(&self, _event: &Event) -> Result<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingObserver;

    #[async_trait]
    impl EventObserver for FailingObserver {
        fn name(&self) -> &str {
            "failing"
        }

        async fn observe(&self, _event: &Event) -> Result<()> {
            Err(Error::Observer("simulated failure".to_string()))
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_all_observers() {
        let bus = EventBus::new();
        let a = Arc::new(CountingObserver {
            name: "a",
            seen: AtomicUsize::new(0),
        });
        let b = Arc::new(CountingObserver {
            name: "b",
            seen: AtomicUsize::new(0),
        });
        bus.register(a.clone());
        bus.register(b.clone());

        let event = Event::new(EventKind::PartyCreated, Uuid::new_v4(), "Unity");
        let delivered = bus.publish(&event).await;

        assert_eq!(delivered, 2);
        assert_eq!(a.seen.load(Ordering::SeqCst), 1);
        assert_eq!(b.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_observer_does_not_block_others() {
        let bus = EventBus::new();
        let counting = Arc::new(CountingObserver {
            name: "counting",
            seen: AtomicUsize::new(0),
        });
        bus.register(Arc::new(FailingObserver));
        bus.register(counting.clone());

        let event = Event::new(EventKind::VoterRegistered, Uuid::new_v4(), "VR-1");
        let delivered = bus.publish(&event).await;

        assert_eq!(delivered, 1);
        assert_eq!(counting.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_publish_with_no_observers() {
        let bus = EventBus::new();
        let event = Event::new(EventKind::VoteCast, Uuid::new_v4(), "ballot");
        assert_eq!(bus.publish(&event).await, 0);
        assert_eq!(bus.observer_count(), 0);
    }
}
