//! In-process event bus for BallotCore
//!
//! Mutating operations publish an event after their write is durably
//! committed; registered observers (audit recorder, notification
//! emitter) consume it synchronously. Observation is explicit: the set
//! of event kinds is a closed enum and observers are registered at
//! startup. There is no ambient hook that fires on arbitrary saves.
//!
//! Observer failures are logged and isolated per observer. They never
//! roll back or mask the operation that published the event.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod bus;
pub mod error;
pub mod event;
pub mod metrics;
pub mod types;

pub use bus::{EventBus, EventObserver};
pub use error::{Error, Result};
pub use event::Event;
pub use types::{ActionKind, EventKind, TargetKind};
