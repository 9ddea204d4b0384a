//! Append-only audit trail
//!
//! Consumes committed mutation events and appends one hash-chained
//! JSON line per entry. Each entry carries the hash of its
//! predecessor, so truncation or in-place edits are detectable by
//! replaying the chain. Recording failures are reported to the caller
//! but, when wired as an event observer, never fail the operation
//! that produced the event.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod entry;
pub mod error;
pub mod recorder;

pub use entry::{AuditEntry, GENESIS_HASH};
pub use error::{Error, Result};
pub use recorder::{AuditRecorder, AuditTrailConfig};
