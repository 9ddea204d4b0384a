//! Hash-chained JSONL recorder and its read paths

use crate::entry::{AuditEntry, GENESIS_HASH};
use crate::error::{Error, Result};
use async_trait::async_trait;
use event_bus::{ActionKind, Event, EventObserver, TargetKind};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use uuid::Uuid;

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrailConfig {
    /// Path of the JSONL log file
    pub log_path: PathBuf,
    /// Chain each entry to its predecessor's hash
    pub enable_hash_chain: bool,
}

impl Default for AuditTrailConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("./data/audit/audit.log"),
            enable_hash_chain: true,
        }
    }
}

struct Inner {
    file: File,
    last_hash: String,
    next_sequence: u64,
}

/// Appends hash-chained entries to a JSONL log.
///
/// All writes go through one mutex, so sequence numbers and chain
/// links stay consistent under concurrent recording.
pub struct AuditRecorder {
    config: AuditTrailConfig,
    inner: Mutex<Inner>,
}

impl AuditRecorder {
    /// Open (or create) the log at the configured path and recover
    /// the chain position from its last entry.
    pub fn new(config: AuditTrailConfig) -> Result<Self> {
        if let Some(parent) = config.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (last_hash, next_sequence) = match Self::read_entries(&config.log_path)? {
            entries if entries.is_empty() => (GENESIS_HASH.to_string(), 0),
            entries => {
                let last = entries.last().unwrap();
                (last.hash.clone(), last.sequence + 1)
            }
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_path)?;

        info!(
            path = %config.log_path.display(),
            next_sequence,
            "audit log opened"
        );

        Ok(Self {
            config,
            inner: Mutex::new(Inner {
                file,
                last_hash,
                next_sequence,
            }),
        })
    }

    /// Record an action directly, outside of event delivery
    pub fn record(
        &self,
        actor: Option<Uuid>,
        action: ActionKind,
        target: TargetKind,
        target_id: Uuid,
        target_label: impl Into<String>,
        detail: serde_json::Value,
    ) -> Result<AuditEntry> {
        let label = target_label.into();
        self.append_with(|sequence, previous| {
            AuditEntry::new(
                sequence, actor, action, target, target_id, label, detail, previous,
            )
        })
    }

    /// Record a committed mutation event
    pub fn record_event(&self, event: &Event) -> Result<AuditEntry> {
        self.append_with(|sequence, previous| AuditEntry::from_event(event, sequence, previous))
    }

    fn append_with(&self, build: impl FnOnce(u64, String) -> AuditEntry) -> Result<AuditEntry> {
        let mut inner = self.inner.lock();

        let previous = if self.config.enable_hash_chain {
            inner.last_hash.clone()
        } else {
            GENESIS_HASH.to_string()
        };
        let entry = build(inner.next_sequence, previous);

        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');
        inner.file.write_all(&line)?;
        inner.file.flush()?;

        inner.last_hash = entry.hash.clone();
        inner.next_sequence += 1;

        debug!(sequence = entry.sequence, action = %entry.action, target = %entry.target, "audit entry recorded");
        Ok(entry)
    }

    /// List entries, newest first, optionally filtered by target
    /// and action kind.
    pub fn entries(
        &self,
        target: Option<TargetKind>,
        action: Option<ActionKind>,
    ) -> Result<Vec<AuditEntry>> {
        let mut entries = Self::read_entries(&self.config.log_path)?;
        entries.retain(|e| {
            target.map_or(true, |t| e.target == t) && action.map_or(true, |a| e.action == a)
        });
        entries.reverse();
        Ok(entries)
    }

    /// Replay the log and check every hash and chain link.
    ///
    /// Returns the number of verified entries, or the sequence at
    /// which the chain breaks.
    pub fn verify_integrity(&self) -> Result<u64> {
        let entries = Self::read_entries(&self.config.log_path)?;

        let mut expected_previous = GENESIS_HASH.to_string();
        let mut verified = 0u64;
        for entry in entries {
            if !entry.verify_hash() {
                return Err(Error::ChainBroken(entry.sequence));
            }
            if self.config.enable_hash_chain && entry.previous_hash != expected_previous {
                return Err(Error::ChainBroken(entry.sequence));
            }
            expected_previous = entry.hash.clone();
            verified += 1;
        }
        Ok(verified)
    }

    fn read_entries(path: &PathBuf) -> Result<Vec<AuditEntry>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }
}

#[async_trait]
impl EventObserver for AuditRecorder {
    fn name(&self) -> &str {
        "audit-trail"
    }

    async fn observe(&self, event: &Event) -> event_bus::Result<()> {
        self.record_event(event)
            .map(|_| ())
            .map_err(|e| event_bus::Error::Observer(format!("audit append failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_bus::{EventBus, EventKind};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_recorder() -> (AuditRecorder, AuditTrailConfig, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = AuditTrailConfig {
            log_path: dir.path().join("audit.log"),
            enable_hash_chain: true,
        };
        let recorder = AuditRecorder::new(config.clone()).unwrap();
        (recorder, config, dir)
    }

    #[test]
    fn test_record_and_list_newest_first() {
        let (recorder, _config, _dir) = test_recorder();

        recorder
            .record(
                None,
                ActionKind::Create,
                TargetKind::Party,
                Uuid::new_v4(),
                "Unity",
                json!({}),
            )
            .unwrap();
        recorder
            .record(
                None,
                ActionKind::Update,
                TargetKind::Voter,
                Uuid::new_v4(),
                "VR-2024-0001",
                json!({}),
            )
            .unwrap();
        recorder
            .record(
                None,
                ActionKind::Create,
                TargetKind::Vote,
                Uuid::new_v4(),
                "ballot",
                json!({}),
            )
            .unwrap();

        let entries = recorder.entries(None, None).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].target, TargetKind::Vote);
        assert_eq!(entries[0].sequence, 2);
        assert_eq!(entries[2].sequence, 0);
    }

    #[test]
    fn test_chain_links_entries() {
        let (recorder, _config, _dir) = test_recorder();

        recorder
            .record(
                None,
                ActionKind::Create,
                TargetKind::Party,
                Uuid::new_v4(),
                "Unity",
                json!({}),
            )
            .unwrap();
        recorder
            .record(
                None,
                ActionKind::Create,
                TargetKind::Party,
                Uuid::new_v4(),
                "Progress",
                json!({}),
            )
            .unwrap();

        let entries = recorder.entries(None, None).unwrap();
        // Newest first: entries[1] is the older entry.
        assert_eq!(entries[1].previous_hash, GENESIS_HASH);
        assert_eq!(entries[0].previous_hash, entries[1].hash);
    }

    #[test]
    fn test_filter_by_target_and_action() {
        let (recorder, _config, _dir) = test_recorder();

        recorder
            .record(
                None,
                ActionKind::Create,
                TargetKind::Party,
                Uuid::new_v4(),
                "Unity",
                json!({}),
            )
            .unwrap();
        recorder
            .record(
                None,
                ActionKind::Update,
                TargetKind::Voter,
                Uuid::new_v4(),
                "VR-2024-0001",
                json!({}),
            )
            .unwrap();

        let voters = recorder.entries(Some(TargetKind::Voter), None).unwrap();
        assert_eq!(voters.len(), 1);
        assert_eq!(voters[0].target_label, "VR-2024-0001");

        let creates = recorder.entries(None, Some(ActionKind::Create)).unwrap();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].target, TargetKind::Party);
    }

    #[test]
    fn test_verify_integrity_of_clean_log() {
        let (recorder, _config, _dir) = test_recorder();
        for i in 0..5 {
            recorder
                .record(
                    None,
                    ActionKind::Create,
                    TargetKind::Election,
                    Uuid::new_v4(),
                    format!("Election {i}"),
                    json!({}),
                )
                .unwrap();
        }
        assert_eq!(recorder.verify_integrity().unwrap(), 5);
    }

    #[test]
    fn test_detects_tampered_line() {
        let (recorder, config, _dir) = test_recorder();
        recorder
            .record(
                None,
                ActionKind::Create,
                TargetKind::Party,
                Uuid::new_v4(),
                "Unity",
                json!({}),
            )
            .unwrap();
        recorder
            .record(
                None,
                ActionKind::Create,
                TargetKind::Party,
                Uuid::new_v4(),
                "Progress",
                json!({}),
            )
            .unwrap();

        // Edit a recorded label in place.
        let raw = std::fs::read_to_string(&config.log_path).unwrap();
        std::fs::write(&config.log_path, raw.replace("Unity", "Untty")).unwrap();

        let err = recorder.verify_integrity().unwrap_err();
        assert!(matches!(err, Error::ChainBroken(0)));
    }

    #[test]
    fn test_chain_continues_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuditTrailConfig {
            log_path: dir.path().join("audit.log"),
            enable_hash_chain: true,
        };

        let first = AuditRecorder::new(config.clone()).unwrap();
        first
            .record(
                None,
                ActionKind::Create,
                TargetKind::Party,
                Uuid::new_v4(),
                "Unity",
                json!({}),
            )
            .unwrap();
        drop(first);

        let second = AuditRecorder::new(config).unwrap();
        second
            .record(
                None,
                ActionKind::Delete,
                TargetKind::Party,
                Uuid::new_v4(),
                "Unity",
                json!({}),
            )
            .unwrap();

        assert_eq!(second.verify_integrity().unwrap(), 2);
        let entries = second.entries(None, None).unwrap();
        assert_eq!(entries[0].sequence, 1);
        assert_eq!(entries[0].previous_hash, entries[1].hash);
    }

    #[tokio::test]
    async fn test_records_published_events() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuditTrailConfig {
            log_path: dir.path().join("audit.log"),
            enable_hash_chain: true,
        };
        let recorder = Arc::new(AuditRecorder::new(config).unwrap());

        let bus = EventBus::new();
        bus.register(recorder.clone());

        let voter = Uuid::new_v4();
        let event = Event::new(EventKind::VoterVerified, voter, "VR-2024-0001")
            .with_payload(json!({"verification_status": "verified"}));
        assert_eq!(bus.publish(&event).await, 1);

        let entries = recorder.entries(Some(TargetKind::Voter), None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, ActionKind::Update);
        assert_eq!(entries[0].target_id, voter);
    }
}
