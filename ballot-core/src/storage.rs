//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `voters` - Voter records (key: voter_id)
//! - `voter_regnos` - Registration number uniqueness index (key: reg_no)
//! - `parties` - Party records (key: party_id)
//! - `party_names` - Party name uniqueness index (key: name)
//! - `party_candidates` - Membership index (key: party_id || candidate_id)
//! - `candidates` - Candidate records (key: candidate_id)
//! - `elections` - Election records (key: election_id)
//! - `campaigns` - Attachment records (key: election_id || candidate_id)
//! - `votes` - Vote records (key: vote_id, time-ordered)
//! - `ballots` - One-vote-per-election constraint (key: election_id || voter_id)
//! - `voter_votes` - Votes by voter (key: voter_id || vote_id)
//! - `election_votes` - Votes by election (key: election_id || vote_id)
//! - `notifications` - Inbox rows (key: voter_id || notification_id)
//!
//! The `ballots` family is the uniqueness constraint: its key must not
//! exist when a vote is inserted. Methods that check-then-write rely
//! on the caller serializing writes through the ballot actor.

use crate::{
    error::{Error, Result},
    types::{Campaign, Candidate, CascadeReport, Election, Notification, Party, RegNo, Vote, Voter},
    Config,
};
use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, IteratorMode, Options,
    SliceTransform, WriteBatch, DB,
};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_VOTERS: &str = "voters";
const CF_VOTER_REGNOS: &str = "voter_regnos";
const CF_PARTIES: &str = "parties";
const CF_PARTY_NAMES: &str = "party_names";
const CF_PARTY_CANDIDATES: &str = "party_candidates";
const CF_CANDIDATES: &str = "candidates";
const CF_ELECTIONS: &str = "elections";
const CF_CAMPAIGNS: &str = "campaigns";
const CF_VOTES: &str = "votes";
const CF_BALLOTS: &str = "ballots";
const CF_VOTER_VOTES: &str = "voter_votes";
const CF_ELECTION_VOTES: &str = "election_votes";
const CF_NOTIFICATIONS: &str = "notifications";

/// Fixed-width composite key: two raw UUIDs back to back
fn composite_key(a: &Uuid, b: &Uuid) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(a.as_bytes());
    key[16..].copy_from_slice(b.as_bytes());
    key
}

/// Second UUID of a composite key
fn uuid_at(key: &[u8], offset: usize) -> Result<Uuid> {
    let bytes: [u8; 16] = key[offset..offset + 16]
        .try_into()
        .map_err(|_| Error::Storage("Malformed composite key".to_string()))?;
    Ok(Uuid::from_bytes(bytes))
}

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
    // Column family handles are stored in DB, accessed by name
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        db_opts.set_level_zero_file_num_compaction_trigger(
            config.rocksdb.level0_file_num_compaction_trigger,
        );
        db_opts.set_max_open_files(config.rocksdb.max_open_files);

        // Universal compaction for the append-mostly vote workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        // Column family descriptors
        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_VOTERS, Self::cf_options_entities()),
            ColumnFamilyDescriptor::new(CF_VOTER_REGNOS, Self::cf_options_lookup()),
            ColumnFamilyDescriptor::new(CF_PARTIES, Self::cf_options_entities()),
            ColumnFamilyDescriptor::new(CF_PARTY_NAMES, Self::cf_options_lookup()),
            ColumnFamilyDescriptor::new(CF_PARTY_CANDIDATES, Self::cf_options_composite()),
            ColumnFamilyDescriptor::new(CF_CANDIDATES, Self::cf_options_entities()),
            ColumnFamilyDescriptor::new(CF_ELECTIONS, Self::cf_options_entities()),
            ColumnFamilyDescriptor::new(CF_CAMPAIGNS, Self::cf_options_composite()),
            ColumnFamilyDescriptor::new(CF_VOTES, Self::cf_options_entities()),
            ColumnFamilyDescriptor::new(CF_BALLOTS, Self::cf_options_lookup()),
            ColumnFamilyDescriptor::new(CF_VOTER_VOTES, Self::cf_options_composite()),
            ColumnFamilyDescriptor::new(CF_ELECTION_VOTES, Self::cf_options_composite()),
            ColumnFamilyDescriptor::new(CF_NOTIFICATIONS, Self::cf_options_composite()),
        ];

        // Open database
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = %path.display(), "Opened ballot store");

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_entities() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_lookup() -> Options {
        let mut opts = Options::default();
        // Point lookups on hot paths, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_options_composite() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Composite keys are scanned by their leading UUID
        opts.set_prefix_extractor(SliceTransform::create_fixed_prefix(16));
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Voter operations

    /// Insert a voter, enforcing registration number uniqueness.
    /// Callers serialize through the ballot actor.
    pub fn insert_voter(&self, voter: &Voter) -> Result<()> {
        let cf_regnos = self.cf_handle(CF_VOTER_REGNOS)?;
        let regno_key = voter.reg_no.as_str().as_bytes();

        if self.db.get_cf(&cf_regnos, regno_key)?.is_some() {
            return Err(Error::AlreadyExists(format!(
                "registration number {}",
                voter.reg_no
            )));
        }

        let cf_voters = self.cf_handle(CF_VOTERS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_voters, voter.id.as_bytes(), bincode::serialize(voter)?);
        batch.put_cf(&cf_regnos, regno_key, voter.id.as_bytes());
        self.db.write(batch)?;

        tracing::debug!(voter_id = %voter.id, reg_no = %voter.reg_no, "Voter registered");
        Ok(())
    }

    /// Get voter by id
    pub fn get_voter(&self, voter_id: &Uuid) -> Result<Option<Voter>> {
        let cf = self.cf_handle(CF_VOTERS)?;
        match self.db.get_cf(&cf, voter_id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Get voter by registration number
    pub fn voter_by_reg_no(&self, reg_no: &RegNo) -> Result<Option<Voter>> {
        let cf = self.cf_handle(CF_VOTER_REGNOS)?;
        match self.db.get_cf(&cf, reg_no.as_str().as_bytes())? {
            Some(id_bytes) => {
                let voter_id = uuid_at(&id_bytes, 0)?;
                self.get_voter(&voter_id)
            }
            None => Ok(None),
        }
    }

    /// Overwrite a voter record. The registration number never changes.
    pub fn update_voter(&self, voter: &Voter) -> Result<()> {
        let cf = self.cf_handle(CF_VOTERS)?;
        self.db
            .put_cf(&cf, voter.id.as_bytes(), bincode::serialize(voter)?)?;
        Ok(())
    }

    /// All voters, ordered by registration number
    pub fn list_voters(&self) -> Result<Vec<Voter>> {
        let cf = self.cf_handle(CF_VOTERS)?;
        let mut voters: Vec<Voter> = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            voters.push(bincode::deserialize(&value)?);
        }
        voters.sort_by(|a, b| a.reg_no.as_str().cmp(b.reg_no.as_str()));
        Ok(voters)
    }

    /// Remove a voter with their votes and notifications in one
    /// atomic batch. Callers serialize through the ballot actor.
    pub fn purge_voter(&self, voter_id: &Uuid) -> Result<CascadeReport> {
        let voter = self
            .get_voter(voter_id)?
            .ok_or_else(|| Error::NotFound(format!("voter {}", voter_id)))?;

        let cf_voters = self.cf_handle(CF_VOTERS)?;
        let cf_regnos = self.cf_handle(CF_VOTER_REGNOS)?;
        let cf_votes = self.cf_handle(CF_VOTES)?;
        let cf_ballots = self.cf_handle(CF_BALLOTS)?;
        let cf_voter_votes = self.cf_handle(CF_VOTER_VOTES)?;
        let cf_election_votes = self.cf_handle(CF_ELECTION_VOTES)?;
        let cf_notifications = self.cf_handle(CF_NOTIFICATIONS)?;

        let mut batch = WriteBatch::default();

        // Each vote row carries its election, which locates the ballot
        // and the election index entry.
        let mut votes_removed = 0u64;
        for vote in self.votes_of(voter_id)? {
            batch.delete_cf(&cf_votes, vote.id.as_bytes());
            batch.delete_cf(&cf_ballots, composite_key(&vote.election_id, voter_id));
            batch.delete_cf(&cf_voter_votes, composite_key(voter_id, &vote.id));
            batch.delete_cf(&cf_election_votes, composite_key(&vote.election_id, &vote.id));
            votes_removed += 1;
        }

        let mut notifications_removed = 0u64;
        for notification in self.notifications_of(voter_id, false)? {
            batch.delete_cf(&cf_notifications, composite_key(voter_id, &notification.id));
            notifications_removed += 1;
        }

        batch.delete_cf(&cf_voters, voter_id.as_bytes());
        batch.delete_cf(&cf_regnos, voter.reg_no.as_str().as_bytes());

        self.db.write(batch)?;

        tracing::info!(
            voter_id = %voter_id,
            votes_removed,
            notifications_removed,
            "Voter removed"
        );

        Ok(CascadeReport {
            voter_id: *voter_id,
            votes_removed,
            notifications_removed,
        })
    }

    // Party operations

    /// Insert a party, enforcing name uniqueness.
    /// Callers serialize through the ballot actor.
    pub fn insert_party(&self, party: &Party) -> Result<()> {
        let cf_names = self.cf_handle(CF_PARTY_NAMES)?;
        if self.db.get_cf(&cf_names, party.name.as_bytes())?.is_some() {
            return Err(Error::AlreadyExists(format!("party name {}", party.name)));
        }

        let cf_parties = self.cf_handle(CF_PARTIES)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_parties, party.id.as_bytes(), bincode::serialize(party)?);
        batch.put_cf(&cf_names, party.name.as_bytes(), party.id.as_bytes());
        self.db.write(batch)?;
        Ok(())
    }

    /// Get party by id
    pub fn get_party(&self, party_id: &Uuid) -> Result<Option<Party>> {
        let cf = self.cf_handle(CF_PARTIES)?;
        match self.db.get_cf(&cf, party_id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// All parties, ordered by name
    pub fn list_parties(&self) -> Result<Vec<Party>> {
        let cf = self.cf_handle(CF_PARTIES)?;
        let mut parties: Vec<Party> = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            parties.push(bincode::deserialize(&value)?);
        }
        parties.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(parties)
    }

    /// Rename a party, keeping candidate references intact.
    /// Callers serialize through the ballot actor.
    pub fn rename_party(&self, party_id: &Uuid, new_name: &str) -> Result<Party> {
        let mut party = self
            .get_party(party_id)?
            .ok_or_else(|| Error::NotFound(format!("party {}", party_id)))?;

        let cf_names = self.cf_handle(CF_PARTY_NAMES)?;
        if let Some(existing) = self.db.get_cf(&cf_names, new_name.as_bytes())? {
            if existing.as_slice() != party_id.as_bytes() {
                return Err(Error::AlreadyExists(format!("party name {}", new_name)));
            }
        }

        let cf_parties = self.cf_handle(CF_PARTIES)?;
        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_names, party.name.as_bytes());
        party.name = new_name.to_string();
        batch.put_cf(&cf_names, party.name.as_bytes(), party_id.as_bytes());
        batch.put_cf(&cf_parties, party_id.as_bytes(), bincode::serialize(&party)?);
        self.db.write(batch)?;
        Ok(party)
    }

    /// Remove a party that no candidate references.
    /// Callers serialize through the ballot actor.
    pub fn remove_party(&self, party_id: &Uuid) -> Result<Party> {
        let party = self
            .get_party(party_id)?
            .ok_or_else(|| Error::NotFound(format!("party {}", party_id)))?;

        let cf_members = self.cf_handle(CF_PARTY_CANDIDATES)?;
        let prefix = party_id.as_bytes();
        for item in self.db.prefix_iterator_cf(&cf_members, prefix) {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            return Err(Error::PartyInUse);
        }

        let cf_parties = self.cf_handle(CF_PARTIES)?;
        let cf_names = self.cf_handle(CF_PARTY_NAMES)?;
        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_parties, party_id.as_bytes());
        batch.delete_cf(&cf_names, party.name.as_bytes());
        self.db.write(batch)?;
        Ok(party)
    }

    // Candidate operations

    /// Insert a candidate and the party membership index entry.
    /// Callers serialize through the ballot actor.
    pub fn insert_candidate(&self, candidate: &Candidate) -> Result<()> {
        let cf_candidates = self.cf_handle(CF_CANDIDATES)?;
        let cf_members = self.cf_handle(CF_PARTY_CANDIDATES)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_candidates,
            candidate.id.as_bytes(),
            bincode::serialize(candidate)?,
        );
        batch.put_cf(
            &cf_members,
            composite_key(&candidate.party_id, &candidate.id),
            b"",
        );
        self.db.write(batch)?;
        Ok(())
    }

    /// Get candidate by id
    pub fn get_candidate(&self, candidate_id: &Uuid) -> Result<Option<Candidate>> {
        let cf = self.cf_handle(CF_CANDIDATES)?;
        match self.db.get_cf(&cf, candidate_id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Overwrite a candidate record (approval flips)
    pub fn update_candidate(&self, candidate: &Candidate) -> Result<()> {
        let cf = self.cf_handle(CF_CANDIDATES)?;
        self.db
            .put_cf(&cf, candidate.id.as_bytes(), bincode::serialize(candidate)?)?;
        Ok(())
    }

    /// All candidates, ordered by name
    pub fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let cf = self.cf_handle(CF_CANDIDATES)?;
        let mut candidates: Vec<Candidate> = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            candidates.push(bincode::deserialize(&value)?);
        }
        candidates.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(candidates)
    }

    /// Remove a candidate, their membership entry, and their
    /// attachment records. Callers serialize through the ballot actor.
    pub fn remove_candidate(&self, candidate_id: &Uuid) -> Result<Candidate> {
        let candidate = self
            .get_candidate(candidate_id)?
            .ok_or_else(|| Error::NotFound(format!("candidate {}", candidate_id)))?;

        let cf_candidates = self.cf_handle(CF_CANDIDATES)?;
        let cf_members = self.cf_handle(CF_PARTY_CANDIDATES)?;
        let cf_campaigns = self.cf_handle(CF_CAMPAIGNS)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_candidates, candidate_id.as_bytes());
        batch.delete_cf(
            &cf_members,
            composite_key(&candidate.party_id, candidate_id),
        );

        // Attachments are keyed election || candidate; the family is
        // small enough for a full scan.
        for item in self.db.iterator_cf(&cf_campaigns, IteratorMode::Start) {
            let (key, _) = item?;
            if key.len() >= 32 && key[16..32] == candidate_id.as_bytes()[..] {
                batch.delete_cf(&cf_campaigns, key);
            }
        }

        self.db.write(batch)?;
        Ok(candidate)
    }

    /// Total and pending-approval candidate counts
    pub fn candidate_counts(&self) -> Result<(u64, u64)> {
        let cf = self.cf_handle(CF_CANDIDATES)?;
        let mut total = 0u64;
        let mut pending = 0u64;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            let candidate: Candidate = bincode::deserialize(&value)?;
            total += 1;
            if !candidate.approved {
                pending += 1;
            }
        }
        Ok((total, pending))
    }

    // Election operations

    /// Insert an election
    pub fn insert_election(&self, election: &Election) -> Result<()> {
        let cf = self.cf_handle(CF_ELECTIONS)?;
        self.db
            .put_cf(&cf, election.id.as_bytes(), bincode::serialize(election)?)?;
        Ok(())
    }

    /// Get election by id
    pub fn get_election(&self, election_id: &Uuid) -> Result<Option<Election>> {
        let cf = self.cf_handle(CF_ELECTIONS)?;
        match self.db.get_cf(&cf, election_id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Overwrite an election record (toggle, publish)
    pub fn update_election(&self, election: &Election) -> Result<()> {
        let cf = self.cf_handle(CF_ELECTIONS)?;
        self.db
            .put_cf(&cf, election.id.as_bytes(), bincode::serialize(election)?)?;
        Ok(())
    }

    /// All elections, newest first
    pub fn list_elections(&self) -> Result<Vec<Election>> {
        let cf = self.cf_handle(CF_ELECTIONS)?;
        let mut elections: Vec<Election> = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            elections.push(bincode::deserialize(&value)?);
        }
        elections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(elections)
    }

    /// Total, active, and ended-inactive election counts
    pub fn election_counts(&self, now: DateTime<Utc>) -> Result<(u64, u64, u64)> {
        let cf = self.cf_handle(CF_ELECTIONS)?;
        let mut total = 0u64;
        let mut active = 0u64;
        let mut ready = 0u64;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            let election: Election = bincode::deserialize(&value)?;
            total += 1;
            if election.is_active {
                active += 1;
            } else if election.ends_at <= now {
                ready += 1;
            }
        }
        Ok((total, active, ready))
    }

    // Campaign (attachment) operations

    /// Insert or overwrite an attachment record
    pub fn put_campaign(&self, campaign: &Campaign) -> Result<()> {
        let cf = self.cf_handle(CF_CAMPAIGNS)?;
        let key = composite_key(&campaign.election_id, &campaign.candidate_id);
        self.db.put_cf(&cf, key, bincode::serialize(campaign)?)?;
        Ok(())
    }

    /// Attachment record for a (election, candidate) pair
    pub fn get_campaign(&self, election_id: &Uuid, candidate_id: &Uuid) -> Result<Option<Campaign>> {
        let cf = self.cf_handle(CF_CAMPAIGNS)?;
        let key = composite_key(election_id, candidate_id);
        match self.db.get_cf(&cf, key)? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Attachment records for an election
    pub fn campaigns_for(&self, election_id: &Uuid) -> Result<Vec<Campaign>> {
        let cf = self.cf_handle(CF_CAMPAIGNS)?;
        let prefix = election_id.as_bytes();

        let mut campaigns = Vec::new();
        for item in self.db.prefix_iterator_cf(&cf, prefix) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            campaigns.push(bincode::deserialize(&value)?);
        }
        Ok(campaigns)
    }

    /// Candidates attached to an election
    pub fn candidate_ids_for(&self, election_id: &Uuid) -> Result<Vec<Uuid>> {
        let cf = self.cf_handle(CF_CAMPAIGNS)?;
        let prefix = election_id.as_bytes();

        let mut ids = Vec::new();
        for item in self.db.prefix_iterator_cf(&cf, prefix) {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            if key.len() >= 32 {
                ids.push(uuid_at(&key, 16)?);
            }
        }
        Ok(ids)
    }

    // Vote operations

    /// Insert a vote and its index entries atomically.
    ///
    /// Fails with [`Error::DuplicateVote`] when the ballot key already
    /// exists; an existing vote is never overwritten. Callers
    /// serialize through the ballot actor, which makes the
    /// check-then-write sequence atomic.
    pub fn insert_vote(&self, vote: &Vote) -> Result<()> {
        let cf_ballots = self.cf_handle(CF_BALLOTS)?;
        let ballot_key = composite_key(&vote.election_id, &vote.voter_id);

        if self.db.get_cf(&cf_ballots, ballot_key)?.is_some() {
            return Err(Error::DuplicateVote);
        }

        let cf_votes = self.cf_handle(CF_VOTES)?;
        let cf_voter_votes = self.cf_handle(CF_VOTER_VOTES)?;
        let cf_election_votes = self.cf_handle(CF_ELECTION_VOTES)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_votes, vote.id.as_bytes(), bincode::serialize(vote)?);
        batch.put_cf(&cf_ballots, ballot_key, vote.id.as_bytes());
        batch.put_cf(&cf_voter_votes, composite_key(&vote.voter_id, &vote.id), b"");
        batch.put_cf(
            &cf_election_votes,
            composite_key(&vote.election_id, &vote.id),
            b"",
        );
        self.db.write(batch)?;

        tracing::debug!(
            vote_id = %vote.id,
            election_id = %vote.election_id,
            "Vote recorded"
        );
        Ok(())
    }

    /// Get vote by id
    pub fn get_vote(&self, vote_id: &Uuid) -> Result<Option<Vote>> {
        let cf = self.cf_handle(CF_VOTES)?;
        match self.db.get_cf(&cf, vote_id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Whether a ballot exists for (voter, election)
    pub fn has_voted(&self, voter_id: &Uuid, election_id: &Uuid) -> Result<bool> {
        let cf = self.cf_handle(CF_BALLOTS)?;
        let key = composite_key(election_id, voter_id);
        Ok(self.db.get_cf(&cf, key)?.is_some())
    }

    /// Votes cast by a voter (via index)
    pub fn votes_of(&self, voter_id: &Uuid) -> Result<Vec<Vote>> {
        let cf = self.cf_handle(CF_VOTER_VOTES)?;
        let prefix = voter_id.as_bytes();

        let mut votes = Vec::new();
        for item in self.db.prefix_iterator_cf(&cf, prefix) {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            // Extract vote_id from key (bytes 16..32)
            if key.len() >= 32 {
                let vote_id = uuid_at(&key, 16)?;
                if let Some(vote) = self.get_vote(&vote_id)? {
                    votes.push(vote);
                }
            }
        }
        Ok(votes)
    }

    /// Votes cast in an election, in cast order (via index)
    pub fn votes_for_election(&self, election_id: &Uuid) -> Result<Vec<Vote>> {
        let cf = self.cf_handle(CF_ELECTION_VOTES)?;
        let prefix = election_id.as_bytes();

        let mut votes = Vec::new();
        for item in self.db.prefix_iterator_cf(&cf, prefix) {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            if key.len() >= 32 {
                let vote_id = uuid_at(&key, 16)?;
                if let Some(vote) = self.get_vote(&vote_id)? {
                    votes.push(vote);
                }
            }
        }
        Ok(votes)
    }

    // Notification operations

    /// Insert a notification
    pub fn insert_notification(&self, notification: &Notification) -> Result<()> {
        let cf = self.cf_handle(CF_NOTIFICATIONS)?;
        let key = composite_key(&notification.voter_id, &notification.id);
        self.db.put_cf(&cf, key, bincode::serialize(notification)?)?;
        Ok(())
    }

    /// A voter's notifications, newest first
    pub fn notifications_of(&self, voter_id: &Uuid, unread_only: bool) -> Result<Vec<Notification>> {
        let cf = self.cf_handle(CF_NOTIFICATIONS)?;
        let prefix = voter_id.as_bytes();

        let mut notifications: Vec<Notification> = Vec::new();
        for item in self.db.prefix_iterator_cf(&cf, prefix) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            let notification: Notification = bincode::deserialize(&value)?;
            if unread_only && notification.read {
                continue;
            }
            notifications.push(notification);
        }
        // Time-ordered ids iterate oldest first; the inbox shows
        // newest first.
        notifications.reverse();
        Ok(notifications)
    }

    /// Unread notifications for a voter
    pub fn unread_count(&self, voter_id: &Uuid) -> Result<u64> {
        Ok(self.notifications_of(voter_id, true)?.len() as u64)
    }

    /// Flip every unread notification to read in one batch.
    /// Callers serialize through the ballot actor.
    pub fn mark_all_read(&self, voter_id: &Uuid) -> Result<u64> {
        let cf = self.cf_handle(CF_NOTIFICATIONS)?;
        let prefix = voter_id.as_bytes();

        let mut batch = WriteBatch::default();
        let mut flipped = 0u64;
        for item in self.db.prefix_iterator_cf(&cf, prefix) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            let mut notification: Notification = bincode::deserialize(&value)?;
            if notification.read {
                continue;
            }
            notification.read = true;
            batch.put_cf(&cf, key, bincode::serialize(&notification)?);
            flipped += 1;
        }
        if flipped > 0 {
            self.db.write(batch)?;
        }
        Ok(flipped)
    }

    // Statistics

    /// Approximate voter count
    pub fn voter_count(&self) -> Result<u64> {
        self.approximate_count(CF_VOTERS)
    }

    /// Approximate party count
    pub fn party_count(&self) -> Result<u64> {
        self.approximate_count(CF_PARTIES)
    }

    /// Approximate vote count
    pub fn vote_count(&self) -> Result<u64> {
        self.approximate_count(CF_VOTES)
    }

    fn approximate_count(&self, cf_name: &str) -> Result<u64> {
        let cf = self.cf_handle(cf_name)?;
        // RocksDB property for approximate count
        let prop = self
            .db
            .property_int_value_cf(&cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);
        Ok(prop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElectionKind, NotificationKind};
    use chrono::Duration;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), temp_dir)
    }

    fn test_voter(reg_no: &str) -> Voter {
        Voter::new(RegNo::from(reg_no), "Asha Rao", "5550100", "12 Hill Rd")
    }

    fn test_election() -> Election {
        let now = Utc::now();
        Election::new(
            "City Council",
            "Annual council election",
            ElectionKind::Single,
            now - Duration::hours(1),
            now + Duration::hours(1),
        )
    }

    #[test]
    fn test_voter_roundtrip() {
        let (storage, _temp) = test_storage();
        let voter = test_voter("VR-2024-0001");

        storage.insert_voter(&voter).unwrap();

        let by_id = storage.get_voter(&voter.id).unwrap().unwrap();
        assert_eq!(by_id.reg_no, voter.reg_no);

        let by_reg_no = storage
            .voter_by_reg_no(&RegNo::from("VR-2024-0001"))
            .unwrap()
            .unwrap();
        assert_eq!(by_reg_no.id, voter.id);
    }

    #[test]
    fn test_duplicate_reg_no_rejected() {
        let (storage, _temp) = test_storage();
        storage.insert_voter(&test_voter("VR-2024-0001")).unwrap();

        let err = storage
            .insert_voter(&test_voter("VR-2024-0001"))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        // The duplicate wrote nothing.
        assert_eq!(storage.list_voters().unwrap().len(), 1);
    }

    #[test]
    fn test_insert_vote_enforces_ballot_key() {
        let (storage, _temp) = test_storage();
        let voter_id = Uuid::new_v4();
        let election_id = Uuid::new_v4();

        let first = Vote::new(election_id, voter_id, Uuid::new_v4());
        storage.insert_vote(&first).unwrap();
        assert!(storage.has_voted(&voter_id, &election_id).unwrap());

        // Same pair, different candidate: still refused.
        let second = Vote::new(election_id, voter_id, Uuid::new_v4());
        let err = storage.insert_vote(&second).unwrap_err();
        assert!(matches!(err, Error::DuplicateVote));

        let votes = storage.votes_for_election(&election_id).unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].id, first.id);
    }

    #[test]
    fn test_votes_indexed_by_voter_and_election() {
        let (storage, _temp) = test_storage();
        let voter_id = Uuid::new_v4();
        let election_a = Uuid::new_v4();
        let election_b = Uuid::new_v4();

        storage
            .insert_vote(&Vote::new(election_a, voter_id, Uuid::new_v4()))
            .unwrap();
        storage
            .insert_vote(&Vote::new(election_b, voter_id, Uuid::new_v4()))
            .unwrap();
        storage
            .insert_vote(&Vote::new(election_a, Uuid::new_v4(), Uuid::new_v4()))
            .unwrap();

        assert_eq!(storage.votes_of(&voter_id).unwrap().len(), 2);
        assert_eq!(storage.votes_for_election(&election_a).unwrap().len(), 2);
        assert_eq!(storage.votes_for_election(&election_b).unwrap().len(), 1);
    }

    #[test]
    fn test_purge_voter_cascade() {
        let (storage, _temp) = test_storage();
        let voter = test_voter("VR-2024-0001");
        let bystander = test_voter("VR-2024-0002");
        storage.insert_voter(&voter).unwrap();
        storage.insert_voter(&bystander).unwrap();

        let election_a = Uuid::new_v4();
        let election_b = Uuid::new_v4();
        storage
            .insert_vote(&Vote::new(election_a, voter.id, Uuid::new_v4()))
            .unwrap();
        storage
            .insert_vote(&Vote::new(election_b, voter.id, Uuid::new_v4()))
            .unwrap();
        storage
            .insert_vote(&Vote::new(election_a, bystander.id, Uuid::new_v4()))
            .unwrap();

        for _ in 0..3 {
            storage
                .insert_notification(&Notification::new(
                    voter.id,
                    NotificationKind::System,
                    "t",
                    "m",
                ))
                .unwrap();
        }

        let report = storage.purge_voter(&voter.id).unwrap();
        assert_eq!(report.votes_removed, 2);
        assert_eq!(report.notifications_removed, 3);

        assert!(storage.get_voter(&voter.id).unwrap().is_none());
        assert!(storage
            .voter_by_reg_no(&RegNo::from("VR-2024-0001"))
            .unwrap()
            .is_none());
        assert!(!storage.has_voted(&voter.id, &election_a).unwrap());
        assert!(storage.votes_of(&voter.id).unwrap().is_empty());
        assert!(storage.notifications_of(&voter.id, false).unwrap().is_empty());

        // The removed voter's ballot key is free again, so a fresh
        // registration could vote; the bystander is untouched.
        assert_eq!(storage.votes_for_election(&election_a).unwrap().len(), 1);
        assert!(storage.has_voted(&bystander.id, &election_a).unwrap());
    }

    #[test]
    fn test_party_name_uniqueness_and_rename() {
        let (storage, _temp) = test_storage();
        let unity = Party::new("Unity");
        storage.insert_party(&unity).unwrap();
        storage.insert_party(&Party::new("Progress")).unwrap();

        let err = storage.insert_party(&Party::new("Unity")).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        let err = storage.rename_party(&unity.id, "Progress").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        let renamed = storage.rename_party(&unity.id, "Unity Alliance").unwrap();
        assert_eq!(renamed.name, "Unity Alliance");

        // The old name is free again.
        storage.insert_party(&Party::new("Unity")).unwrap();
    }

    #[test]
    fn test_party_in_use_blocks_removal() {
        let (storage, _temp) = test_storage();
        let party = Party::new("Unity");
        storage.insert_party(&party).unwrap();

        let candidate = Candidate::new("Jane Doe", 42, "North Ward", party.id);
        storage.insert_candidate(&candidate).unwrap();

        let err = storage.remove_party(&party.id).unwrap_err();
        assert!(matches!(err, Error::PartyInUse));

        storage.remove_candidate(&candidate.id).unwrap();
        storage.remove_party(&party.id).unwrap();
        assert!(storage.get_party(&party.id).unwrap().is_none());
    }

    #[test]
    fn test_campaign_attachment() {
        let (storage, _temp) = test_storage();
        let election = test_election();
        storage.insert_election(&election).unwrap();

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        storage.put_campaign(&Campaign::new(election.id, a)).unwrap();
        storage.put_campaign(&Campaign::new(election.id, b)).unwrap();

        assert!(storage.get_campaign(&election.id, &a).unwrap().is_some());
        assert!(storage
            .get_campaign(&election.id, &Uuid::new_v4())
            .unwrap()
            .is_none());

        let mut ids = storage.candidate_ids_for(&election.id).unwrap();
        ids.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ids, expected);
        assert_eq!(storage.campaigns_for(&election.id).unwrap().len(), 2);
    }

    #[test]
    fn test_remove_candidate_clears_attachments() {
        let (storage, _temp) = test_storage();
        let party = Party::new("Unity");
        storage.insert_party(&party).unwrap();
        let candidate = Candidate::new("Jane Doe", 42, "North Ward", party.id);
        storage.insert_candidate(&candidate).unwrap();

        let election = test_election();
        storage.insert_election(&election).unwrap();
        storage
            .put_campaign(&Campaign::new(election.id, candidate.id))
            .unwrap();

        storage.remove_candidate(&candidate.id).unwrap();
        assert!(storage
            .get_campaign(&election.id, &candidate.id)
            .unwrap()
            .is_none());
        assert!(storage.candidate_ids_for(&election.id).unwrap().is_empty());
    }

    #[test]
    fn test_elections_listed_newest_first() {
        let (storage, _temp) = test_storage();
        let first = test_election();
        storage.insert_election(&first).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = test_election();
        storage.insert_election(&second).unwrap();

        let listed = storage.list_elections().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[test]
    fn test_notifications_newest_first_and_mark_read() {
        let (storage, _temp) = test_storage();
        let voter_id = Uuid::new_v4();

        for i in 0..3 {
            storage
                .insert_notification(&Notification::new(
                    voter_id,
                    NotificationKind::System,
                    format!("title {}", i),
                    "m",
                ))
                .unwrap();
        }

        let all = storage.notifications_of(&voter_id, false).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].title, "title 2");
        assert_eq!(all[2].title, "title 0");
        assert_eq!(storage.unread_count(&voter_id).unwrap(), 3);

        assert_eq!(storage.mark_all_read(&voter_id).unwrap(), 3);
        assert_eq!(storage.unread_count(&voter_id).unwrap(), 0);
        assert!(storage.notifications_of(&voter_id, true).unwrap().is_empty());

        // Second pass flips nothing.
        assert_eq!(storage.mark_all_read(&voter_id).unwrap(), 0);
    }

    #[test]
    fn test_election_counts() {
        let (storage, _temp) = test_storage();
        let now = Utc::now();

        let mut active = test_election();
        active.is_active = true;
        storage.insert_election(&active).unwrap();

        let mut ended = test_election();
        ended.starts_at = now - Duration::days(2);
        ended.ends_at = now - Duration::days(1);
        storage.insert_election(&ended).unwrap();

        let upcoming = Election::new(
            "Next Year",
            "",
            ElectionKind::Single,
            now + Duration::days(30),
            now + Duration::days(31),
        );
        storage.insert_election(&upcoming).unwrap();

        let (total, active_count, ready) = storage.election_counts(now).unwrap();
        assert_eq!(total, 3);
        assert_eq!(active_count, 1);
        assert_eq!(ready, 1);
    }
}
