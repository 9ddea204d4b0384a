//! Property-based tests for ballot invariants
//!
//! These tests use proptest to verify critical invariants:
//! - One ballot per voter per election, under concurrency
//! - Denied casts leave no trace in the vote ledger
//! - Percentages in a ranking sum to 100 (up to rounding)
//! - Registration numbers are unique

use ballot_core::{
    Config, ElectionKind, Engine, Error, RegNo, VerificationStatus, VoterIdentity,
};
use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Strategy for generating registration numbers
fn reg_no_strategy() -> impl Strategy<Value = RegNo> {
    "[A-Z]{2}-[0-9]{4}-[0-9]{4}".prop_map(|s| RegNo::from(s.as_str()))
}

/// Strategy for generating verification states that deny voting
fn denied_status_strategy() -> impl Strategy<Value = VerificationStatus> {
    prop_oneof![
        Just(VerificationStatus::Pending),
        Just(VerificationStatus::Rejected),
    ]
}

/// Create a test engine backed by a temp directory
async fn create_test_engine() -> (Engine, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().join("db");
    config.audit.log_path = temp_dir.path().join("audit.log");
    let engine = Engine::open(config).await.unwrap();
    (engine, temp_dir)
}

/// Open election with one approved, attached candidate
async fn seed_ballot(engine: &Engine, admin: &VoterIdentity) -> (Uuid, Uuid) {
    let party = engine.create_party(admin, "Unity").await.unwrap();
    let candidate = engine
        .register_candidate(admin, "Jane Doe", 42, "North Ward", party.id)
        .await
        .unwrap();
    engine.approve_candidate(admin, candidate.id).await.unwrap();

    let now = Utc::now();
    let election = engine
        .create_election(
            admin,
            "City Council",
            "",
            ElectionKind::Single,
            now - Duration::hours(1),
            now + Duration::hours(1),
        )
        .await
        .unwrap();
    engine
        .attach_candidate(admin, election.id, candidate.id)
        .await
        .unwrap();
    engine.toggle_active(admin, election.id).await.unwrap();

    (election.id, candidate.id)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: Concurrent casts by one voter yield exactly one ballot
    #[test]
    fn prop_single_ballot_per_election(attempts in 2usize..8) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (engine, _temp) = create_test_engine().await;
            let admin = VoterIdentity::admin(Uuid::new_v4());
            let (election_id, candidate_id) = seed_ballot(&engine, &admin).await;

            let voter = engine
                .register_voter(&admin, RegNo::from("VR-2024-0001"), "Asha Rao", "5550100", "12 Hill Rd")
                .await
                .unwrap();
            engine
                .verify_voter(&admin, voter.id, VerificationStatus::Verified)
                .await
                .unwrap();
            let identity = VoterIdentity::voter(voter.id);

            let engine = Arc::new(engine);
            let mut handles = Vec::with_capacity(attempts);
            for _ in 0..attempts {
                let engine = engine.clone();
                handles.push(tokio::spawn(async move {
                    engine.cast_vote(&identity, candidate_id, election_id).await
                }));
            }

            let mut accepted = 0;
            let mut duplicates = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => accepted += 1,
                    Err(Error::DuplicateVote) => duplicates += 1,
                    Err(e) => prop_assert!(false, "unexpected error: {e}"),
                }
            }

            prop_assert_eq!(accepted, 1);
            prop_assert_eq!(duplicates, attempts - 1);
            prop_assert_eq!(engine.votes_for_election(&election_id).unwrap().len(), 1);
            Ok(())
        })?;
    }

    /// Property: Denied voters never reach the vote ledger
    #[test]
    fn prop_denied_cast_leaves_no_trace(status in denied_status_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (engine, _temp) = create_test_engine().await;
            let admin = VoterIdentity::admin(Uuid::new_v4());
            let (election_id, candidate_id) = seed_ballot(&engine, &admin).await;

            let voter = engine
                .register_voter(&admin, RegNo::from("VR-2024-0001"), "Asha Rao", "5550100", "12 Hill Rd")
                .await
                .unwrap();
            if status != VerificationStatus::Pending {
                engine.verify_voter(&admin, voter.id, status).await.unwrap();
            }

            let result = engine
                .cast_vote(&VoterIdentity::voter(voter.id), candidate_id, election_id)
                .await;

            prop_assert!(matches!(result, Err(Error::NotVerified)));
            prop_assert!(!engine.has_voted(&voter.id, &election_id).unwrap());
            prop_assert!(engine.votes_for_election(&election_id).unwrap().is_empty());
            Ok(())
        })?;
    }

    /// Property: Ranking percentages sum to 100 up to rounding
    #[test]
    fn prop_percentages_sum_to_total(counts in prop::collection::vec(0u32..5, 3)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (engine, _temp) = create_test_engine().await;
            let admin = VoterIdentity::admin(Uuid::new_v4());
            let (election_id, first) = seed_ballot(&engine, &admin).await;

            // Two more eligible candidates in the same election.
            let party = engine.create_party(&admin, "Progress").await.unwrap();
            let mut candidates = vec![first];
            for name in ["Sam Wu", "Ada Ng"] {
                let candidate = engine
                    .register_candidate(&admin, name, 39, "East Ward", party.id)
                    .await
                    .unwrap();
                engine.approve_candidate(&admin, candidate.id).await.unwrap();
                engine
                    .attach_candidate(&admin, election_id, candidate.id)
                    .await
                    .unwrap();
                candidates.push(candidate.id);
            }

            // One fresh verified voter per ballot.
            let mut serial = 0u32;
            for (candidate_id, ballots) in candidates.iter().zip(&counts) {
                for _ in 0..*ballots {
                    serial += 1;
                    let voter = engine
                        .register_voter(
                            &admin,
                            RegNo::from(format!("VR-{serial:04}").as_str()),
                            "Voter",
                            "5550100",
                            "12 Hill Rd",
                        )
                        .await
                        .unwrap();
                    engine
                        .verify_voter(&admin, voter.id, VerificationStatus::Verified)
                        .await
                        .unwrap();
                    engine
                        .cast_vote(&VoterIdentity::voter(voter.id), *candidate_id, election_id)
                        .await
                        .unwrap();
                }
            }

            let total: u32 = counts.iter().sum();
            let ranking = engine.tally(&admin, &election_id).unwrap();
            prop_assert_eq!(ranking.total_votes, u64::from(total));
            prop_assert_eq!(ranking.lines.len(), 3);

            let sum: Decimal = ranking.lines.iter().map(|l| l.percentage).sum();
            if total == 0 {
                prop_assert_eq!(sum, Decimal::ZERO);
            } else {
                let error = (sum - Decimal::from(100u32)).abs();
                prop_assert!(error <= Decimal::new(2, 2), "percentages summed to {sum}");
            }

            // Descending by votes across the whole ranking.
            for pair in ranking.lines.windows(2) {
                prop_assert!(pair[0].votes >= pair[1].votes);
            }
            Ok(())
        })?;
    }

    /// Property: A registration number is accepted exactly once
    #[test]
    fn prop_reg_no_accepted_once(reg_no in reg_no_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (engine, _temp) = create_test_engine().await;
            let admin = VoterIdentity::admin(Uuid::new_v4());

            engine
                .register_voter(&admin, reg_no.clone(), "Asha Rao", "5550100", "12 Hill Rd")
                .await
                .unwrap();
            let second = engine
                .register_voter(&admin, reg_no.clone(), "Ben Kim", "5550101", "3 Lake St")
                .await;

            prop_assert!(matches!(second, Err(Error::AlreadyExists(_))));
            prop_assert_eq!(engine.list_voters().unwrap().len(), 1);
            prop_assert!(engine.voter_by_reg_no(&reg_no).unwrap().is_some());
            Ok(())
        })?;
    }
}
