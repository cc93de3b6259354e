//! Property tests for identifier versioning.
//!
//! - Versions are gapless from 1 and exactly one row per identifier is open
//! - Rollback only ever appends
//! - The snapshot always mirrors the open rows

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use refdata_identifiers::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Set(IdentifierType, String),
    Rollback(IdentifierType, u32),
}

fn kind_strategy() -> impl Strategy<Value = IdentifierType> {
    prop_oneof![
        Just(IdentifierType::Ticker),
        Just(IdentifierType::Figi),
        Just(IdentifierType::ReutersRic),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (kind_strategy(), "[A-Z]{1,6}").prop_map(|(k, v)| Op::Set(k, v)),
        1 => (kind_strategy(), 1u32..6).prop_map(|(k, n)| Op::Rollback(k, n)),
    ]
}

type Store = Arc<dyn IdentifierStore<IdentifierType>>;

fn versions() -> (VersionManager<IdentifierType>, Arc<ManualClock>, Store) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let store: Store = Arc::new(InMemoryStore::new());
    (
        VersionManager::new(Arc::clone(&store), clock.clone(), VersioningConfig::default()),
        clock,
        store,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn versions_are_gapless_with_one_open_row(ops in prop::collection::vec(op_strategy(), 1..25)) {
        let (manager, clock, store) = versions();
        for op in &ops {
            clock.advance(Duration::minutes(1));
            match op {
                Op::Set(kind, value) => {
                    manager
                        .create_new_version(NewVersion::new(1, *kind, value.as_str(), ChangeReason::DataCorrection, "prop"))
                        .unwrap();
                }
                Op::Rollback(kind, target) => {
                    let before = manager.get_identifier_history(1, *kind).unwrap().len();
                    match manager.rollback_to_version(1, *kind, *target, "prop", "prop") {
                        Ok(row) => {
                            prop_assert_eq!(row.version as usize, before + 1);
                            let target_row = manager
                                .get_version_by_number(1, *kind, *target)
                                .unwrap()
                                .unwrap();
                            prop_assert_eq!(row.identifier_value, target_row.identifier_value);
                        }
                        Err(IdentifierError::VersionNotFound { .. }) => {
                            prop_assert!(*target as usize > before);
                            prop_assert_eq!(manager.get_identifier_history(1, *kind).unwrap().len(), before);
                        }
                        Err(e) => prop_assert!(false, "unexpected error: {e}"),
                    }
                }
            }
        }

        let snapshot = store.snapshot(1).unwrap();
        for kind in [IdentifierType::Ticker, IdentifierType::Figi, IdentifierType::ReutersRic] {
            let mut history = manager.get_identifier_history(1, kind).unwrap();
            history.reverse();
            let numbers: Vec<u32> = history.iter().map(|r| r.version).collect();
            let expected: Vec<u32> = (1..=history.len() as u32).collect();
            prop_assert_eq!(numbers, expected);

            let open = history.iter().filter(|r| r.is_current()).count();
            prop_assert_eq!(open, usize::from(!history.is_empty()));

            let current = manager.get_current_version(1, kind).unwrap();
            let in_snapshot = snapshot.as_ref().and_then(|s| s.value(kind).map(str::to_string));
            prop_assert_eq!(current.map(|r| r.identifier_value), in_snapshot);

            // Closed intervals tile the timeline without overlap.
            for pair in history.windows(2) {
                prop_assert_eq!(pair[0].effective_to, Some(pair[1].effective_from));
                prop_assert_eq!(pair[1].supersedes_id, Some(pair[0].id));
            }
        }
    }
}
