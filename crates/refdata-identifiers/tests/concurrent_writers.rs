//! Concurrent writers on one identifier.
//!
//! Writers race on the same (entity, TICKER). Guards plus retries must
//! serialize them: no lost write, no duplicate version, one open row.

use std::sync::Arc;
use std::thread;

use refdata_identifiers::prelude::*;
use tempfile::tempdir;

const WRITERS: usize = 8;
const WRITES_PER_WRITER: usize = 25;
const ENTITY: EntityId = 7;

fn race(store: Arc<dyn IdentifierStore<IdentifierType>>) {
    let config = VersioningConfig {
        max_retries: 10_000,
        ..VersioningConfig::default()
    };
    let manager = VersionManager::new(Arc::clone(&store), Arc::new(SystemClock), config);

    thread::scope(|scope| {
        for writer in 0..WRITERS {
            let manager = &manager;
            scope.spawn(move || {
                for write in 0..WRITES_PER_WRITER {
                    manager
                        .create_new_version(NewVersion::new(
                            ENTITY,
                            IdentifierType::Ticker,
                            format!("W{writer}N{write}"),
                            ChangeReason::DataCorrection,
                            format!("writer-{writer}"),
                        ))
                        .unwrap();
                }
            });
        }
    });

    let total = WRITERS * WRITES_PER_WRITER;
    let mut history = manager
        .get_identifier_history(ENTITY, IdentifierType::Ticker)
        .unwrap();
    history.reverse();
    assert_eq!(history.len(), total);

    let versions: Vec<u32> = history.iter().map(|r| r.version).collect();
    let expected: Vec<u32> = (1..=total as u32).collect();
    assert_eq!(versions, expected);

    assert_eq!(history.iter().filter(|r| r.is_current()).count(), 1);
    for pair in history.windows(2) {
        assert_eq!(pair[1].supersedes_id, Some(pair[0].id));
    }

    let current = manager
        .get_current_version(ENTITY, IdentifierType::Ticker)
        .unwrap()
        .unwrap();
    assert_eq!(current.version, total as u32);

    let snapshot = store.snapshot(ENTITY).unwrap().unwrap();
    assert_eq!(snapshot.snapshot_version, total as u32);
    assert_eq!(
        snapshot.value(IdentifierType::Ticker),
        Some(current.identifier_value.as_str())
    );
}

#[test]
fn test_concurrent_writers_memory_store() {
    race(Arc::new(InMemoryStore::<IdentifierType>::new()));
}

#[test]
fn test_concurrent_writers_redb_store() {
    let dir = tempdir().unwrap();
    let store = RedbStore::<IdentifierType>::open(dir.path().join("race.redb")).unwrap();
    race(Arc::new(store));
}
