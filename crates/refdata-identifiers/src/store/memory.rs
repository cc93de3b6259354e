//! In-memory identifier store.
//!
//! Useful for testing and for services that rebuild their identifier state
//! on start. Data is not persisted across restarts.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use uuid::Uuid;

use super::{
    current_conflict, current_version, snapshot_conflict, Guard, HistoryWrite, IdentifierStore,
    SnapshotWrite, StoreError, StoreResult, WriteBatch,
};
use crate::records::{ChangeRequest, IdentifierHistory, IdentifierSnapshot};
use crate::types::{EntityId, IdentifierKind};

type HistoryKey<T> = (EntityId, T, u32);

struct Tables<T> {
    history: BTreeMap<HistoryKey<T>, IdentifierHistory<T>>,
    snapshots: BTreeMap<EntityId, IdentifierSnapshot<T>>,
    requests: BTreeMap<Uuid, ChangeRequest<T>>,
}

impl<T: IdentifierKind> Tables<T> {
    fn rows_of(&self, entity_id: EntityId, kind: T) -> impl Iterator<Item = &IdentifierHistory<T>> {
        self.history
            .range((entity_id, kind, 0)..=(entity_id, kind, u32::MAX))
            .map(|(_, row)| row)
    }

    fn check(&self, guard: &Guard<T>) -> StoreResult<()> {
        match *guard {
            Guard::CurrentVersion {
                entity_id,
                identifier_type,
                expected,
            } => {
                let actual = current_version(self.rows_of(entity_id, identifier_type));
                if actual == expected {
                    Ok(())
                } else {
                    Err(current_conflict(entity_id, identifier_type, expected, actual))
                }
            }
            Guard::SnapshotVersion {
                entity_id,
                expected,
            } => {
                let actual = self.snapshots.get(&entity_id).map(|s| s.snapshot_version);
                if actual == expected {
                    Ok(())
                } else {
                    Err(snapshot_conflict(entity_id, expected, actual))
                }
            }
            Guard::RequestStatus { id, expected } => {
                let actual = self
                    .requests
                    .get(&id)
                    .map(|r| r.status)
                    .ok_or_else(|| StoreError::NotFound {
                        entity_type: "change_request",
                        key: id.to_string(),
                    })?;
                if actual == expected {
                    Ok(())
                } else {
                    Err(StoreError::conflict(id.to_string(), expected, actual))
                }
            }
        }
    }
}

/// In-memory identifier store.
///
/// # Example
///
/// ```rust
/// use refdata_identifiers::store::{IdentifierStore, InMemoryStore};
/// use refdata_identifiers::IdentifierType;
///
/// let store = InMemoryStore::<IdentifierType>::new();
/// assert_eq!(store.backend_name(), "memory");
/// assert!(store.snapshots().unwrap().is_empty());
/// ```
pub struct InMemoryStore<T> {
    tables: RwLock<Tables<T>>,
}

impl<T: IdentifierKind> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: IdentifierKind> InMemoryStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                history: BTreeMap::new(),
                snapshots: BTreeMap::new(),
                requests: BTreeMap::new(),
            }),
        }
    }

    /// Clears all data.
    pub fn clear(&self) {
        let mut tables = self.tables.write();
        tables.history.clear();
        tables.snapshots.clear();
        tables.requests.clear();
    }
}

fn key_of<T: IdentifierKind>(row: &IdentifierHistory<T>) -> HistoryKey<T> {
    (row.entity_id, row.identifier_type, row.version)
}

impl<T: IdentifierKind> IdentifierStore<T> for InMemoryStore<T> {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn history(&self, entity_id: EntityId, kind: T) -> StoreResult<Vec<IdentifierHistory<T>>> {
        Ok(self.tables.read().rows_of(entity_id, kind).cloned().collect())
    }

    fn entity_history(&self, entity_id: EntityId) -> StoreResult<Vec<IdentifierHistory<T>>> {
        Ok(self
            .tables
            .read()
            .history
            .values()
            .filter(|row| row.entity_id == entity_id)
            .cloned()
            .collect())
    }

    fn all_history(&self) -> StoreResult<Vec<IdentifierHistory<T>>> {
        Ok(self.tables.read().history.values().cloned().collect())
    }

    fn snapshot(&self, entity_id: EntityId) -> StoreResult<Option<IdentifierSnapshot<T>>> {
        Ok(self.tables.read().snapshots.get(&entity_id).cloned())
    }

    fn snapshots(&self) -> StoreResult<Vec<IdentifierSnapshot<T>>> {
        Ok(self.tables.read().snapshots.values().cloned().collect())
    }

    fn change_request(&self, id: Uuid) -> StoreResult<Option<ChangeRequest<T>>> {
        Ok(self.tables.read().requests.get(&id).cloned())
    }

    fn change_requests(&self) -> StoreResult<Vec<ChangeRequest<T>>> {
        Ok(self.tables.read().requests.values().cloned().collect())
    }

    fn apply(&self, batch: WriteBatch<T>) -> StoreResult<()> {
        let mut tables = self.tables.write();

        for guard in &batch.guards {
            tables.check(guard)?;
        }

        // Validate every write before touching the tables.
        let mut inserted = BTreeSet::new();
        for write in &batch.history {
            let row = write.row();
            let key = key_of(row);
            match write {
                HistoryWrite::Insert(_) => {
                    if tables.history.contains_key(&key) || !inserted.insert(key) {
                        return Err(StoreError::DuplicateKey {
                            entity_type: "history",
                            key: row.key(),
                        });
                    }
                }
                HistoryWrite::Update(_) => {
                    if !tables.history.contains_key(&key) && !inserted.contains(&key) {
                        return Err(StoreError::NotFound {
                            entity_type: "history",
                            key: row.key(),
                        });
                    }
                }
            }
        }

        let WriteBatch {
            history,
            snapshots,
            requests,
            ..
        } = batch;
        for write in history {
            let row = match write {
                HistoryWrite::Insert(row) | HistoryWrite::Update(row) => row,
            };
            tables.history.insert(key_of(&row), row);
        }
        for write in snapshots {
            match write {
                SnapshotWrite::Put(snapshot) => {
                    tables.snapshots.insert(snapshot.entity_id, snapshot);
                }
                SnapshotWrite::Delete(entity_id) => {
                    tables.snapshots.remove(&entity_id);
                }
            }
        }
        for request in requests {
            tables.requests.insert(request.id, request);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DEFAULT_CONFIDENCE;
    use crate::types::{ChangeReason, IdentifierStatus, IdentifierType};
    use chrono::{TimeZone, Utc};

    fn row(entity_id: EntityId, kind: IdentifierType, version: u32) -> IdentifierHistory<IdentifierType> {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        IdentifierHistory {
            id: Uuid::new_v4(),
            entity_id,
            identifier_type: kind,
            identifier_value: format!("V{version}"),
            exchange_mic: None,
            currency: None,
            version,
            effective_from: at,
            effective_to: None,
            status: IdentifierStatus::Active,
            change_reason: Some(ChangeReason::InitialAssignment),
            change_description: None,
            supersedes_id: None,
            source: None,
            confidence_level: Some(DEFAULT_CONFIDENCE.into()),
            validation_status: None,
            validation_errors: Vec::new(),
            created_by: None,
            approved_by: None,
            approved_at: None,
            created_at: at,
            updated_at: None,
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_insert_and_read_back_in_version_order() {
        let store = InMemoryStore::new();
        let mut batch = WriteBatch::new();
        let mut v1 = row(1, IdentifierType::Isin, 1);
        v1.supersede(v1.effective_from);
        batch.insert_history(row(1, IdentifierType::Isin, 2));
        batch.insert_history(v1);
        batch.insert_history(row(2, IdentifierType::Isin, 1));
        store.apply(batch).unwrap();

        let history = store.history(1, IdentifierType::Isin).unwrap();
        assert_eq!(history.iter().map(|r| r.version).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(store.entity_history(2).unwrap().len(), 1);
        assert_eq!(store.all_history().unwrap().len(), 3);
    }

    #[test]
    fn test_current_version_guard() {
        let store = InMemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.expect_current(1, IdentifierType::Ticker, None);
        batch.insert_history(row(1, IdentifierType::Ticker, 1));
        store.apply(batch).unwrap();

        // A writer that still thinks there is no current row loses.
        let mut stale = WriteBatch::new();
        stale.expect_current(1, IdentifierType::Ticker, None);
        stale.insert_history(row(1, IdentifierType::Ticker, 2));
        let err = store.apply(stale).unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));
        assert_eq!(store.history(1, IdentifierType::Ticker).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_batch_writes_nothing() {
        let store = InMemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.insert_history(row(1, IdentifierType::Ticker, 1));
        store.apply(batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.insert_history(row(1, IdentifierType::Cusip, 1));
        batch.insert_history(row(1, IdentifierType::Ticker, 1));
        assert!(matches!(
            store.apply(batch),
            Err(StoreError::DuplicateKey { .. })
        ));
        assert!(store.history(1, IdentifierType::Cusip).unwrap().is_empty());
    }

    #[test]
    fn test_update_requires_existing_row() {
        let store = InMemoryStore::<IdentifierType>::new();
        let mut batch = WriteBatch::new();
        batch.update_history(row(9, IdentifierType::Lei, 1));
        assert!(matches!(store.apply(batch), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_snapshot_guard_and_delete() {
        let store = InMemoryStore::<IdentifierType>::new();
        let snapshot = IdentifierSnapshot {
            entity_id: 5,
            identifiers: BTreeMap::new(),
            primary_identifier_type: None,
            primary_identifier_value: None,
            last_updated: Utc::now(),
            snapshot_version: 1,
        };
        let mut batch = WriteBatch::new();
        batch.expect_snapshot(5, None);
        batch.put_snapshot(snapshot);
        store.apply(batch).unwrap();

        let mut stale = WriteBatch::new();
        stale.expect_snapshot(5, None);
        stale.delete_snapshot(5);
        assert!(store.apply(stale).is_err());

        let mut batch = WriteBatch::new();
        batch.expect_snapshot(5, Some(1));
        batch.delete_snapshot(5);
        store.apply(batch).unwrap();
        assert!(store.snapshot(5).unwrap().is_none());
    }

    #[test]
    fn test_clear() {
        let store = InMemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.insert_history(row(1, IdentifierType::Ticker, 1));
        store.apply(batch).unwrap();
        store.clear();
        assert!(store.all_history().unwrap().is_empty());
    }
}
