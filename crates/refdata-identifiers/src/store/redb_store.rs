//! Redb-backed identifier store.
//!
//! Rows are stored as JSON under string keys. History keys are
//! `{entity:020}:{TYPE}:{version:010}`, so a table scan yields rows ordered
//! by entity, type and version.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, Table, TableDefinition};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::{
    current_conflict, current_version, snapshot_conflict, Guard, HistoryWrite, IdentifierStore,
    SnapshotWrite, StoreError, StoreResult, WriteBatch,
};
use crate::records::{history_prefix, ChangeRequest, IdentifierHistory, IdentifierSnapshot};
use crate::types::{EntityId, IdentifierKind};

// Table definitions
const HISTORY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("identifier_history");
const SNAPSHOTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("identifier_snapshots");
const REQUESTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("change_requests");

/// Redb-based identifier store.
///
/// Each [`apply`](IdentifierStore::apply) runs in a single write transaction;
/// a failed guard drops the transaction uncommitted.
///
/// # Example
///
/// ```rust,ignore
/// use refdata_identifiers::store::RedbStore;
/// use refdata_identifiers::IdentifierType;
///
/// let store = RedbStore::<IdentifierType>::open("./identifiers.redb")?;
/// ```
pub struct RedbStore<T> {
    db: Arc<Database>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: IdentifierKind> RedbStore<T> {
    /// Opens or creates a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::create(path)?;
        let store = Self {
            db: Arc::new(db),
            _kind: PhantomData,
        };
        store.initialize_tables()?;
        Ok(store)
    }

    fn initialize_tables(&self) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(HISTORY_TABLE)?;
            let _ = write_txn.open_table(SNAPSHOTS_TABLE)?;
            let _ = write_txn.open_table(REQUESTS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn scan_history(&self, prefix: &str) -> StoreResult<Vec<IdentifierHistory<T>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(HISTORY_TABLE)?;
        rows_with_prefix(&table, prefix)
    }
}

/// History rows whose key starts with `prefix`.
///
/// Keys sort by prefix, so the scan starts at `prefix` and stops at the
/// first key outside it.
fn rows_with_prefix<T, R>(table: &R, prefix: &str) -> StoreResult<Vec<IdentifierHistory<T>>>
where
    T: IdentifierKind,
    R: ReadableTable<&'static str, &'static [u8]>,
{
    let mut rows = Vec::new();
    for entry in table.range(prefix..)? {
        let (key, value) = entry?;
        if !key.value().starts_with(prefix) {
            break;
        }
        rows.push(decode(value.value())?);
    }
    Ok(rows)
}

fn decode<R: DeserializeOwned>(bytes: &[u8]) -> StoreResult<R> {
    Ok(serde_json::from_slice(bytes)?)
}

fn entity_prefix(entity_id: EntityId) -> String {
    format!("{entity_id:020}:")
}

fn check_guard<T: IdentifierKind>(
    guard: &Guard<T>,
    history: &Table<&'static str, &'static [u8]>,
    snapshots: &Table<u64, &'static [u8]>,
    requests: &Table<&'static str, &'static [u8]>,
) -> StoreResult<()> {
    match *guard {
        Guard::CurrentVersion {
            entity_id,
            identifier_type,
            expected,
        } => {
            let prefix = history_prefix(entity_id, identifier_type);
            let rows: Vec<IdentifierHistory<T>> = rows_with_prefix(history, &prefix)?;
            let actual = current_version(&rows);
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
            let actual = match snapshots.get(entity_id)? {
                Some(data) => Some(decode::<IdentifierSnapshot<T>>(data.value())?.snapshot_version),
                None => None,
            };
            if actual == expected {
                Ok(())
            } else {
                Err(snapshot_conflict(entity_id, expected, actual))
            }
        }
        Guard::RequestStatus { id, expected } => {
            let key = id.to_string();
            let actual = match requests.get(key.as_str())? {
                Some(data) => decode::<ChangeRequest<T>>(data.value())?.status,
                None => {
                    return Err(StoreError::NotFound {
                        entity_type: "change_request",
                        key,
                    })
                }
            };
            if actual == expected {
                Ok(())
            } else {
                Err(StoreError::conflict(key, expected, actual))
            }
        }
    }
}

impl<T: IdentifierKind> IdentifierStore<T> for RedbStore<T> {
    fn backend_name(&self) -> &'static str {
        "redb"
    }

    fn history(&self, entity_id: EntityId, kind: T) -> StoreResult<Vec<IdentifierHistory<T>>> {
        self.scan_history(&history_prefix(entity_id, kind))
    }

    fn entity_history(&self, entity_id: EntityId) -> StoreResult<Vec<IdentifierHistory<T>>> {
        self.scan_history(&entity_prefix(entity_id))
    }

    fn all_history(&self) -> StoreResult<Vec<IdentifierHistory<T>>> {
        self.scan_history("")
    }

    fn snapshot(&self, entity_id: EntityId) -> StoreResult<Option<IdentifierSnapshot<T>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        match table.get(entity_id)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn snapshots(&self) -> StoreResult<Vec<IdentifierSnapshot<T>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SNAPSHOTS_TABLE)?;
        let mut snapshots = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            snapshots.push(decode(value.value())?);
        }
        Ok(snapshots)
    }

    fn change_request(&self, id: Uuid) -> StoreResult<Option<ChangeRequest<T>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REQUESTS_TABLE)?;
        let key = id.to_string();
        match table.get(key.as_str())? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn change_requests(&self) -> StoreResult<Vec<ChangeRequest<T>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REQUESTS_TABLE)?;
        let mut requests = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            requests.push(decode(value.value())?);
        }
        Ok(requests)
    }

    fn apply(&self, batch: WriteBatch<T>) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut history = write_txn.open_table(HISTORY_TABLE)?;
            let mut snapshots = write_txn.open_table(SNAPSHOTS_TABLE)?;
            let mut requests = write_txn.open_table(REQUESTS_TABLE)?;

            // Any early return drops the transaction without committing.
            for guard in &batch.guards {
                check_guard(guard, &history, &snapshots, &requests)?;
            }

            for write in &batch.history {
                let row = write.row();
                let key = row.key();
                let exists = history.get(key.as_str())?.is_some();
                match write {
                    HistoryWrite::Insert(_) if exists => {
                        return Err(StoreError::DuplicateKey {
                            entity_type: "history",
                            key,
                        });
                    }
                    HistoryWrite::Update(_) if !exists => {
                        return Err(StoreError::NotFound {
                            entity_type: "history",
                            key,
                        });
                    }
                    _ => {}
                }
                let data = serde_json::to_vec(row)?;
                history.insert(key.as_str(), data.as_slice())?;
            }

            for write in &batch.snapshots {
                match write {
                    SnapshotWrite::Put(snapshot) => {
                        let data = serde_json::to_vec(snapshot)?;
                        snapshots.insert(snapshot.entity_id, data.as_slice())?;
                    }
                    SnapshotWrite::Delete(entity_id) => {
                        snapshots.remove(*entity_id)?;
                    }
                }
            }

            for request in &batch.requests {
                let key = request.id.to_string();
                let data = serde_json::to_vec(request)?;
                requests.insert(key.as_str(), data.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DEFAULT_CONFIDENCE;
    use crate::types::{ChangeReason, IdentifierStatus, IdentifierType, RequestStatus};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use tempfile::{tempdir, TempDir};

    fn create_test_store() -> (TempDir, RedbStore<IdentifierType>) {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("identifiers.redb")).unwrap();
        (dir, store)
    }

    fn row(entity_id: EntityId, kind: IdentifierType, version: u32) -> IdentifierHistory<IdentifierType> {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        IdentifierHistory {
            id: Uuid::new_v4(),
            entity_id,
            identifier_type: kind,
            identifier_value: format!("V{version}"),
            exchange_mic: Some("XNYS".into()),
            currency: Some("USD".into()),
            version,
            effective_from: at,
            effective_to: None,
            status: IdentifierStatus::Active,
            change_reason: Some(ChangeReason::Other("VENDOR_FEED".into())),
            change_description: None,
            supersedes_id: None,
            source: Some("vendor".into()),
            confidence_level: Some(DEFAULT_CONFIDENCE.into()),
            validation_status: None,
            validation_errors: Vec::new(),
            created_by: Some("loader".into()),
            approved_by: Some("loader".into()),
            approved_at: Some(at),
            created_at: at,
            updated_at: None,
            metadata: serde_json::json!({"feed": "eod"}),
        }
    }

    #[test]
    fn test_backend_name() {
        let (_dir, store) = create_test_store();
        assert_eq!(store.backend_name(), "redb");
    }

    #[test]
    fn test_history_round_trip_and_prefix_scan() {
        let (_dir, store) = create_test_store();
        let mut batch = WriteBatch::new();
        let original = row(1, IdentifierType::Isin, 1);
        batch.insert_history(original.clone());
        batch.insert_history(row(1, IdentifierType::Ticker, 1));
        batch.insert_history(row(10, IdentifierType::Isin, 1));
        store.apply(batch).unwrap();

        assert_eq!(store.history(1, IdentifierType::Isin).unwrap(), vec![original]);
        assert_eq!(store.entity_history(1).unwrap().len(), 2);
        assert_eq!(store.entity_history(10).unwrap().len(), 1);
        assert_eq!(store.all_history().unwrap().len(), 3);
    }

    #[test]
    fn test_prefix_scan_stops_at_neighbouring_keys() {
        let (_dir, store) = create_test_store();
        let mut batch = WriteBatch::new();
        for entity_id in [1, 2, 10, 11] {
            for kind in [IdentifierType::Cusip, IdentifierType::Isin, IdentifierType::Ticker] {
                batch.insert_history(row(entity_id, kind, 1));
                batch.insert_history(row(entity_id, kind, 2));
            }
        }
        store.apply(batch).unwrap();

        let isin = store.history(2, IdentifierType::Isin).unwrap();
        assert_eq!(isin.iter().map(|r| r.version).collect::<Vec<_>>(), vec![1, 2]);
        assert!(isin
            .iter()
            .all(|r| r.entity_id == 2 && r.identifier_type == IdentifierType::Isin));

        let entity = store.entity_history(10).unwrap();
        assert_eq!(entity.len(), 6);
        assert!(entity.iter().all(|r| r.entity_id == 10));
        assert!(store.entity_history(3).unwrap().is_empty());
        assert!(store.history(11, IdentifierType::Sedol).unwrap().is_empty());

        // Guards read through the same scan.
        let mut stale = WriteBatch::new();
        stale.expect_current(1, IdentifierType::Isin, Some(1));
        assert!(matches!(
            store.apply(stale),
            Err(StoreError::VersionConflict { .. })
        ));
    }

    #[test]
    fn test_guard_failure_rolls_back() {
        let (_dir, store) = create_test_store();
        let mut batch = WriteBatch::new();
        batch.insert_history(row(1, IdentifierType::Ticker, 1));
        store.apply(batch).unwrap();

        let mut stale = WriteBatch::new();
        stale.expect_current(1, IdentifierType::Ticker, None);
        stale.insert_history(row(1, IdentifierType::Cusip, 1));
        assert!(matches!(
            store.apply(stale),
            Err(StoreError::VersionConflict { .. })
        ));
        assert!(store.history(1, IdentifierType::Cusip).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let (_dir, store) = create_test_store();
        let mut batch = WriteBatch::new();
        batch.insert_history(row(3, IdentifierType::Sedol, 1));
        store.apply(batch.clone()).unwrap();
        assert!(matches!(
            store.apply(batch),
            Err(StoreError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_snapshot_and_request_tables() {
        let (_dir, store) = create_test_store();
        let r = row(4, IdentifierType::Ticker, 1);
        let mut identifiers = BTreeMap::new();
        identifiers.insert(IdentifierType::Ticker, crate::records::SnapshotEntry::from_row(&r));
        let snapshot = IdentifierSnapshot {
            entity_id: 4,
            identifiers,
            primary_identifier_type: Some(IdentifierType::Ticker),
            primary_identifier_value: Some("V1".into()),
            last_updated: r.created_at,
            snapshot_version: 1,
        };
        let request = ChangeRequest {
            id: Uuid::new_v4(),
            entity_id: 4,
            identifier_type: IdentifierType::Ticker,
            old_value: Some("V1".into()),
            new_value: "V2".into(),
            change_reason: ChangeReason::CorporateAction,
            change_description: None,
            status: RequestStatus::Pending,
            requested_by: "analyst".into(),
            requested_at: r.created_at,
            reviewed_by: None,
            reviewed_at: None,
            applied_at: None,
            risk_level: None,
            impact_assessment: None,
        };

        let mut batch = WriteBatch::new();
        batch.put_snapshot(snapshot.clone());
        batch.put_request(request.clone());
        store.apply(batch).unwrap();

        assert_eq!(store.snapshot(4).unwrap(), Some(snapshot));
        assert_eq!(store.change_request(request.id).unwrap(), Some(request.clone()));
        assert_eq!(store.change_requests().unwrap().len(), 1);

        let mut batch = WriteBatch::new();
        batch.expect_request_status(request.id, RequestStatus::Applied);
        assert!(store.apply(batch).is_err());

        let mut batch = WriteBatch::new();
        batch.expect_snapshot(4, Some(1));
        batch.delete_snapshot(4);
        store.apply(batch).unwrap();
        assert!(store.snapshots().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.redb");
        {
            let store = RedbStore::<IdentifierType>::open(&path).unwrap();
            let mut batch = WriteBatch::new();
            batch.insert_history(row(8, IdentifierType::Lei, 1));
            store.apply(batch).unwrap();
        }
        let store = RedbStore::<IdentifierType>::open(&path).unwrap();
        assert_eq!(store.history(8, IdentifierType::Lei).unwrap().len(), 1);
    }
}
