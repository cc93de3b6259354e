//! Persistence for history rows, snapshots and change requests.
//!
//! Every write goes through [`IdentifierStore::apply`], which commits a
//! [`WriteBatch`] atomically or not at all. A batch carries optimistic
//! [`Guard`]s on what the writer read; a guard that no longer holds fails
//! the whole batch with [`StoreError::VersionConflict`].

mod error;
mod memory;
mod redb_store;

use std::sync::Arc;

use uuid::Uuid;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use redb_store::RedbStore;

use crate::records::{ChangeRequest, IdentifierHistory, IdentifierSnapshot};
use crate::types::{EntityId, IdentifierKind, RequestStatus};

/// Storage backend for one identifier enum.
pub trait IdentifierStore<T: IdentifierKind>: Send + Sync {
    /// Returns the backend name for logging.
    fn backend_name(&self) -> &'static str;

    /// All versions of one identifier, ascending by version.
    fn history(&self, entity_id: EntityId, kind: T) -> StoreResult<Vec<IdentifierHistory<T>>>;

    /// All versions of every identifier of an entity, ordered by type then version.
    fn entity_history(&self, entity_id: EntityId) -> StoreResult<Vec<IdentifierHistory<T>>>;

    /// Every history row in the store.
    fn all_history(&self) -> StoreResult<Vec<IdentifierHistory<T>>>;

    /// Snapshot of one entity.
    fn snapshot(&self, entity_id: EntityId) -> StoreResult<Option<IdentifierSnapshot<T>>>;

    /// Every snapshot, ordered by entity.
    fn snapshots(&self) -> StoreResult<Vec<IdentifierSnapshot<T>>>;

    /// One change request.
    fn change_request(&self, id: Uuid) -> StoreResult<Option<ChangeRequest<T>>>;

    /// Every change request, in no particular order.
    fn change_requests(&self) -> StoreResult<Vec<ChangeRequest<T>>>;

    /// Commits a batch atomically.
    fn apply(&self, batch: WriteBatch<T>) -> StoreResult<()>;
}

impl<T: IdentifierKind, S: IdentifierStore<T> + ?Sized> IdentifierStore<T> for Arc<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn history(&self, entity_id: EntityId, kind: T) -> StoreResult<Vec<IdentifierHistory<T>>> {
        (**self).history(entity_id, kind)
    }

    fn entity_history(&self, entity_id: EntityId) -> StoreResult<Vec<IdentifierHistory<T>>> {
        (**self).entity_history(entity_id)
    }

    fn all_history(&self) -> StoreResult<Vec<IdentifierHistory<T>>> {
        (**self).all_history()
    }

    fn snapshot(&self, entity_id: EntityId) -> StoreResult<Option<IdentifierSnapshot<T>>> {
        (**self).snapshot(entity_id)
    }

    fn snapshots(&self) -> StoreResult<Vec<IdentifierSnapshot<T>>> {
        (**self).snapshots()
    }

    fn change_request(&self, id: Uuid) -> StoreResult<Option<ChangeRequest<T>>> {
        (**self).change_request(id)
    }

    fn change_requests(&self) -> StoreResult<Vec<ChangeRequest<T>>> {
        (**self).change_requests()
    }

    fn apply(&self, batch: WriteBatch<T>) -> StoreResult<()> {
        (**self).apply(batch)
    }
}

/// A condition on stored state that must still hold at commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Guard<T> {
    /// Version of the current row of an identifier (`None` = no current row).
    CurrentVersion {
        /// Entity key.
        entity_id: EntityId,
        /// Identifier type.
        identifier_type: T,
        /// Version the writer read.
        expected: Option<u32>,
    },
    /// `snapshot_version` of an entity's snapshot (`None` = no snapshot).
    SnapshotVersion {
        /// Entity key.
        entity_id: EntityId,
        /// Version the writer read.
        expected: Option<u32>,
    },
    /// Status of a change request.
    RequestStatus {
        /// Request id.
        id: Uuid,
        /// Status the writer read.
        expected: RequestStatus,
    },
}

/// A history row write.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryWrite<T> {
    /// New row; fails on an existing key.
    Insert(IdentifierHistory<T>),
    /// Replacement of an existing row; fails when the key is missing.
    Update(IdentifierHistory<T>),
}

impl<T: IdentifierKind> HistoryWrite<T> {
    /// The row being written.
    pub fn row(&self) -> &IdentifierHistory<T> {
        match self {
            Self::Insert(row) | Self::Update(row) => row,
        }
    }
}

/// A snapshot write.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotWrite<T> {
    /// Insert or replace.
    Put(IdentifierSnapshot<T>),
    /// Remove if present.
    Delete(EntityId),
}

/// Writes committed together by [`IdentifierStore::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct WriteBatch<T> {
    /// Checked before anything is written.
    pub guards: Vec<Guard<T>>,
    /// History inserts and updates.
    pub history: Vec<HistoryWrite<T>>,
    /// Snapshot puts and deletes.
    pub snapshots: Vec<SnapshotWrite<T>>,
    /// Change request upserts.
    pub requests: Vec<ChangeRequest<T>>,
}

impl<T> Default for WriteBatch<T> {
    fn default() -> Self {
        Self {
            guards: Vec::new(),
            history: Vec::new(),
            snapshots: Vec::new(),
            requests: Vec::new(),
        }
    }
}

impl<T: IdentifierKind> WriteBatch<T> {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the identifier's current version to still be `expected`.
    pub fn expect_current(&mut self, entity_id: EntityId, identifier_type: T, expected: Option<u32>) {
        self.guards.push(Guard::CurrentVersion {
            entity_id,
            identifier_type,
            expected,
        });
    }

    /// Requires the entity's snapshot version to still be `expected`.
    pub fn expect_snapshot(&mut self, entity_id: EntityId, expected: Option<u32>) {
        self.guards.push(Guard::SnapshotVersion {
            entity_id,
            expected,
        });
    }

    /// Requires a change request to still be in `expected`.
    pub fn expect_request_status(&mut self, id: Uuid, expected: RequestStatus) {
        self.guards.push(Guard::RequestStatus { id, expected });
    }

    /// Appends a new history row.
    pub fn insert_history(&mut self, row: IdentifierHistory<T>) {
        self.history.push(HistoryWrite::Insert(row));
    }

    /// Replaces an existing history row.
    pub fn update_history(&mut self, row: IdentifierHistory<T>) {
        self.history.push(HistoryWrite::Update(row));
    }

    /// Inserts or replaces a snapshot.
    pub fn put_snapshot(&mut self, snapshot: IdentifierSnapshot<T>) {
        self.snapshots.push(SnapshotWrite::Put(snapshot));
    }

    /// Removes a snapshot.
    pub fn delete_snapshot(&mut self, entity_id: EntityId) {
        self.snapshots.push(SnapshotWrite::Delete(entity_id));
    }

    /// Inserts or replaces a change request.
    pub fn put_request(&mut self, request: ChangeRequest<T>) {
        self.requests.push(request);
    }

    /// Nothing to write or check.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
            && self.history.is_empty()
            && self.snapshots.is_empty()
            && self.requests.is_empty()
    }
}

/// Version of the current row among `rows`.
pub(crate) fn current_version<'a, T: IdentifierKind + 'a>(
    rows: impl IntoIterator<Item = &'a IdentifierHistory<T>>,
) -> Option<u32> {
    rows.into_iter()
        .filter(|row| row.is_current())
        .map(|row| row.version)
        .max()
}

fn describe(version: Option<u32>) -> String {
    version.map_or_else(|| "none".to_string(), |v| format!("v{v}"))
}

/// Conflict error for a failed current-version guard.
pub(crate) fn current_conflict<T: IdentifierKind>(
    entity_id: EntityId,
    kind: T,
    expected: Option<u32>,
    actual: Option<u32>,
) -> StoreError {
    StoreError::conflict(
        format!("{entity_id}:{}", kind.as_str()),
        describe(expected),
        describe(actual),
    )
}

/// Conflict error for a failed snapshot guard.
pub(crate) fn snapshot_conflict(
    entity_id: EntityId,
    expected: Option<u32>,
    actual: Option<u32>,
) -> StoreError {
    StoreError::conflict(
        format!("snapshot:{entity_id}"),
        describe(expected),
        describe(actual),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IdentifierType;

    #[test]
    fn test_batch_builders() {
        let mut batch = WriteBatch::<IdentifierType>::new();
        assert!(batch.is_empty());
        batch.expect_current(1, IdentifierType::Isin, None);
        batch.expect_snapshot(1, Some(2));
        batch.delete_snapshot(1);
        assert!(!batch.is_empty());
        assert_eq!(batch.guards.len(), 2);
        assert_eq!(batch.snapshots, vec![SnapshotWrite::Delete(1)]);
    }

    #[test]
    fn test_conflict_messages() {
        let err = current_conflict(42, IdentifierType::Ticker, Some(1), Some(2));
        assert_eq!(
            err.to_string(),
            "Version conflict on '42:TICKER': expected v1, found v2"
        );
        let err = snapshot_conflict(42, None, Some(3));
        assert_eq!(
            err.to_string(),
            "Version conflict on 'snapshot:42': expected none, found v3"
        );
    }
}
