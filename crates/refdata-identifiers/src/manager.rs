//! Single entry point combining the three managers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::VersioningConfig;
use crate::entity::{EntityIdAccessor, EntityRepository};
use crate::error::IdentifierResult;
use crate::managers::{BulkApproval, OperationsManager, VersionManager, WorkflowManager};
use crate::records::{
    ChangeRequest, CleanupReport, IdentifierHistory, IdentifierSnapshot, IdentifierStatistics,
    IntegrityReport, NewVersion, SearchHit, TimelineEntry, VersionDiff,
};
use crate::store::IdentifierStore;
use crate::types::{ChangeReason, EntityId, IdentifierKind};

/// Identifier management for one entity model and one identifier enum.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use refdata_identifiers::prelude::*;
///
/// #[derive(Clone)]
/// struct Bond { id: u64 }
///
/// let accessor = EntityIdAccessor::new(|b: &Bond| b.id);
/// let entities: Arc<dyn EntityRepository<Bond>> =
///     Arc::new(InMemoryEntityRepository::new(vec![Bond { id: 42 }], accessor.clone()));
/// let store: Arc<dyn IdentifierStore<IdentifierType>> = Arc::new(InMemoryStore::new());
/// let manager = IdentifierManager::new(store, entities, accessor);
///
/// let request = manager
///     .request_change(42, IdentifierType::Ticker, "newtic", ChangeReason::CorporateAction, "analyst", None)
///     .unwrap();
/// manager.approve(request.id, "supervisor").unwrap();
/// assert_eq!(
///     manager.current_identifier(42, IdentifierType::Ticker).unwrap().as_deref(),
///     Some("NEWTIC")
/// );
/// ```
pub struct IdentifierManager<T: IdentifierKind, E> {
    version: Arc<VersionManager<T>>,
    workflow: WorkflowManager<T>,
    operations: OperationsManager<T, E>,
}

impl<T: IdentifierKind, E> IdentifierManager<T, E> {
    /// Creates a manager on the system clock with default settings.
    pub fn new(
        store: Arc<dyn IdentifierStore<T>>,
        entities: Arc<dyn EntityRepository<E>>,
        accessor: EntityIdAccessor<E>,
    ) -> Self {
        Self::with_options(
            store,
            entities,
            accessor,
            Arc::new(SystemClock),
            VersioningConfig::default(),
        )
    }

    /// Creates a manager with an explicit clock and configuration.
    pub fn with_options(
        store: Arc<dyn IdentifierStore<T>>,
        entities: Arc<dyn EntityRepository<E>>,
        accessor: EntityIdAccessor<E>,
        clock: Arc<dyn Clock>,
        config: VersioningConfig,
    ) -> Self {
        let version = Arc::new(VersionManager::new(store, clock, config));
        Self {
            workflow: WorkflowManager::new(Arc::clone(&version)),
            operations: OperationsManager::new(Arc::clone(&version), entities, accessor),
            version,
        }
    }

    /// Version history manager.
    pub fn versions(&self) -> &VersionManager<T> {
        &self.version
    }

    /// Change request manager.
    pub fn workflow(&self) -> &WorkflowManager<T> {
        &self.workflow
    }

    /// Lookup and maintenance manager.
    pub fn operations(&self) -> &OperationsManager<T, E> {
        &self.operations
    }

    // Reads

    /// Current value of one identifier.
    pub fn current_identifier(&self, entity_id: EntityId, kind: T) -> IdentifierResult<Option<String>> {
        self.operations.get_current_identifier(entity_id, kind)
    }

    /// Every current identifier of an entity.
    pub fn current_identifiers(&self, entity_id: EntityId) -> IdentifierResult<BTreeMap<T, String>> {
        self.operations.get_all_current_identifiers(entity_id)
    }

    /// Value in force at `as_of`.
    pub fn identifier_at(
        &self,
        entity_id: EntityId,
        kind: T,
        as_of: DateTime<Utc>,
    ) -> IdentifierResult<Option<String>> {
        self.version.get_identifier_at_date(entity_id, kind, as_of)
    }

    /// Version history, newest first.
    pub fn history(&self, entity_id: EntityId, kind: T) -> IdentifierResult<Vec<IdentifierHistory<T>>> {
        self.version.get_identifier_history(entity_id, kind)
    }

    /// Version timeline, newest first.
    pub fn timeline(&self, entity_id: EntityId, kind: T) -> IdentifierResult<Vec<TimelineEntry>> {
        self.version.get_version_timeline(entity_id, kind)
    }

    /// Comparison of two versions.
    pub fn diff(
        &self,
        entity_id: EntityId,
        kind: T,
        version1: u32,
        version2: u32,
    ) -> IdentifierResult<Option<VersionDiff>> {
        self.version.get_version_diff(entity_id, kind, version1, version2)
    }

    /// Entity currently carrying `value`.
    pub fn find_entity(&self, kind: T, value: &str) -> IdentifierResult<Option<E>> {
        self.operations.find_entity_by_identifier(kind, value)
    }

    /// Current values containing `term`.
    pub fn search(&self, term: &str, kinds: Option<&[T]>) -> IdentifierResult<Vec<SearchHit<T>>> {
        self.operations.search_identifiers(term, kinds)
    }

    /// Usage counts.
    pub fn statistics(&self) -> IdentifierResult<IdentifierStatistics<T>> {
        self.operations.get_identifier_statistics()
    }

    // Writes

    /// Writes a new version directly, bypassing review.
    pub fn set_identifier(&self, new: NewVersion<T>) -> IdentifierResult<IdentifierHistory<T>> {
        let row = self.version.create_new_version(new)?;
        self.operations.refresh_primary_symbol_of(row.entity_id)?;
        Ok(row)
    }

    /// Opens a change request.
    pub fn request_change(
        &self,
        entity_id: EntityId,
        kind: T,
        new_value: &str,
        reason: ChangeReason,
        requested_by: &str,
        description: Option<&str>,
    ) -> IdentifierResult<ChangeRequest<T>> {
        self.workflow
            .create_change_request(entity_id, kind, new_value, reason, requested_by, description)
    }

    /// Approves a change request.
    pub fn approve(&self, id: Uuid, approved_by: &str) -> IdentifierResult<IdentifierHistory<T>> {
        let row = self.workflow.approve_change_request(id, approved_by)?;
        self.operations.refresh_primary_symbol_of(row.entity_id)?;
        Ok(row)
    }

    /// Approves several change requests, continuing past failures.
    pub fn approve_all(&self, ids: &[Uuid], approved_by: &str) -> IdentifierResult<BulkApproval<T>> {
        let outcome = self.workflow.bulk_approve_requests(ids, approved_by);
        let entities: BTreeSet<_> =
            outcome.applied.iter().map(|row| row.entity_id).collect();
        for entity_id in entities {
            self.operations.refresh_primary_symbol_of(entity_id)?;
        }
        Ok(outcome)
    }

    /// Rejects a change request.
    pub fn reject(
        &self,
        id: Uuid,
        rejected_by: &str,
        reason: Option<&str>,
    ) -> IdentifierResult<ChangeRequest<T>> {
        self.workflow.reject_change_request(id, rejected_by, reason)
    }

    /// Pending change requests, oldest first.
    pub fn pending_requests(
        &self,
        entity_id: Option<EntityId>,
        kind: Option<T>,
    ) -> IdentifierResult<Vec<ChangeRequest<T>>> {
        self.workflow.get_pending_requests(entity_id, kind)
    }

    /// Re-instates an earlier version's value as a new version.
    pub fn rollback(
        &self,
        entity_id: EntityId,
        kind: T,
        target_version: u32,
        reason: &str,
        performed_by: &str,
    ) -> IdentifierResult<IdentifierHistory<T>> {
        let row = self
            .version
            .rollback_to_version(entity_id, kind, target_version, reason, performed_by)?;
        self.operations.refresh_primary_symbol_of(entity_id)?;
        Ok(row)
    }

    /// Adds identifiers the entity does not have yet.
    pub fn bulk_add(
        &self,
        entity_id: EntityId,
        identifiers: &BTreeMap<T, String>,
        created_by: &str,
        source: Option<&str>,
    ) -> IdentifierResult<Vec<IdentifierHistory<T>>> {
        self.operations
            .bulk_add_identifiers(entity_id, identifiers, created_by, source, None)
    }

    // Maintenance

    /// Rebuilds one entity's snapshot.
    pub fn rebuild_snapshot(&self, entity_id: EntityId) -> IdentifierResult<Option<IdentifierSnapshot<T>>> {
        self.operations.rebuild_identifier_snapshot(entity_id)
    }

    /// Checks snapshots against history.
    pub fn check_integrity(&self, entity_id: Option<EntityId>) -> IdentifierResult<IntegrityReport> {
        self.operations.validate_identifier_integrity(entity_id)
    }

    /// Repairs snapshots that disagree with history.
    pub fn cleanup(&self) -> IdentifierResult<CleanupReport> {
        self.operations.cleanup_orphaned_data()
    }
}
