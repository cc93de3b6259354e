//! Snapshot reads, lookups, bulk loads and maintenance.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::version::stage_version;
use super::{build_snapshot, commit_with_retry, stage_snapshot, VersionManager};
use crate::entity::{EntityIdAccessor, EntityRepository};
use crate::error::IdentifierResult;
use crate::records::{
    CleanupReport, IdentifierAttributes, IdentifierHistory, IdentifierSnapshot,
    IdentifierStatistics, IntegrityReport, NewVersion, SearchHit,
};
use crate::store::{IdentifierStore, WriteBatch};
use crate::types::{ChangeReason, EntityId, IdentifierKind};
use crate::validation::{has_format_rule, normalize, validate_format};

/// Higher-level identifier operations over entities of type `E`.
pub struct OperationsManager<T: IdentifierKind, E> {
    version: Arc<VersionManager<T>>,
    entities: Arc<dyn EntityRepository<E>>,
    accessor: EntityIdAccessor<E>,
}

impl<T: IdentifierKind, E> OperationsManager<T, E> {
    /// Creates an operations manager.
    pub fn new(
        version: Arc<VersionManager<T>>,
        entities: Arc<dyn EntityRepository<E>>,
        accessor: EntityIdAccessor<E>,
    ) -> Self {
        Self {
            version,
            entities,
            accessor,
        }
    }

    fn store(&self) -> &dyn IdentifierStore<T> {
        self.version.store().as_ref()
    }

    /// Current value of one identifier, read from the snapshot.
    pub fn get_current_identifier(
        &self,
        entity_id: EntityId,
        kind: T,
    ) -> IdentifierResult<Option<String>> {
        Ok(self
            .store()
            .snapshot(entity_id)?
            .and_then(|s| s.value(kind).map(str::to_string)))
    }

    /// Every current value of an entity, read from the snapshot.
    pub fn get_all_current_identifiers(
        &self,
        entity_id: EntityId,
    ) -> IdentifierResult<BTreeMap<T, String>> {
        Ok(self
            .store()
            .snapshot(entity_id)?
            .map(|s| {
                s.identifiers
                    .into_iter()
                    .map(|(kind, entry)| (kind, entry.value))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Entity whose current `kind` identifier equals `value`.
    ///
    /// Snapshots are searched first; history is scanned when they miss or
    /// cannot be read.
    pub fn find_entity_by_identifier(&self, kind: T, value: &str) -> IdentifierResult<Option<E>> {
        let value = normalize(value);

        let from_snapshot = match self.store().snapshots() {
            Ok(snapshots) => snapshots
                .into_iter()
                .find(|s| s.value(kind) == Some(value.as_str()))
                .map(|s| s.entity_id),
            Err(e) => {
                warn!(error = %e, "Snapshot lookup failed, scanning history");
                None
            }
        };

        let entity_id = match from_snapshot {
            Some(id) => Some(id),
            None => self
                .store()
                .all_history()?
                .into_iter()
                .find(|row| {
                    row.identifier_type == kind && row.identifier_value == value && row.is_current()
                })
                .map(|row| row.entity_id),
        };

        match entity_id {
            Some(id) => Ok(self
                .entities
                .list()?
                .into_iter()
                .find(|e| self.accessor.id_of(e) == id)),
            None => Ok(None),
        }
    }

    /// Current values containing `term`, optionally limited to some types.
    pub fn search_identifiers(
        &self,
        term: &str,
        kinds: Option<&[T]>,
    ) -> IdentifierResult<Vec<SearchHit<T>>> {
        let term = normalize(term);
        let mut hits = Vec::new();
        for snapshot in self.store().snapshots()? {
            for (kind, entry) in &snapshot.identifiers {
                if kinds.is_some_and(|ks| !ks.contains(kind)) {
                    continue;
                }
                if entry.value.to_uppercase().contains(&term) {
                    hits.push(SearchHit {
                        entity_id: snapshot.entity_id,
                        identifier_type: *kind,
                        identifier_value: entry.value.clone(),
                        version: entry.version,
                        source: entry.source.clone(),
                        confidence_level: entry.confidence_level.clone(),
                    });
                }
            }
        }
        Ok(hits)
    }

    /// Adds first versions for identifiers the entity does not have yet.
    ///
    /// Empty values and types that already have a current version are
    /// skipped. Everything else, and the rebuilt snapshot, is written in one
    /// batch. Returns the rows written.
    pub fn bulk_add_identifiers(
        &self,
        entity_id: EntityId,
        identifiers: &BTreeMap<T, String>,
        created_by: &str,
        source: Option<&str>,
        reason: Option<ChangeReason>,
    ) -> IdentifierResult<Vec<IdentifierHistory<T>>> {
        let reason = reason.unwrap_or(ChangeReason::InitialAssignment);
        let store = self.store();
        let (added, snapshot) = commit_with_retry(
            store,
            self.version.config().max_retries,
            "bulk_add_identifiers",
            || {
                let now = self.version.clock().now();
                let mut rows = store.entity_history(entity_id)?;
                let previous = store.snapshot(entity_id)?;
                let mut batch = WriteBatch::new();
                let mut added = Vec::new();

                for (&kind, value) in identifiers {
                    if value.trim().is_empty() {
                        continue;
                    }
                    if rows
                        .iter()
                        .any(|row| row.identifier_type == kind && row.is_current())
                    {
                        debug!(entity_id, identifier_type = %kind, "Identifier exists, skipping");
                        continue;
                    }
                    let attributes = IdentifierAttributes {
                        source: source.map(str::to_string),
                        ..IdentifierAttributes::default()
                    };
                    let new = NewVersion::new(entity_id, kind, value.as_str(), reason.clone(), created_by)
                        .description(format!("Initial assignment of {}", kind.as_str()))
                        .attributes(attributes);
                    added.push(stage_version(&mut batch, &mut rows, &new, now));
                }

                let snapshot = if added.is_empty() {
                    None
                } else {
                    stage_snapshot(&mut batch, entity_id, &rows, previous.as_ref(), now)
                };
                Ok((batch, (added, snapshot)))
            },
        )?;

        if let Some(snapshot) = &snapshot {
            self.refresh_primary_symbol(snapshot)?;
        }
        info!(entity_id, added = added.len(), "Bulk added identifiers");
        Ok(added)
    }

    /// Recomputes an entity's snapshot from its current history rows.
    ///
    /// Removes the snapshot when nothing is current.
    pub fn rebuild_identifier_snapshot(
        &self,
        entity_id: EntityId,
    ) -> IdentifierResult<Option<IdentifierSnapshot<T>>> {
        let store = self.store();
        let snapshot = commit_with_retry(
            store,
            self.version.config().max_retries,
            "rebuild_identifier_snapshot",
            || {
                let now = self.version.clock().now();
                let rows = store.entity_history(entity_id)?;
                let previous = store.snapshot(entity_id)?;
                let mut batch = WriteBatch::new();
                let snapshot = stage_snapshot(&mut batch, entity_id, &rows, previous.as_ref(), now);
                Ok((batch, snapshot))
            },
        )?;
        if let Some(snapshot) = &snapshot {
            self.refresh_primary_symbol(snapshot)?;
        }
        Ok(snapshot)
    }

    /// Rebuilds the snapshot of every known entity. Returns how many were
    /// rebuilt.
    pub fn rebuild_all_snapshots(&self) -> IdentifierResult<usize> {
        let ids = self.entity_ids()?;
        for &entity_id in &ids {
            self.rebuild_identifier_snapshot(entity_id)?;
        }
        info!(entities = ids.len(), "Rebuilt identifier snapshots");
        Ok(ids.len())
    }

    /// Counts of current identifiers across all entities.
    pub fn get_identifier_statistics(&self) -> IdentifierResult<IdentifierStatistics<T>> {
        let mut counts_by_type: BTreeMap<T, usize> = T::all().iter().map(|&k| (k, 0)).collect();
        for row in self.store().all_history()? {
            if row.is_current() {
                *counts_by_type.entry(row.identifier_type).or_default() += 1;
            }
        }

        let snapshots = self.store().snapshots()?;
        let total = snapshots.len();
        let identifiers: usize = snapshots.iter().map(|s| s.identifiers.len()).sum();
        Ok(IdentifierStatistics {
            counts_by_type,
            total_entities_with_identifiers: total,
            average_identifiers_per_entity: if total == 0 {
                0.0
            } else {
                identifiers as f64 / total as f64
            },
        })
    }

    /// Compares snapshots against history for one entity or all of them.
    pub fn validate_identifier_integrity(
        &self,
        entity_id: Option<EntityId>,
    ) -> IdentifierResult<IntegrityReport> {
        let history = self.store().all_history()?;
        let snapshots: BTreeMap<EntityId, IdentifierSnapshot<T>> = self
            .store()
            .snapshots()?
            .into_iter()
            .map(|s| (s.entity_id, s))
            .collect();

        let ids: BTreeSet<EntityId> = match entity_id {
            Some(id) => BTreeSet::from([id]),
            None => {
                let mut ids: BTreeSet<_> = self.entity_ids()?.into_iter().collect();
                ids.extend(history.iter().map(|row| row.entity_id));
                ids.extend(snapshots.keys().copied());
                ids
            }
        };

        let mut report = IntegrityReport::default();
        for id in ids {
            let current: Vec<_> = history
                .iter()
                .filter(|row| row.entity_id == id && row.is_current())
                .cloned()
                .collect();

            match (current.is_empty(), snapshots.get(&id)) {
                (false, None) => report
                    .missing_snapshots
                    .push(format!("Entity {id} has history but no snapshot")),
                (true, Some(_)) => report
                    .orphaned_snapshots
                    .push(format!("Entity {id} has snapshot but no history")),
                (false, Some(snapshot)) => {
                    if !matches_history(snapshot, &current) {
                        report.inconsistent_data.push(format!(
                            "Entity {id} snapshot does not match current history"
                        ));
                    }
                }
                (true, None) => {}
            }

            for row in &current {
                let tag = row.identifier_type.as_str();
                if !has_format_rule(tag) {
                    continue;
                }
                let validation = validate_format(tag, &row.identifier_value);
                if !validation.is_valid {
                    report.format_violations.push(format!(
                        "Entity {id} {tag} '{}': {}",
                        row.identifier_value,
                        validation.validation_errors.join("; ")
                    ));
                }
            }
        }
        Ok(report)
    }

    /// Removes snapshots with no current history and rebuilds snapshots
    /// that disagree with history.
    pub fn cleanup_orphaned_data(&self) -> IdentifierResult<CleanupReport> {
        let mut report = CleanupReport::default();
        for snapshot in self.store().snapshots()? {
            let entity_id = snapshot.entity_id;
            let current: Vec<_> = self
                .store()
                .entity_history(entity_id)?
                .into_iter()
                .filter(IdentifierHistory::is_current)
                .collect();

            if current.is_empty() {
                self.rebuild_identifier_snapshot(entity_id)?;
                report.orphaned_snapshots_removed += 1;
            } else if !matches_history(&snapshot, &current) {
                self.rebuild_identifier_snapshot(entity_id)?;
                report.inconsistent_snapshots_fixed += 1;
            }
        }
        info!(
            removed = report.orphaned_snapshots_removed,
            fixed = report.inconsistent_snapshots_fixed,
            "Cleaned up identifier snapshots"
        );
        Ok(report)
    }

    /// Copies the snapshot's primary identifier onto the entity record.
    pub(crate) fn refresh_primary_symbol(
        &self,
        snapshot: &IdentifierSnapshot<T>,
    ) -> IdentifierResult<()> {
        if let Some(symbol) = &snapshot.primary_identifier_value {
            self.entities
                .update_primary_symbol(snapshot.entity_id, symbol)?;
        }
        Ok(())
    }

    /// Re-reads the snapshot and refreshes the entity's primary symbol.
    pub(crate) fn refresh_primary_symbol_of(&self, entity_id: EntityId) -> IdentifierResult<()> {
        match self.store().snapshot(entity_id)? {
            Some(snapshot) => self.refresh_primary_symbol(&snapshot),
            None => Ok(()),
        }
    }

    fn entity_ids(&self) -> IdentifierResult<Vec<EntityId>> {
        Ok(self
            .entities
            .list()?
            .iter()
            .map(|e| self.accessor.id_of(e))
            .collect())
    }
}

/// Whether the snapshot lists exactly the current rows.
fn matches_history<T: IdentifierKind>(
    snapshot: &IdentifierSnapshot<T>,
    current: &[IdentifierHistory<T>],
) -> bool {
    match build_snapshot(snapshot.entity_id, current, None, snapshot.last_updated) {
        Some(expected) => {
            expected.identifiers.len() == snapshot.identifiers.len()
                && expected.identifiers.iter().all(|(kind, entry)| {
                    snapshot
                        .identifiers
                        .get(kind)
                        .is_some_and(|e| e.value == entry.value && e.version == entry.version)
                })
        }
        None => snapshot.identifiers.is_empty(),
    }
}
