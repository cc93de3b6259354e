//! Append-only identifier version history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::{commit_with_retry, stage_snapshot};
use crate::clock::Clock;
use crate::config::VersioningConfig;
use crate::error::{IdentifierError, IdentifierResult};
use crate::records::{
    IdentifierAttributes, IdentifierHistory, NewVersion, TimelineEntry, VersionDiff,
    DEFAULT_CONFIDENCE,
};
use crate::store::{IdentifierStore, WriteBatch};
use crate::types::{ChangeReason, EntityId, IdentifierKind, IdentifierStatus};
use crate::validation::{has_format_rule, normalize, validate_format};

/// Reads and appends identifier versions.
///
/// Every (entity, type) has versions 1, 2, 3, ... with at most one open
/// row. Writing a version closes the open row, appends the new one and
/// rebuilds the entity's snapshot in one atomic batch.
pub struct VersionManager<T: IdentifierKind> {
    store: Arc<dyn IdentifierStore<T>>,
    clock: Arc<dyn Clock>,
    config: VersioningConfig,
}

impl<T: IdentifierKind> VersionManager<T> {
    /// Creates a version manager over `store`.
    pub fn new(
        store: Arc<dyn IdentifierStore<T>>,
        clock: Arc<dyn Clock>,
        config: VersioningConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn IdentifierStore<T>> {
        &self.store
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The configuration in use.
    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    /// Full version history of an identifier, newest first.
    pub fn get_identifier_history(
        &self,
        entity_id: EntityId,
        kind: T,
    ) -> IdentifierResult<Vec<IdentifierHistory<T>>> {
        let mut rows = self.store.history(entity_id, kind)?;
        rows.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(rows)
    }

    /// The open, active row of an identifier.
    pub fn get_current_version(
        &self,
        entity_id: EntityId,
        kind: T,
    ) -> IdentifierResult<Option<IdentifierHistory<T>>> {
        Ok(self
            .store
            .history(entity_id, kind)?
            .into_iter()
            .filter(IdentifierHistory::is_current)
            .max_by_key(|row| row.version))
    }

    /// Value in force at `as_of`.
    pub fn get_identifier_at_date(
        &self,
        entity_id: EntityId,
        kind: T,
        as_of: DateTime<Utc>,
    ) -> IdentifierResult<Option<String>> {
        Ok(self
            .store
            .history(entity_id, kind)?
            .into_iter()
            .filter(|row| row.was_effective_at(as_of))
            .max_by_key(|row| row.version)
            .map(|row| row.identifier_value))
    }

    /// A specific version of an identifier.
    pub fn get_version_by_number(
        &self,
        entity_id: EntityId,
        kind: T,
        version: u32,
    ) -> IdentifierResult<Option<IdentifierHistory<T>>> {
        Ok(self
            .store
            .history(entity_id, kind)?
            .into_iter()
            .find(|row| row.version == version))
    }

    /// Compares two versions. `None` when either is missing.
    pub fn get_version_diff(
        &self,
        entity_id: EntityId,
        kind: T,
        version1: u32,
        version2: u32,
    ) -> IdentifierResult<Option<VersionDiff>> {
        let rows = self.store.history(entity_id, kind)?;
        let find = |version: u32| rows.iter().find(|row| row.version == version);
        Ok(match (find(version1), find(version2)) {
            (Some(v1), Some(v2)) => Some(VersionDiff::between(v1, v2)),
            _ => None,
        })
    }

    /// Every version of an identifier as a timeline, newest first.
    pub fn get_version_timeline(
        &self,
        entity_id: EntityId,
        kind: T,
    ) -> IdentifierResult<Vec<TimelineEntry>> {
        let now = self.clock.now();
        Ok(self
            .get_identifier_history(entity_id, kind)?
            .iter()
            .map(|row| TimelineEntry::from_row(row, now))
            .collect())
    }

    /// Supersedes the current value (if any) with a new version.
    pub fn create_new_version(&self, new: NewVersion<T>) -> IdentifierResult<IdentifierHistory<T>> {
        let row = commit_with_retry(
            self.store.as_ref(),
            self.config.max_retries,
            "create_new_version",
            || {
                let now = self.clock.now();
                let mut rows = self.store.entity_history(new.entity_id)?;
                let previous = self.store.snapshot(new.entity_id)?;
                let mut batch = WriteBatch::new();
                let row = stage_version(&mut batch, &mut rows, &new, now);
                stage_snapshot(&mut batch, new.entity_id, &rows, previous.as_ref(), now);
                Ok((batch, row))
            },
        )?;
        info!(
            entity_id = row.entity_id,
            identifier_type = %row.identifier_type,
            version = row.version,
            value = %row.identifier_value,
            "Created identifier version"
        );
        Ok(row)
    }

    /// Re-instates the value of `target_version` as a new highest version.
    ///
    /// History is never deleted or renumbered.
    pub fn rollback_to_version(
        &self,
        entity_id: EntityId,
        kind: T,
        target_version: u32,
        rollback_reason: &str,
        performed_by: &str,
    ) -> IdentifierResult<IdentifierHistory<T>> {
        let row = commit_with_retry(
            self.store.as_ref(),
            self.config.max_retries,
            "rollback_to_version",
            || {
                let now = self.clock.now();
                let mut rows = self.store.entity_history(entity_id)?;
                let target = rows
                    .iter()
                    .find(|row| row.identifier_type == kind && row.version == target_version)
                    .ok_or_else(|| {
                        IdentifierError::version_not_found(entity_id, kind.as_str(), target_version)
                    })?;
                let new = NewVersion::new(
                    entity_id,
                    kind,
                    target.identifier_value.clone(),
                    ChangeReason::DataCorrection,
                    performed_by,
                )
                .description(format!(
                    "Rollback to version {target_version}: {rollback_reason}"
                ))
                .attributes(IdentifierAttributes::from_row(target));

                let previous = self.store.snapshot(entity_id)?;
                let mut batch = WriteBatch::new();
                let row = stage_version(&mut batch, &mut rows, &new, now);
                stage_snapshot(&mut batch, entity_id, &rows, previous.as_ref(), now);
                Ok((batch, row))
            },
        )?;
        info!(
            entity_id,
            identifier_type = %kind,
            target_version,
            version = row.version,
            performed_by,
            "Rolled back identifier"
        );
        Ok(row)
    }
}

/// Adds the close of the current row and the new version to `batch`.
///
/// `rows` is the entity's working history; it is updated in place so that
/// several versions can be staged into one batch.
pub(crate) fn stage_version<T: IdentifierKind>(
    batch: &mut WriteBatch<T>,
    rows: &mut Vec<IdentifierHistory<T>>,
    new: &NewVersion<T>,
    now: DateTime<Utc>,
) -> IdentifierHistory<T> {
    let kind = new.identifier_type;
    let same_identifier =
        |row: &IdentifierHistory<T>| row.entity_id == new.entity_id && row.identifier_type == kind;

    let current = rows
        .iter()
        .position(|row| same_identifier(row) && row.is_current());
    batch.expect_current(new.entity_id, kind, current.map(|i| rows[i].version));

    let supersedes_id = current.map(|i| {
        let old = &mut rows[i];
        old.supersede(now);
        batch.update_history(old.clone());
        old.id
    });

    // Next after the highest version ever written, open or closed.
    let version = rows
        .iter()
        .filter(|row| same_identifier(row))
        .map(|row| row.version)
        .max()
        .unwrap_or(0)
        + 1;

    let value = normalize(&new.value);
    let (validation_status, validation_errors) = if has_format_rule(kind.as_str()) {
        let validation = validate_format(kind.as_str(), &value);
        let status = if validation.is_valid { "VALID" } else { "INVALID" };
        (Some(status.to_string()), validation.validation_errors)
    } else {
        (None, Vec::new())
    };

    let attributes = &new.attributes;
    let row = IdentifierHistory {
        id: Uuid::new_v4(),
        entity_id: new.entity_id,
        identifier_type: kind,
        identifier_value: value,
        exchange_mic: attributes.exchange_mic.clone(),
        currency: attributes.currency.clone(),
        version,
        effective_from: now,
        effective_to: None,
        status: IdentifierStatus::Active,
        change_reason: Some(new.reason.clone()),
        change_description: new.description.clone(),
        supersedes_id,
        source: attributes.source.clone(),
        confidence_level: Some(
            attributes
                .confidence_level
                .clone()
                .unwrap_or_else(|| DEFAULT_CONFIDENCE.to_string()),
        ),
        validation_status,
        validation_errors,
        created_by: Some(new.created_by.clone()),
        approved_by: Some(new.approved_by.clone()),
        approved_at: Some(now),
        created_at: now,
        updated_at: None,
        metadata: attributes
            .metadata
            .clone()
            .unwrap_or_else(|| serde_json::json!({})),
    };
    batch.insert_history(row.clone());
    rows.push(row.clone());
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::InMemoryStore;
    use crate::types::IdentifierType;
    use chrono::{Duration, TimeZone};

    fn manager() -> (VersionManager<IdentifierType>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
        ));
        let store: Arc<dyn IdentifierStore<IdentifierType>> = Arc::new(InMemoryStore::new());
        let manager = VersionManager::new(store, clock.clone(), VersioningConfig::default());
        (manager, clock)
    }

    fn set_ticker(manager: &VersionManager<IdentifierType>, value: &str) -> IdentifierHistory<IdentifierType> {
        manager
            .create_new_version(NewVersion::new(
                42,
                IdentifierType::Ticker,
                value,
                ChangeReason::CorporateAction,
                "ops",
            ))
            .unwrap()
    }

    #[test]
    fn test_first_version_is_one_and_normalized() {
        let (manager, _) = manager();
        let row = set_ticker(&manager, "  abc ");
        assert_eq!(row.version, 1);
        assert_eq!(row.identifier_value, "ABC");
        assert_eq!(row.supersedes_id, None);
        assert_eq!(row.confidence_level.as_deref(), Some(DEFAULT_CONFIDENCE));
        assert!(row.approved_at.is_some());
    }

    #[test]
    fn test_new_version_closes_previous() {
        let (manager, clock) = manager();
        let v1 = set_ticker(&manager, "OLD");
        clock.advance(Duration::days(30));
        let v2 = set_ticker(&manager, "NEW");

        assert_eq!(v2.version, 2);
        assert_eq!(v2.supersedes_id, Some(v1.id));
        let old = manager
            .get_version_by_number(42, IdentifierType::Ticker, 1)
            .unwrap()
            .unwrap();
        assert_eq!(old.status, IdentifierStatus::Superseded);
        assert_eq!(old.effective_to, Some(v2.effective_from));

        let current = manager.get_current_version(42, IdentifierType::Ticker).unwrap().unwrap();
        assert_eq!(current.identifier_value, "NEW");
    }

    #[test]
    fn test_point_in_time_lookup() {
        let (manager, clock) = manager();
        let v1 = set_ticker(&manager, "OLD");
        clock.advance(Duration::days(30));
        let v2 = set_ticker(&manager, "NEW");

        let lookup = |at| manager.get_identifier_at_date(42, IdentifierType::Ticker, at).unwrap();
        assert_eq!(lookup(v1.effective_from - Duration::seconds(1)), None);
        assert_eq!(lookup(v1.effective_from + Duration::days(1)).as_deref(), Some("OLD"));
        assert_eq!(lookup(v2.effective_from).as_deref(), Some("NEW"));
        assert_eq!(lookup(v2.effective_from + Duration::days(365)).as_deref(), Some("NEW"));
    }

    #[test]
    fn test_history_newest_first_and_timeline() {
        let (manager, clock) = manager();
        set_ticker(&manager, "A");
        clock.advance(Duration::days(10));
        set_ticker(&manager, "B");
        clock.advance(Duration::days(4));

        let history = manager.get_identifier_history(42, IdentifierType::Ticker).unwrap();
        assert_eq!(history.iter().map(|r| r.version).collect::<Vec<_>>(), vec![2, 1]);

        let timeline = manager.get_version_timeline(42, IdentifierType::Ticker).unwrap();
        assert_eq!(timeline[0].duration_days, 4);
        assert_eq!(timeline[1].duration_days, 10);
        assert_eq!(timeline[1].status, IdentifierStatus::Superseded);
    }

    #[test]
    fn test_rollback_appends() {
        let (manager, clock) = manager();
        set_ticker(&manager, "A");
        clock.advance(Duration::days(1));
        set_ticker(&manager, "B");
        clock.advance(Duration::days(1));

        let row = manager
            .rollback_to_version(42, IdentifierType::Ticker, 1, "bad vendor file", "supervisor")
            .unwrap();
        assert_eq!(row.version, 3);
        assert_eq!(row.identifier_value, "A");
        assert_eq!(row.change_reason, Some(ChangeReason::DataCorrection));
        assert_eq!(
            row.change_description.as_deref(),
            Some("Rollback to version 1: bad vendor file")
        );
        assert_eq!(row.created_by.as_deref(), Some("supervisor"));
        assert_eq!(row.approved_by.as_deref(), Some("supervisor"));
        assert_eq!(manager.get_identifier_history(42, IdentifierType::Ticker).unwrap().len(), 3);
    }

    #[test]
    fn test_rollback_to_missing_version() {
        let (manager, _) = manager();
        set_ticker(&manager, "A");
        let err = manager
            .rollback_to_version(42, IdentifierType::Ticker, 7, "typo", "ops")
            .unwrap_err();
        assert!(matches!(err, IdentifierError::VersionNotFound { version: 7, .. }));
    }

    #[test]
    fn test_version_diff() {
        let (manager, clock) = manager();
        set_ticker(&manager, "A");
        clock.advance(Duration::hours(1));
        set_ticker(&manager, "B");

        let diff = manager
            .get_version_diff(42, IdentifierType::Ticker, 1, 2)
            .unwrap()
            .unwrap();
        assert!(diff.differences.value_changed);
        assert_eq!(diff.differences.time_diff_seconds, 3600);
        assert!(manager
            .get_version_diff(42, IdentifierType::Ticker, 1, 9)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_validation_status_recorded() {
        let (manager, _) = manager();
        let row = manager
            .create_new_version(NewVersion::new(
                1,
                IdentifierType::Isin,
                "US0378331005",
                ChangeReason::InitialAssignment,
                "loader",
            ))
            .unwrap();
        assert_eq!(row.validation_status.as_deref(), Some("VALID"));
        assert!(row.validation_errors.is_empty());
    }

    #[test]
    fn test_writes_rebuild_snapshot() {
        let (manager, _) = manager();
        set_ticker(&manager, "A");
        set_ticker(&manager, "B");
        let snapshot = manager.store().snapshot(42).unwrap().unwrap();
        assert_eq!(snapshot.value(IdentifierType::Ticker), Some("B"));
        assert_eq!(snapshot.snapshot_version, 2);
    }
}
