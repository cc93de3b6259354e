//! Version, workflow and operations managers.
//!
//! All three share one store. Each write is planned from a fresh read,
//! guarded on what was read, and retried a bounded number of times when a
//! concurrent writer got there first.

mod operations;
mod version;
mod workflow;

pub use operations::OperationsManager;
pub use version::VersionManager;
pub use workflow::{BulkApproval, WorkflowManager};

use chrono::{DateTime, Utc};

use crate::error::{IdentifierError, IdentifierResult};
use crate::records::{IdentifierHistory, IdentifierSnapshot, SnapshotEntry};
use crate::store::{IdentifierStore, WriteBatch};
use crate::types::{EntityId, IdentifierKind};

/// Tags tried in order when choosing a snapshot's primary identifier.
const PRIMARY_PREFERENCE: [&str; 2] = ["TICKER", "ISIN"];

/// Builds the snapshot of an entity from its history rows.
///
/// Returns `None` when the entity has no current identifier.
pub(crate) fn build_snapshot<T: IdentifierKind>(
    entity_id: EntityId,
    rows: &[IdentifierHistory<T>],
    previous: Option<&IdentifierSnapshot<T>>,
    now: DateTime<Utc>,
) -> Option<IdentifierSnapshot<T>> {
    let current: Vec<_> = rows
        .iter()
        .filter(|row| row.entity_id == entity_id && row.is_current())
        .collect();
    if current.is_empty() {
        return None;
    }

    let identifiers = current
        .iter()
        .map(|row| (row.identifier_type, SnapshotEntry::from_row(*row)))
        .collect();
    let primary = PRIMARY_PREFERENCE
        .iter()
        .find_map(|tag| current.iter().find(|row| row.identifier_type.as_str() == *tag));

    Some(IdentifierSnapshot {
        entity_id,
        identifiers,
        primary_identifier_type: primary.map(|row| row.identifier_type),
        primary_identifier_value: primary.map(|row| row.identifier_value.clone()),
        last_updated: now,
        snapshot_version: previous.map_or(0, |s| s.snapshot_version) + 1,
    })
}

/// Adds the rebuilt snapshot of an entity to `batch`, guarded on `previous`.
pub(crate) fn stage_snapshot<T: IdentifierKind>(
    batch: &mut WriteBatch<T>,
    entity_id: EntityId,
    rows: &[IdentifierHistory<T>],
    previous: Option<&IdentifierSnapshot<T>>,
    now: DateTime<Utc>,
) -> Option<IdentifierSnapshot<T>> {
    batch.expect_snapshot(entity_id, previous.map(|s| s.snapshot_version));
    let snapshot = build_snapshot(entity_id, rows, previous, now);
    match &snapshot {
        Some(snapshot) => batch.put_snapshot(snapshot.clone()),
        None if previous.is_some() => batch.delete_snapshot(entity_id),
        None => {}
    }
    snapshot
}

/// Plans and commits a batch, re-planning after optimistic-lock conflicts.
pub(crate) fn commit_with_retry<T, R>(
    store: &dyn IdentifierStore<T>,
    max_retries: u32,
    operation: &'static str,
    mut plan: impl FnMut() -> IdentifierResult<(WriteBatch<T>, R)>,
) -> IdentifierResult<R>
where
    T: IdentifierKind,
{
    let mut attempt = 0;
    loop {
        let (batch, outcome) = plan()?;
        match store.apply(batch).map_err(IdentifierError::from) {
            Ok(()) => return Ok(outcome),
            Err(err) if err.is_conflict() && attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    operation,
                    attempt,
                    backend = store.backend_name(),
                    error = %err,
                    "Write conflict, retrying"
                );
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DEFAULT_CONFIDENCE;
    use crate::store::InMemoryStore;
    use crate::types::{ChangeReason, IdentifierStatus, IdentifierType};
    use chrono::TimeZone;
    use std::cell::Cell;
    use uuid::Uuid;

    fn row(kind: IdentifierType, value: &str, version: u32) -> IdentifierHistory<IdentifierType> {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        IdentifierHistory {
            id: Uuid::new_v4(),
            entity_id: 1,
            identifier_type: kind,
            identifier_value: value.to_string(),
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
    fn test_primary_prefers_ticker_then_isin() {
        let now = Utc::now();
        let rows = vec![
            row(IdentifierType::Isin, "US0378331005", 1),
            row(IdentifierType::Ticker, "AAPL", 1),
        ];
        let snapshot = build_snapshot(1, &rows, None, now).unwrap();
        assert_eq!(snapshot.primary_identifier_type, Some(IdentifierType::Ticker));
        assert_eq!(snapshot.primary_identifier_value.as_deref(), Some("AAPL"));
        assert_eq!(snapshot.snapshot_version, 1);

        let snapshot = build_snapshot(1, &rows[..1], Some(&snapshot), now).unwrap();
        assert_eq!(snapshot.primary_identifier_type, Some(IdentifierType::Isin));
        assert_eq!(snapshot.snapshot_version, 2);

        let rows = vec![row(IdentifierType::Cusip, "037833100", 1)];
        let snapshot = build_snapshot(1, &rows, None, now).unwrap();
        assert_eq!(snapshot.primary_identifier_type, None);
        assert_eq!(snapshot.value(IdentifierType::Cusip), Some("037833100"));
    }

    #[test]
    fn test_closed_rows_excluded() {
        let mut old = row(IdentifierType::Ticker, "OLD", 1);
        old.supersede(Utc::now());
        assert!(build_snapshot(1, &[old], None, Utc::now()).is_none());
    }

    #[test]
    fn test_retry_stops_after_limit() {
        let store = InMemoryStore::<IdentifierType>::new();
        let attempts = Cell::new(0);
        let result = commit_with_retry(&store, 2, "test", || {
            attempts.set(attempts.get() + 1);
            let mut batch = WriteBatch::new();
            // Always stale: claims a current version that never exists.
            batch.expect_current(1, IdentifierType::Ticker, Some(1));
            Ok((batch, ()))
        });
        assert!(matches!(result, Err(IdentifierError::VersionConflict { .. })));
        assert_eq!(attempts.get(), 3);
    }
}
