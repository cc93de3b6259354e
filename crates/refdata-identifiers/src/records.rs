//! History, snapshot and change request records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{
    ChangeReason, EntityId, IdentifierKind, IdentifierStatus, RequestStatus, RiskLevel,
};
use crate::validation::FormatValidation;

/// Default confidence stamped on new history rows.
pub const DEFAULT_CONFIDENCE: &str = "HIGH";

/// One version of one identifier of one entity.
///
/// Rows are append-only. The only mutation is closing a row when a newer
/// version supersedes it.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: IdentifierKind")]
pub struct IdentifierHistory<T> {
    pub id: Uuid,
    pub entity_id: EntityId,
    pub identifier_type: T,
    pub identifier_value: String,
    pub exchange_mic: Option<String>,
    pub currency: Option<String>,
    /// 1-based, gapless per (entity, type).
    pub version: u32,
    pub effective_from: DateTime<Utc>,
    /// `None` while the row is current.
    pub effective_to: Option<DateTime<Utc>>,
    pub status: IdentifierStatus,
    pub change_reason: Option<ChangeReason>,
    pub change_description: Option<String>,
    /// Row this one replaced.
    pub supersedes_id: Option<Uuid>,
    pub source: Option<String>,
    pub confidence_level: Option<String>,
    pub validation_status: Option<String>,
    #[serde(default)]
    pub validation_errors: Vec<String>,
    pub created_by: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl<T: IdentifierKind> IdentifierHistory<T> {
    /// Open-ended and active.
    pub fn is_current(&self) -> bool {
        self.effective_to.is_none() && self.status == IdentifierStatus::Active
    }

    /// Whether the row was the value in force at `as_of`.
    ///
    /// Superseded rows count for their closed interval; inactive, pending
    /// and errored rows never do.
    pub fn was_effective_at(&self, as_of: DateTime<Utc>) -> bool {
        matches!(
            self.status,
            IdentifierStatus::Active | IdentifierStatus::Superseded
        ) && self.effective_from <= as_of
            && self.effective_to.map_or(true, |to| to > as_of)
    }

    /// Closes the row at `at`.
    pub fn supersede(&mut self, at: DateTime<Utc>) {
        self.effective_to = Some(at);
        self.status = IdentifierStatus::Superseded;
        self.updated_at = Some(at);
    }

    /// Storage key, unique per (entity, type, version).
    pub fn key(&self) -> String {
        history_key(self.entity_id, self.identifier_type, self.version)
    }
}

/// Storage key of a history row.
pub fn history_key<T: IdentifierKind>(entity_id: EntityId, kind: T, version: u32) -> String {
    format!("{}{version:010}", history_prefix(entity_id, kind))
}

/// Key prefix shared by every version of one identifier.
pub fn history_prefix<T: IdentifierKind>(entity_id: EntityId, kind: T) -> String {
    format!("{entity_id:020}:{}:", kind.as_str())
}

/// Optional attributes carried onto a new version.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentifierAttributes {
    pub exchange_mic: Option<String>,
    pub currency: Option<String>,
    pub source: Option<String>,
    /// Defaults to [`DEFAULT_CONFIDENCE`].
    pub confidence_level: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl IdentifierAttributes {
    /// Attributes with only a source.
    #[must_use]
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    /// The attributes of an existing row.
    pub fn from_row<T>(row: &IdentifierHistory<T>) -> Self {
        Self {
            exchange_mic: row.exchange_mic.clone(),
            currency: row.currency.clone(),
            source: row.source.clone(),
            confidence_level: row.confidence_level.clone(),
            metadata: None,
        }
    }
}

/// Input to `create_new_version`.
#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub struct NewVersion<T> {
    pub entity_id: EntityId,
    pub identifier_type: T,
    /// Normalized (trimmed, upper-cased) before it is stored.
    pub value: String,
    pub reason: ChangeReason,
    pub description: Option<String>,
    pub created_by: String,
    pub approved_by: String,
    pub attributes: IdentifierAttributes,
}

impl<T: IdentifierKind> NewVersion<T> {
    /// A self-approved change by `created_by`.
    pub fn new(
        entity_id: EntityId,
        identifier_type: T,
        value: impl Into<String>,
        reason: ChangeReason,
        created_by: impl Into<String>,
    ) -> Self {
        let created_by = created_by.into();
        Self {
            entity_id,
            identifier_type,
            value: value.into(),
            reason,
            description: None,
            approved_by: created_by.clone(),
            created_by,
            attributes: IdentifierAttributes::default(),
        }
    }

    /// Sets the change description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets a separate approver.
    #[must_use]
    pub fn approved_by(mut self, approver: impl Into<String>) -> Self {
        self.approved_by = approver.into();
        self
    }

    /// Sets exchange, currency, source and confidence.
    #[must_use]
    pub fn attributes(mut self, attributes: IdentifierAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Current state of one identifier inside a snapshot.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub value: String,
    pub version: u32,
    pub effective_from: DateTime<Utc>,
    pub source: Option<String>,
    pub exchange_mic: Option<String>,
    pub currency: Option<String>,
    pub confidence_level: Option<String>,
}

impl SnapshotEntry {
    /// Entry for a current history row.
    pub fn from_row<T>(row: &IdentifierHistory<T>) -> Self {
        Self {
            value: row.identifier_value.clone(),
            version: row.version,
            effective_from: row.effective_from,
            source: row.source.clone(),
            exchange_mic: row.exchange_mic.clone(),
            currency: row.currency.clone(),
            confidence_level: row.confidence_level.clone(),
        }
    }
}

/// Denormalized current identifiers of one entity.
///
/// Derived from history; rebuilt in the same write as every history change.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: IdentifierKind")]
pub struct IdentifierSnapshot<T> {
    pub entity_id: EntityId,
    pub identifiers: BTreeMap<T, SnapshotEntry>,
    pub primary_identifier_type: Option<T>,
    pub primary_identifier_value: Option<String>,
    pub last_updated: DateTime<Utc>,
    /// Bumped on every rebuild; used as the snapshot's optimistic guard.
    pub snapshot_version: u32,
}

impl<T: IdentifierKind> IdentifierSnapshot<T> {
    /// Current value for a type.
    pub fn value(&self, kind: T) -> Option<&str> {
        self.identifiers.get(&kind).map(|entry| entry.value.as_str())
    }
}

/// Result of the impact analysis run on every new change request.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    pub current_value: Option<String>,
    pub proposed_value: String,
    pub validation: FormatValidation,
    pub risk_level: RiskLevel,
    pub requires_manual_review: bool,
    pub affected_systems: Vec<String>,
    pub estimated_downtime: String,
}

/// A proposed identifier change awaiting review.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: IdentifierKind")]
pub struct ChangeRequest<T> {
    pub id: Uuid,
    pub entity_id: EntityId,
    pub identifier_type: T,
    pub old_value: Option<String>,
    pub new_value: String,
    pub change_reason: ChangeReason,
    pub change_description: Option<String>,
    pub status: RequestStatus,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
    pub risk_level: Option<RiskLevel>,
    pub impact_assessment: Option<ImpactAssessment>,
}

impl<T> ChangeRequest<T> {
    /// Still awaiting review.
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// One side of a [`VersionDiff`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version: u32,
    pub value: String,
    pub effective_from: DateTime<Utc>,
    pub change_reason: Option<ChangeReason>,
    pub created_by: Option<String>,
    pub approved_by: Option<String>,
}

impl VersionSummary {
    fn from_row<T>(row: &IdentifierHistory<T>) -> Self {
        Self {
            version: row.version,
            value: row.identifier_value.clone(),
            effective_from: row.effective_from,
            change_reason: row.change_reason.clone(),
            created_by: row.created_by.clone(),
            approved_by: row.approved_by.clone(),
        }
    }
}

/// Field-level changes between two versions.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDifferences {
    pub value_changed: bool,
    pub exchange_changed: bool,
    pub currency_changed: bool,
    pub source_changed: bool,
    /// `version2.effective_from - version1.effective_from`.
    pub time_diff_seconds: i64,
}

/// Comparison of two versions of one identifier.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub version1: VersionSummary,
    pub version2: VersionSummary,
    pub differences: VersionDifferences,
}

impl VersionDiff {
    /// Compares two rows.
    pub fn between<T>(v1: &IdentifierHistory<T>, v2: &IdentifierHistory<T>) -> Self {
        Self {
            version1: VersionSummary::from_row(v1),
            version2: VersionSummary::from_row(v2),
            differences: VersionDifferences {
                value_changed: v1.identifier_value != v2.identifier_value,
                exchange_changed: v1.exchange_mic != v2.exchange_mic,
                currency_changed: v1.currency != v2.currency,
                source_changed: v1.source != v2.source,
                time_diff_seconds: (v2.effective_from - v1.effective_from).num_seconds(),
            },
        }
    }
}

/// One row of a version timeline.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub version: u32,
    pub value: String,
    pub effective_from: DateTime<Utc>,
    pub effective_to: Option<DateTime<Utc>>,
    pub status: IdentifierStatus,
    pub change_reason: Option<ChangeReason>,
    pub change_description: Option<String>,
    pub created_by: Option<String>,
    pub approved_by: Option<String>,
    /// Whole days the version was (or has been) in force.
    pub duration_days: i64,
}

impl TimelineEntry {
    /// Timeline entry for a row, measuring open rows up to `now`.
    pub fn from_row<T>(row: &IdentifierHistory<T>, now: DateTime<Utc>) -> Self {
        Self {
            version: row.version,
            value: row.identifier_value.clone(),
            effective_from: row.effective_from,
            effective_to: row.effective_to,
            status: row.status,
            change_reason: row.change_reason.clone(),
            change_description: row.change_description.clone(),
            created_by: row.created_by.clone(),
            approved_by: row.approved_by.clone(),
            duration_days: (row.effective_to.unwrap_or(now) - row.effective_from).num_days(),
        }
    }
}

/// A snapshot value matching a search term.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: IdentifierKind")]
pub struct SearchHit<T> {
    pub entity_id: EntityId,
    pub identifier_type: T,
    pub identifier_value: String,
    pub version: u32,
    pub source: Option<String>,
    pub confidence_level: Option<String>,
}

/// Identifier usage across all entities.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: IdentifierKind")]
pub struct IdentifierStatistics<T> {
    /// Current identifiers per type, including zero counts.
    pub counts_by_type: BTreeMap<T, usize>,
    pub total_entities_with_identifiers: usize,
    pub average_identifiers_per_entity: f64,
}

/// Divergence between history and snapshots.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub missing_snapshots: Vec<String>,
    pub orphaned_snapshots: Vec<String>,
    pub inconsistent_data: Vec<String>,
    pub format_violations: Vec<String>,
}

impl IntegrityReport {
    /// No issue of any kind.
    pub fn is_clean(&self) -> bool {
        self.missing_snapshots.is_empty()
            && self.orphaned_snapshots.is_empty()
            && self.inconsistent_data.is_empty()
            && self.format_violations.is_empty()
    }
}

/// What `cleanup_orphaned_data` changed.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub orphaned_snapshots_removed: usize,
    pub inconsistent_snapshots_fixed: usize,
}
