//! Change request review workflow.
//!
//! A request is created `Pending` and moves exactly once, to `Applied`
//! (writing a new history version) or to `Rejected`.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::version::stage_version;
use super::{commit_with_retry, stage_snapshot, VersionManager};
use crate::error::{IdentifierError, IdentifierResult};
use crate::records::{ChangeRequest, IdentifierHistory, ImpactAssessment, NewVersion};
use crate::store::WriteBatch;
use crate::types::{ChangeReason, EntityId, IdentifierKind, RequestStatus, RiskLevel};
use crate::validation::validate_format;

/// Outcome of [`WorkflowManager::bulk_approve_requests`].
#[derive(Debug, Default)]
pub struct BulkApproval<T> {
    /// History rows written, in request order.
    pub applied: Vec<IdentifierHistory<T>>,
    /// Requests that could not be approved.
    pub failed: Vec<(Uuid, IdentifierError)>,
}

/// Creates, approves and rejects identifier change requests.
pub struct WorkflowManager<T: IdentifierKind> {
    version: Arc<VersionManager<T>>,
}

impl<T: IdentifierKind> WorkflowManager<T> {
    /// Creates a workflow manager writing through `version`.
    pub fn new(version: Arc<VersionManager<T>>) -> Self {
        Self { version }
    }

    /// Risk and validation of moving an identifier to `new_value`.
    pub fn analyze_impact(
        &self,
        entity_id: EntityId,
        kind: T,
        new_value: &str,
    ) -> IdentifierResult<ImpactAssessment> {
        let current_value = self
            .version
            .get_current_version(entity_id, kind)?
            .map(|row| row.identifier_value);
        let validation = validate_format(kind.as_str(), new_value);
        let config = self.version.config();

        let risk_level = if !validation.is_valid {
            RiskLevel::High
        } else if config.is_medium_risk(kind.as_str()) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        Ok(ImpactAssessment {
            current_value,
            proposed_value: new_value.to_string(),
            validation,
            risk_level,
            requires_manual_review: risk_level >= RiskLevel::Medium,
            affected_systems: config.affected_systems.clone(),
            estimated_downtime: if risk_level == RiskLevel::Medium {
                "5 minutes"
            } else {
                "0 minutes"
            }
            .to_string(),
        })
    }

    /// Records a pending request to change an identifier.
    ///
    /// # Errors
    ///
    /// [`IdentifierError::InvalidFormat`] when `new_value` fails its type's
    /// format rule. Nothing is stored in that case.
    pub fn create_change_request(
        &self,
        entity_id: EntityId,
        kind: T,
        new_value: &str,
        reason: ChangeReason,
        requested_by: &str,
        description: Option<&str>,
    ) -> IdentifierResult<ChangeRequest<T>> {
        let impact = self.analyze_impact(entity_id, kind, new_value)?;
        if !impact.validation.is_valid {
            return Err(IdentifierError::InvalidFormat {
                identifier_type: kind.as_str().to_string(),
                value: impact.validation.normalized_value,
                errors: impact.validation.validation_errors,
            });
        }

        let request = ChangeRequest {
            id: Uuid::new_v4(),
            entity_id,
            identifier_type: kind,
            old_value: impact.current_value.clone(),
            new_value: impact.validation.normalized_value.clone(),
            change_reason: reason,
            change_description: description.map(str::to_string),
            status: RequestStatus::Pending,
            requested_by: requested_by.to_string(),
            requested_at: self.version.clock().now(),
            reviewed_by: None,
            reviewed_at: None,
            applied_at: None,
            risk_level: Some(impact.risk_level),
            impact_assessment: Some(impact),
        };

        let mut batch = WriteBatch::new();
        batch.put_request(request.clone());
        self.version.store().apply(batch)?;

        info!(
            request_id = %request.id,
            entity_id,
            identifier_type = %kind,
            new_value = %request.new_value,
            risk_level = ?request.risk_level,
            "Created change request"
        );
        Ok(request)
    }

    /// Applies a pending request as a new history version.
    ///
    /// The version, the rebuilt snapshot and the request's move to
    /// `Applied` are committed together.
    pub fn approve_change_request(
        &self,
        id: Uuid,
        approved_by: &str,
    ) -> IdentifierResult<IdentifierHistory<T>> {
        let store = self.version.store();
        let row = commit_with_retry(
            store.as_ref(),
            self.version.config().max_retries,
            "approve_change_request",
            || {
                let mut request = self.pending_request(id)?;
                let now = self.version.clock().now();

                let mut new = NewVersion::new(
                    request.entity_id,
                    request.identifier_type,
                    request.new_value.clone(),
                    request.change_reason.clone(),
                    request.requested_by.clone(),
                )
                .approved_by(approved_by);
                new.description = request.change_description.clone();

                let mut rows = store.entity_history(request.entity_id)?;
                let previous = store.snapshot(request.entity_id)?;
                let mut batch = WriteBatch::new();
                batch.expect_request_status(id, RequestStatus::Pending);
                let row = stage_version(&mut batch, &mut rows, &new, now);
                stage_snapshot(&mut batch, request.entity_id, &rows, previous.as_ref(), now);

                request.status = RequestStatus::Applied;
                request.reviewed_by = Some(approved_by.to_string());
                request.reviewed_at = Some(now);
                request.applied_at = Some(now);
                batch.put_request(request);
                Ok((batch, row))
            },
        )?;
        info!(
            request_id = %id,
            approved_by,
            entity_id = row.entity_id,
            version = row.version,
            "Applied change request"
        );
        Ok(row)
    }

    /// Declines a pending request. The request is kept.
    pub fn reject_change_request(
        &self,
        id: Uuid,
        rejected_by: &str,
        rejection_reason: Option<&str>,
    ) -> IdentifierResult<ChangeRequest<T>> {
        let store = self.version.store();
        let request = commit_with_retry(
            store.as_ref(),
            self.version.config().max_retries,
            "reject_change_request",
            || {
                let mut request = self.pending_request(id)?;
                request.status = RequestStatus::Rejected;
                request.reviewed_by = Some(rejected_by.to_string());
                request.reviewed_at = Some(self.version.clock().now());
                if let Some(reason) = rejection_reason {
                    let original = request.change_description.take().unwrap_or_default();
                    request.change_description =
                        Some(format!("{original}\nREJECTION REASON: {reason}"));
                }

                let mut batch = WriteBatch::new();
                batch.expect_request_status(id, RequestStatus::Pending);
                batch.put_request(request.clone());
                Ok((batch, request))
            },
        )?;
        info!(request_id = %id, rejected_by, "Rejected change request");
        Ok(request)
    }

    /// Pending requests, oldest first.
    pub fn get_pending_requests(
        &self,
        entity_id: Option<EntityId>,
        kind: Option<T>,
    ) -> IdentifierResult<Vec<ChangeRequest<T>>> {
        let mut requests: Vec<_> = self
            .version
            .store()
            .change_requests()?
            .into_iter()
            .filter(|r| r.is_pending())
            .filter(|r| entity_id.map_or(true, |id| r.entity_id == id))
            .filter(|r| kind.map_or(true, |k| r.identifier_type == k))
            .collect();
        requests.sort_by_key(|r| r.requested_at);
        Ok(requests)
    }

    /// Every request for an entity, newest first.
    pub fn get_request_history(
        &self,
        entity_id: EntityId,
        kind: Option<T>,
    ) -> IdentifierResult<Vec<ChangeRequest<T>>> {
        let mut requests: Vec<_> = self
            .version
            .store()
            .change_requests()?
            .into_iter()
            .filter(|r| r.entity_id == entity_id)
            .filter(|r| kind.map_or(true, |k| r.identifier_type == k))
            .collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(requests)
    }

    /// Approves each request in turn, continuing past failures.
    pub fn bulk_approve_requests(&self, ids: &[Uuid], approved_by: &str) -> BulkApproval<T> {
        let mut outcome = BulkApproval {
            applied: Vec::with_capacity(ids.len()),
            failed: Vec::new(),
        };
        for &id in ids {
            match self.approve_change_request(id, approved_by) {
                Ok(row) => outcome.applied.push(row),
                Err(e) => {
                    warn!(request_id = %id, error = %e, "Failed to approve change request");
                    outcome.failed.push((id, e));
                }
            }
        }
        outcome
    }

    fn pending_request(&self, id: Uuid) -> IdentifierResult<ChangeRequest<T>> {
        let request = self
            .version
            .store()
            .change_request(id)?
            .ok_or(IdentifierError::ChangeRequestNotFound { id })?;
        if !request.is_pending() {
            return Err(IdentifierError::InvalidRequestState {
                id,
                status: request.status,
            });
        }
        Ok(request)
    }
}
