#![forbid(unsafe_code)]

use cer_kernel_contracts::approval::ApproveScriptRequest;
use cer_kernel_contracts::notification::NotificationBody;
use cer_kernel_contracts::review::{CerId, ExternalScriptId, ScriptId};
use cer_kernel_contracts::script::{
    IssueActionItemRequest, ScriptKind, ScriptStatus, SubmitEvidenceRequest, UploadEntry,
    UploadStatus,
};
use cer_kernel_contracts::Validate;
use cer_storage::ReviewStore;

use crate::approval::ApprovalLedger;
use crate::notify::NotificationDispatcher;
use crate::WorkflowError;

/// Status state machine of the script ledger:
///
/// ```text
/// CoqRequested --submit_evidence--> CoqResponded
/// ActionItemIssued --submit_evidence--> ActionItemResponded
/// (any) --issue_action_item / open sub-request--> ActionItemIssued
/// ActionItemIssued --(last open re-upload resolved)--> CoqResponded
/// ```
///
/// No terminal state: a script cycles between responded/issued as long as new
/// sub-requests arrive. "Approved" is orthogonal, tracked by the approval
/// store and surfaced only through `displayed_status`.
#[derive(Debug, Default, Clone)]
pub struct ScriptLedger;

impl ScriptLedger {
    /// Vendor submits evidence files. Valid only from CoqRequested or
    /// ActionItemIssued; anything else is an InvalidTransition.
    pub fn submit_evidence(
        store: &mut ReviewStore,
        req: &SubmitEvidenceRequest,
    ) -> Result<ScriptStatus, WorkflowError> {
        req.validate()?;
        let script = store
            .script_row(&req.external_id)
            .ok_or_else(|| not_found(&req.external_id))?;
        let next = match script.status {
            ScriptStatus::CoqRequested => ScriptStatus::CoqResponded,
            ScriptStatus::ActionItemIssued => ScriptStatus::ActionItemResponded,
            status => {
                return Err(WorkflowError::InvalidTransition {
                    operation: "submit_evidence",
                    status,
                })
            }
        };

        // Build every entry before the first write so a bad file name cannot
        // leave a half-applied submission.
        let mut entries = Vec::with_capacity(req.file_names.len());
        for name in &req.file_names {
            entries.push(UploadEntry::v1(
                name.clone(),
                req.now,
                UploadStatus::UnderReview,
            )?);
        }

        let row = store
            .script_row_mut(&req.external_id)
            .ok_or_else(|| not_found(&req.external_id))?;
        row.upload_history.extend(entries);
        row.status = next;

        NotificationDispatcher::emit(
            store,
            req.now,
            &req.external_id,
            NotificationBody::VendorSubmission {
                file_count: req.file_names.len(),
                needs_approval: true,
            },
        )?;
        Ok(next)
    }

    /// Analyst reopens a script as an action item. Always permitted; an
    /// approved or responded script can be reopened; both text fields are
    /// overwritten.
    pub fn issue_action_item(
        store: &mut ReviewStore,
        req: &IssueActionItemRequest,
    ) -> Result<(), WorkflowError> {
        req.validate()?;
        let row = store
            .script_row_mut(&req.external_id)
            .ok_or_else(|| not_found(&req.external_id))?;
        row.kind = ScriptKind::ActionItem;
        row.status = ScriptStatus::ActionItemIssued;
        row.analyst_comment = Some(req.analyst_comment.clone());
        row.supporting_evidence_note = Some(req.supporting_evidence_note.clone());

        NotificationDispatcher::emit(
            store,
            req.now,
            &req.external_id,
            NotificationBody::ActionItemCreated,
        )?;
        Ok(())
    }

    /// Approves an analysis version for the script. Tracked out-of-band in
    /// the approval store; the ledger status field never reaches Approved
    /// through this path.
    pub fn approve(
        store: &mut ReviewStore,
        req: &ApproveScriptRequest,
    ) -> Result<(), WorkflowError> {
        ApprovalLedger::approve(store, req)
    }

    /// The status a view should display: the approval store wins, then the
    /// stored status field. Two independently-queryable facts, one answer.
    pub fn displayed_status(
        store: &ReviewStore,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Result<ScriptStatus, WorkflowError> {
        let script = store
            .script_row_by_internal(cer_id, script_id)
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "test_script",
                key: format!("{}/{}", cer_id.as_str(), script_id.as_str()),
            })?;
        if store.approved_row(cer_id, script_id).is_some() {
            return Ok(ScriptStatus::Approved);
        }
        Ok(script.status)
    }
}

fn not_found(external_id: &ExternalScriptId) -> WorkflowError {
    WorkflowError::NotFound {
        entity: "test_script",
        key: external_id.as_str().to_string(),
    }
}
