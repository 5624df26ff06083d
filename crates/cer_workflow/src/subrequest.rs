#![forbid(unsafe_code)]

use cer_kernel_contracts::notification::NotificationBody;
use cer_kernel_contracts::review::{CerId, ExternalScriptId, ScriptId};
use cer_kernel_contracts::script::{ScriptKind, ScriptStatus, UploadEntry, UploadStatus};
use cer_kernel_contracts::subrequest::{
    AdditionalDocumentRequestRecord, ApproveReuploadRequest, OpenAdditionalDocumentRequest,
    OpenReuploadRequest, ReuploadRequestRecord, SubRequestId, SubRequestStatus,
    VendorAdditionalDocumentRequest, VendorReuploadRequest,
};
use cer_kernel_contracts::{MonotonicTimeNs, Validate};
use cer_storage::ReviewStore;
use sha2::{Digest, Sha256};

use crate::approval::ApprovalLedger;
use crate::notify::NotificationDispatcher;
use crate::WorkflowError;

/// Two micro-workflows layered on one script, same lifecycle shape:
/// awaiting_upload -> needs_review -> resolution. Re-upload requests are
/// consumed on approval; additional-document requests persist as the record
/// of what was asked and eventually provided. Opening either kind
/// invalidates a live approval for the script.
#[derive(Debug, Default, Clone)]
pub struct SubRequestTracker;

impl SubRequestTracker {
    /// Analyst demands a fresh upload of one document.
    pub fn request_reupload(
        store: &mut ReviewStore,
        req: &OpenReuploadRequest,
    ) -> Result<SubRequestId, WorkflowError> {
        req.validate()?;
        let (cer_id, script_id) = owning_pair(store, &req.external_id)?;
        let request_id = derive_sub_request_id(
            "rr",
            &[req.external_id.as_str(), &req.document_name],
            req.now,
        )?;
        let record = ReuploadRequestRecord::v1(
            request_id.clone(),
            req.document_name.clone(),
            req.reason.clone(),
            req.analyst_notes.clone(),
            req.now,
            SubRequestStatus::AwaitingUpload,
        )?;

        let row = store
            .script_row_mut(&req.external_id)
            .ok_or_else(|| script_not_found(&req.external_id))?;
        row.reupload_requests.push(record);
        row.kind = ScriptKind::ActionItem;
        row.status = ScriptStatus::ActionItemIssued;

        // New evidence demands void the standing approval outright.
        ApprovalLedger::invalidate(store, &cer_id, &script_id);

        NotificationDispatcher::emit(
            store,
            req.now,
            &req.external_id,
            NotificationBody::ReuploadRequested {
                document_name: req.document_name.clone(),
                reason: req.reason.clone(),
            },
        )?;
        Ok(request_id)
    }

    /// Vendor provides the demanded document again; the request moves to
    /// needs_review and the analyst is notified.
    pub fn vendor_reuploads(
        store: &mut ReviewStore,
        req: &VendorReuploadRequest,
    ) -> Result<(), WorkflowError> {
        req.validate()?;
        let row = store
            .script_row_mut(&req.external_id)
            .ok_or_else(|| script_not_found(&req.external_id))?;
        let request = row
            .reupload_requests
            .iter_mut()
            .find(|r| {
                r.document_name == req.document_name
                    && r.status == SubRequestStatus::AwaitingUpload
            })
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "reupload_request",
                key: format!("{}/{}", req.external_id.as_str(), req.document_name),
            })?;
        request.status = SubRequestStatus::NeedsReview;
        row.status = ScriptStatus::ActionItemResponded;
        row.upload_history.push(UploadEntry::v1(
            req.document_name.clone(),
            req.now,
            UploadStatus::UnderReview,
        )?);

        NotificationDispatcher::emit(
            store,
            req.now,
            &req.external_id,
            NotificationBody::UploadNeedsReview {
                document_name: req.document_name.clone(),
            },
        )?;
        Ok(())
    }

    /// Analyst accepts the fresh upload. The request is consumed (deleted,
    /// not archived); when no open sub-request remains, the script reverts to
    /// plain COQ Responded. Matching needs-review notifications go away with
    /// the request.
    pub fn approve_reupload(
        store: &mut ReviewStore,
        req: &ApproveReuploadRequest,
    ) -> Result<ScriptStatus, WorkflowError> {
        req.validate()?;
        let row = store
            .script_row_mut(&req.external_id)
            .ok_or_else(|| script_not_found(&req.external_id))?;
        let position = row
            .reupload_requests
            .iter()
            .position(|r| {
                r.document_name == req.document_name
                    && r.status == SubRequestStatus::NeedsReview
            })
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "reupload_request",
                key: format!("{}/{}", req.external_id.as_str(), req.document_name),
            })?;
        row.reupload_requests.remove(position);

        if !row.has_open_sub_requests() {
            row.status = ScriptStatus::CoqResponded;
            row.kind = ScriptKind::Coq;
        }
        let status = row.status;

        NotificationDispatcher::resolve_upload_review(
            store,
            &req.external_id,
            &req.document_name,
        );
        Ok(status)
    }

    /// Analyst demands a document that was never part of the submission.
    pub fn request_additional_document(
        store: &mut ReviewStore,
        req: &OpenAdditionalDocumentRequest,
    ) -> Result<SubRequestId, WorkflowError> {
        req.validate()?;
        let (cer_id, script_id) = owning_pair(store, &req.external_id)?;
        let request_id = derive_sub_request_id(
            "ad",
            &[req.external_id.as_str(), &req.requirement],
            req.now,
        )?;
        let record = AdditionalDocumentRequestRecord::v1(
            request_id.clone(),
            req.requirement.clone(),
            req.analyst_notes.clone(),
            req.now,
            SubRequestStatus::AwaitingUpload,
        )?;

        let row = store
            .script_row_mut(&req.external_id)
            .ok_or_else(|| script_not_found(&req.external_id))?;
        row.additional_document_requests.push(record);
        row.kind = ScriptKind::ActionItem;
        row.status = ScriptStatus::ActionItemIssued;

        ApprovalLedger::invalidate(store, &cer_id, &script_id);

        NotificationDispatcher::emit(
            store,
            req.now,
            &req.external_id,
            NotificationBody::AdditionalDocumentRequested {
                requirement: req.requirement.clone(),
            },
        )?;
        Ok(request_id)
    }

    /// Vendor provides the additionally requested document. The request is
    /// kept in place at needs_review; for this sub-kind that is the terminal
    /// status; there is no analyst approval endpoint for it.
    pub fn vendor_uploads_additional_document(
        store: &mut ReviewStore,
        req: &VendorAdditionalDocumentRequest,
    ) -> Result<(), WorkflowError> {
        req.validate()?;
        let row = store
            .script_row_mut(&req.external_id)
            .ok_or_else(|| script_not_found(&req.external_id))?;
        let request = row
            .additional_document_requests
            .iter_mut()
            .find(|r| {
                r.request_id == req.request_id
                    && r.status == SubRequestStatus::AwaitingUpload
            })
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "additional_document_request",
                key: req.request_id.as_str().to_string(),
            })?;
        request.status = SubRequestStatus::NeedsReview;
        row.status = ScriptStatus::ActionItemResponded;
        row.upload_history.push(UploadEntry::v1(
            req.file_name.clone(),
            req.now,
            UploadStatus::UnderReview,
        )?);

        NotificationDispatcher::emit(
            store,
            req.now,
            &req.external_id,
            NotificationBody::UploadNeedsReview {
                document_name: req.file_name.clone(),
            },
        )?;
        Ok(())
    }
}

fn owning_pair(
    store: &ReviewStore,
    external_id: &ExternalScriptId,
) -> Result<(CerId, ScriptId), WorkflowError> {
    store
        .internal_id_row(external_id)
        .cloned()
        .ok_or_else(|| script_not_found(external_id))
}

fn script_not_found(external_id: &ExternalScriptId) -> WorkflowError {
    WorkflowError::NotFound {
        entity: "test_script",
        key: external_id.as_str().to_string(),
    }
}

fn derive_sub_request_id(
    prefix: &str,
    parts: &[&str],
    now: MonotonicTimeNs,
) -> Result<SubRequestId, WorkflowError> {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        // Delimiter keeps adjacent parts from concatenating ambiguously.
        hasher.update([0x1f]);
    }
    hasher.update(now.0.to_be_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for byte in &digest[..8] {
        hex.push_str(&format!("{byte:02x}"));
    }
    Ok(SubRequestId::new(format!("{prefix}-{hex}"))?)
}
