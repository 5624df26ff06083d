#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::common::{validate_opt_token, validate_token};
use crate::review::{CerId, ExternalScriptId, ScriptId, VendorName};
use crate::subrequest::{
    AdditionalDocumentRequestRecord, ReuploadRequestRecord, SubRequestStatus,
};
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const SCRIPT_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptKind {
    Coq,
    ActionItem,
}

impl ScriptKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScriptKind::Coq => "COQ",
            ScriptKind::ActionItem => "Action Item",
        }
    }
}

/// Ledger status of one test script. `Approved` never appears in the stored
/// `status` field; it is reachable only through the displayed-status query,
/// which consults the approval store first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptStatus {
    CoqRequested,
    CoqResponded,
    ActionItemIssued,
    ActionItemResponded,
    Approved,
}

impl ScriptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScriptStatus::CoqRequested => "COQ Requested",
            ScriptStatus::CoqResponded => "COQ Responded",
            ScriptStatus::ActionItemIssued => "Action Item Issued",
            ScriptStatus::ActionItemResponded => "Action Item Responded",
            ScriptStatus::Approved => "Approved",
        }
    }

    /// Statuses from which the vendor may submit initial/follow-up evidence.
    pub fn accepts_evidence(self) -> bool {
        matches!(
            self,
            ScriptStatus::CoqRequested | ScriptStatus::ActionItemIssued
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UploadStatus {
    UnderReview,
}

impl UploadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadStatus::UnderReview => "Under Review",
        }
    }
}

/// One row of a script's upload history. Append-only; insertion order is
/// meaningful (most recent last).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEntry {
    pub file_name: String,
    pub uploaded_at: MonotonicTimeNs,
    pub status: UploadStatus,
}

impl UploadEntry {
    pub fn v1(
        file_name: String,
        uploaded_at: MonotonicTimeNs,
        status: UploadStatus,
    ) -> Result<Self, ContractViolation> {
        let row = Self {
            file_name,
            uploaded_at,
            status,
        };
        row.validate()?;
        Ok(row)
    }
}

impl Validate for UploadEntry {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("upload_entry.file_name", &self.file_name, 256)?;
        if self.uploaded_at.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "upload_entry.uploaded_at",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

/// The shared, mutable record of one test script. Created only at CER
/// registration, never deleted; mutated only through the workflow runtimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestScriptRecord {
    pub schema_version: SchemaVersion,
    pub external_id: ExternalScriptId,
    pub cer_id: CerId,
    pub script_id: ScriptId,
    pub vendor_name: VendorName,
    pub kind: ScriptKind,
    pub status: ScriptStatus,
    pub requirement_text: String,
    pub script_text: String,
    pub due_date: Option<String>,
    pub coq_request_text: Option<String>,
    pub analyst_comment: Option<String>,
    pub supporting_evidence_note: Option<String>,
    pub final_conclusion: Option<String>,
    pub upload_history: Vec<UploadEntry>,
    pub reupload_requests: Vec<ReuploadRequestRecord>,
    pub additional_document_requests: Vec<AdditionalDocumentRequestRecord>,
}

impl TestScriptRecord {
    /// True while any sub-request of either kind still awaits vendor or
    /// analyst action.
    pub fn has_open_sub_requests(&self) -> bool {
        self.reupload_requests
            .iter()
            .any(|r| r.status.is_open())
            || self
                .additional_document_requests
                .iter()
                .any(|r| r.status.is_open())
    }

    /// Convenience projection of the active re-upload sub-request. Derived on
    /// every read so it cannot drift; never stored. AwaitingUpload wins over
    /// NeedsReview because the vendor still owes a document.
    pub fn reupload_projection(&self) -> Option<SubRequestStatus> {
        if self
            .reupload_requests
            .iter()
            .any(|r| r.status == SubRequestStatus::AwaitingUpload)
        {
            return Some(SubRequestStatus::AwaitingUpload);
        }
        if self
            .reupload_requests
            .iter()
            .any(|r| r.status == SubRequestStatus::NeedsReview)
        {
            return Some(SubRequestStatus::NeedsReview);
        }
        None
    }

    pub fn open_reupload_count(&self) -> usize {
        self.reupload_requests
            .iter()
            .filter(|r| r.status.is_open())
            .count()
    }
}

impl Validate for TestScriptRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != SCRIPT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "test_script_record.schema_version",
                reason: "must match SCRIPT_CONTRACT_VERSION",
            });
        }
        self.external_id.validate()?;
        self.cer_id.validate()?;
        self.script_id.validate()?;
        self.vendor_name.validate()?;
        validate_token(
            "test_script_record.requirement_text",
            &self.requirement_text,
            4096,
        )?;
        validate_token("test_script_record.script_text", &self.script_text, 4096)?;
        validate_opt_token("test_script_record.due_date", &self.due_date, 64)?;
        validate_opt_token(
            "test_script_record.coq_request_text",
            &self.coq_request_text,
            4096,
        )?;
        validate_opt_token(
            "test_script_record.analyst_comment",
            &self.analyst_comment,
            4096,
        )?;
        validate_opt_token(
            "test_script_record.supporting_evidence_note",
            &self.supporting_evidence_note,
            4096,
        )?;
        validate_opt_token(
            "test_script_record.final_conclusion",
            &self.final_conclusion,
            4096,
        )?;
        if self.status == ScriptStatus::Approved {
            return Err(ContractViolation::InvalidValue {
                field: "test_script_record.status",
                reason: "approved is derived from the approval store, never stored",
            });
        }
        for entry in &self.upload_history {
            entry.validate()?;
        }
        for request in &self.reupload_requests {
            request.validate()?;
        }
        for request in &self.additional_document_requests {
            request.validate()?;
        }
        // Any open sub-request forces the action-item kind.
        if self.has_open_sub_requests() && self.kind != ScriptKind::ActionItem {
            return Err(ContractViolation::InvalidValue {
                field: "test_script_record.kind",
                reason: "open sub-requests require kind ACTION_ITEM",
            });
        }
        Ok(())
    }
}

/// Vendor command: submit evidence files against one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitEvidenceRequest {
    pub now: MonotonicTimeNs,
    pub external_id: ExternalScriptId,
    pub file_names: Vec<String>,
}

impl SubmitEvidenceRequest {
    pub fn v1(
        now: MonotonicTimeNs,
        external_id: ExternalScriptId,
        file_names: Vec<String>,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            now,
            external_id,
            file_names,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for SubmitEvidenceRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "submit_evidence_request.now",
                reason: "must be > 0",
            });
        }
        self.external_id.validate()?;
        // A zero-file submission is a caller bug, rejected here rather than
        // accepted as a silent no-op.
        if self.file_names.is_empty() {
            return Err(ContractViolation::EmptyCollection {
                field: "submit_evidence_request.file_names",
            });
        }
        for name in &self.file_names {
            validate_token("submit_evidence_request.file_names", name, 256)?;
        }
        Ok(())
    }
}

/// Analyst command: reopen a script as an action item. Always permitted,
/// whatever the current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueActionItemRequest {
    pub now: MonotonicTimeNs,
    pub external_id: ExternalScriptId,
    pub analyst_comment: String,
    pub supporting_evidence_note: String,
}

impl IssueActionItemRequest {
    pub fn v1(
        now: MonotonicTimeNs,
        external_id: ExternalScriptId,
        analyst_comment: String,
        supporting_evidence_note: String,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            now,
            external_id,
            analyst_comment,
            supporting_evidence_note,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for IssueActionItemRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "issue_action_item_request.now",
                reason: "must be > 0",
            });
        }
        self.external_id.validate()?;
        validate_token(
            "issue_action_item_request.analyst_comment",
            &self.analyst_comment,
            4096,
        )?;
        validate_token(
            "issue_action_item_request.supporting_evidence_note",
            &self.supporting_evidence_note,
            4096,
        )?;
        Ok(())
    }
}
