#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::common::{validate_opt_token, validate_token};
use crate::review::ExternalScriptId;
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const SUBREQUEST_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Deterministically derived id for one sub-request, e.g. "rr-9f2c41a0b6e3d715".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubRequestId(String);

impl SubRequestId {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for SubRequestId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("sub_request_id", &self.0, 80)
    }
}

/// Shared lifecycle for both sub-request kinds:
/// awaiting_upload -> needs_review -> (approved | resolved-and-removed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubRequestStatus {
    AwaitingUpload,
    NeedsReview,
    Approved,
}

impl SubRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubRequestStatus::AwaitingUpload => "awaiting_upload",
            SubRequestStatus::NeedsReview => "needs_review",
            SubRequestStatus::Approved => "approved",
        }
    }

    /// Open means the vendor or the analyst still owes an action.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            SubRequestStatus::AwaitingUpload | SubRequestStatus::NeedsReview
        )
    }
}

/// An analyst's demand that one already-submitted document be uploaded again.
/// Consumed (deleted) when the analyst approves the fresh upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReuploadRequestRecord {
    pub schema_version: SchemaVersion,
    pub request_id: SubRequestId,
    pub document_name: String,
    pub reason: String,
    pub analyst_notes: Option<String>,
    pub requested_at: MonotonicTimeNs,
    pub status: SubRequestStatus,
}

impl ReuploadRequestRecord {
    pub fn v1(
        request_id: SubRequestId,
        document_name: String,
        reason: String,
        analyst_notes: Option<String>,
        requested_at: MonotonicTimeNs,
        status: SubRequestStatus,
    ) -> Result<Self, ContractViolation> {
        let row = Self {
            schema_version: SUBREQUEST_CONTRACT_VERSION,
            request_id,
            document_name,
            reason,
            analyst_notes,
            requested_at,
            status,
        };
        row.validate()?;
        Ok(row)
    }
}

impl Validate for ReuploadRequestRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != SUBREQUEST_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "reupload_request.schema_version",
                reason: "must match SUBREQUEST_CONTRACT_VERSION",
            });
        }
        self.request_id.validate()?;
        validate_token("reupload_request.document_name", &self.document_name, 256)?;
        validate_token("reupload_request.reason", &self.reason, 2048)?;
        validate_opt_token("reupload_request.analyst_notes", &self.analyst_notes, 2048)?;
        if self.requested_at.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "reupload_request.requested_at",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

/// An analyst's demand for a document that was never part of the original
/// submission. Kept in place once provided, as the record of what was asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalDocumentRequestRecord {
    pub schema_version: SchemaVersion,
    pub request_id: SubRequestId,
    pub requirement: String,
    pub analyst_notes: String,
    pub requested_at: MonotonicTimeNs,
    pub status: SubRequestStatus,
}

impl AdditionalDocumentRequestRecord {
    pub fn v1(
        request_id: SubRequestId,
        requirement: String,
        analyst_notes: String,
        requested_at: MonotonicTimeNs,
        status: SubRequestStatus,
    ) -> Result<Self, ContractViolation> {
        let row = Self {
            schema_version: SUBREQUEST_CONTRACT_VERSION,
            request_id,
            requirement,
            analyst_notes,
            requested_at,
            status,
        };
        row.validate()?;
        Ok(row)
    }
}

impl Validate for AdditionalDocumentRequestRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != SUBREQUEST_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "additional_document_request.schema_version",
                reason: "must match SUBREQUEST_CONTRACT_VERSION",
            });
        }
        self.request_id.validate()?;
        validate_token(
            "additional_document_request.requirement",
            &self.requirement,
            2048,
        )?;
        validate_token(
            "additional_document_request.analyst_notes",
            &self.analyst_notes,
            2048,
        )?;
        if self.requested_at.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "additional_document_request.requested_at",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

/// Analyst command: open a re-upload sub-request against one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenReuploadRequest {
    pub now: MonotonicTimeNs,
    pub external_id: ExternalScriptId,
    pub document_name: String,
    pub reason: String,
    pub analyst_notes: Option<String>,
}

impl OpenReuploadRequest {
    pub fn v1(
        now: MonotonicTimeNs,
        external_id: ExternalScriptId,
        document_name: String,
        reason: String,
        analyst_notes: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            now,
            external_id,
            document_name,
            reason,
            analyst_notes,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for OpenReuploadRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "open_reupload_request.now",
                reason: "must be > 0",
            });
        }
        self.external_id.validate()?;
        validate_token(
            "open_reupload_request.document_name",
            &self.document_name,
            256,
        )?;
        validate_token("open_reupload_request.reason", &self.reason, 2048)?;
        validate_opt_token(
            "open_reupload_request.analyst_notes",
            &self.analyst_notes,
            2048,
        )?;
        Ok(())
    }
}

/// Vendor command: the demanded document has been uploaded again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorReuploadRequest {
    pub now: MonotonicTimeNs,
    pub external_id: ExternalScriptId,
    pub document_name: String,
}

impl VendorReuploadRequest {
    pub fn v1(
        now: MonotonicTimeNs,
        external_id: ExternalScriptId,
        document_name: String,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            now,
            external_id,
            document_name,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for VendorReuploadRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "vendor_reupload_request.now",
                reason: "must be > 0",
            });
        }
        self.external_id.validate()?;
        validate_token(
            "vendor_reupload_request.document_name",
            &self.document_name,
            256,
        )?;
        Ok(())
    }
}

/// Analyst command: the fresh upload is acceptable; consume the sub-request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveReuploadRequest {
    pub external_id: ExternalScriptId,
    pub document_name: String,
}

impl ApproveReuploadRequest {
    pub fn v1(
        external_id: ExternalScriptId,
        document_name: String,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            external_id,
            document_name,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for ApproveReuploadRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.external_id.validate()?;
        validate_token(
            "approve_reupload_request.document_name",
            &self.document_name,
            256,
        )?;
        Ok(())
    }
}

/// Analyst command: demand a document that was never submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAdditionalDocumentRequest {
    pub now: MonotonicTimeNs,
    pub external_id: ExternalScriptId,
    pub requirement: String,
    pub analyst_notes: String,
}

impl OpenAdditionalDocumentRequest {
    pub fn v1(
        now: MonotonicTimeNs,
        external_id: ExternalScriptId,
        requirement: String,
        analyst_notes: String,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            now,
            external_id,
            requirement,
            analyst_notes,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for OpenAdditionalDocumentRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "open_additional_document_request.now",
                reason: "must be > 0",
            });
        }
        self.external_id.validate()?;
        validate_token(
            "open_additional_document_request.requirement",
            &self.requirement,
            2048,
        )?;
        validate_token(
            "open_additional_document_request.analyst_notes",
            &self.analyst_notes,
            2048,
        )?;
        Ok(())
    }
}

/// Vendor command: the additionally requested document has been provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorAdditionalDocumentRequest {
    pub now: MonotonicTimeNs,
    pub external_id: ExternalScriptId,
    pub request_id: SubRequestId,
    pub file_name: String,
}

impl VendorAdditionalDocumentRequest {
    pub fn v1(
        now: MonotonicTimeNs,
        external_id: ExternalScriptId,
        request_id: SubRequestId,
        file_name: String,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            now,
            external_id,
            request_id,
            file_name,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for VendorAdditionalDocumentRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "vendor_additional_document_request.now",
                reason: "must be > 0",
            });
        }
        self.external_id.validate()?;
        self.request_id.validate()?;
        validate_token(
            "vendor_additional_document_request.file_name",
            &self.file_name,
            256,
        )?;
        Ok(())
    }
}
