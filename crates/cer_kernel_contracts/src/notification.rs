#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::common::validate_token;
use crate::review::{CerId, ExternalScriptId, Persona, VendorName};
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const NOTIFICATION_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Kind-specific payload of one notification. A tagged sum so each kind
/// carries only the fields it needs, instead of one wide optional-field row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationBody {
    VendorSubmission {
        file_count: usize,
        needs_approval: bool,
    },
    ActionItemCreated,
    UploadNeedsReview {
        document_name: String,
    },
    ReuploadRequested {
        document_name: String,
        reason: String,
    },
    AdditionalDocumentRequested {
        requirement: String,
    },
}

impl NotificationBody {
    pub fn kind_str(&self) -> &'static str {
        match self {
            NotificationBody::VendorSubmission { .. } => "vendor_submission",
            NotificationBody::ActionItemCreated => "action_item_created",
            NotificationBody::UploadNeedsReview { .. } => "upload_needs_review",
            NotificationBody::ReuploadRequested { .. } => "reupload_requested",
            NotificationBody::AdditionalDocumentRequested { .. } => {
                "additional_document_requested"
            }
        }
    }

    /// Which persona's view the notification routes to.
    pub fn routes_to(&self) -> Persona {
        match self {
            NotificationBody::VendorSubmission { .. }
            | NotificationBody::UploadNeedsReview { .. } => Persona::Analyst,
            NotificationBody::ActionItemCreated
            | NotificationBody::ReuploadRequested { .. }
            | NotificationBody::AdditionalDocumentRequested { .. } => Persona::Vendor,
        }
    }
}

impl Validate for NotificationBody {
    fn validate(&self) -> Result<(), ContractViolation> {
        match self {
            NotificationBody::VendorSubmission { file_count, .. } => {
                if *file_count == 0 {
                    return Err(ContractViolation::InvalidValue {
                        field: "notification_body.file_count",
                        reason: "must be > 0",
                    });
                }
            }
            NotificationBody::ActionItemCreated => {}
            NotificationBody::UploadNeedsReview { document_name } => {
                validate_token("notification_body.document_name", document_name, 256)?;
            }
            NotificationBody::ReuploadRequested {
                document_name,
                reason,
            } => {
                validate_token("notification_body.document_name", document_name, 256)?;
                validate_token("notification_body.reason", reason, 2048)?;
            }
            NotificationBody::AdditionalDocumentRequested { requirement } => {
                validate_token("notification_body.requirement", requirement, 2048)?;
            }
        }
        Ok(())
    }
}

/// Notification as handed to the store; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationInput {
    pub schema_version: SchemaVersion,
    pub created_at: MonotonicTimeNs,
    pub external_id: ExternalScriptId,
    pub cer_id: Option<CerId>,
    pub vendor_name: Option<VendorName>,
    pub message: String,
    pub body: NotificationBody,
}

impl NotificationInput {
    pub fn v1(
        created_at: MonotonicTimeNs,
        external_id: ExternalScriptId,
        cer_id: Option<CerId>,
        vendor_name: Option<VendorName>,
        message: String,
        body: NotificationBody,
    ) -> Result<Self, ContractViolation> {
        let input = Self {
            schema_version: NOTIFICATION_CONTRACT_VERSION,
            created_at,
            external_id,
            cer_id,
            vendor_name,
            message,
            body,
        };
        input.validate()?;
        Ok(input)
    }
}

impl Validate for NotificationInput {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != NOTIFICATION_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "notification_input.schema_version",
                reason: "must match NOTIFICATION_CONTRACT_VERSION",
            });
        }
        if self.created_at.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "notification_input.created_at",
                reason: "must be > 0",
            });
        }
        self.external_id.validate()?;
        if let Some(cer_id) = &self.cer_id {
            cer_id.validate()?;
        }
        if let Some(vendor_name) = &self.vendor_name {
            vendor_name.validate()?;
        }
        validate_token("notification_input.message", &self.message, 1024)?;
        self.body.validate()
    }
}

/// One stored notification. `is_read` is the only field ever mutated; rows
/// are otherwise removed only when the condition they report is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub schema_version: SchemaVersion,
    pub notification_id: u64,
    pub created_at: MonotonicTimeNs,
    pub external_id: ExternalScriptId,
    pub cer_id: Option<CerId>,
    pub vendor_name: Option<VendorName>,
    pub message: String,
    pub is_read: bool,
    pub body: NotificationBody,
}

impl Notification {
    pub fn from_input_v1(
        notification_id: u64,
        input: NotificationInput,
    ) -> Result<Self, ContractViolation> {
        input.validate()?;
        let row = Self {
            schema_version: NOTIFICATION_CONTRACT_VERSION,
            notification_id,
            created_at: input.created_at,
            external_id: input.external_id,
            cer_id: input.cer_id,
            vendor_name: input.vendor_name,
            message: input.message,
            is_read: false,
            body: input.body,
        };
        row.validate()?;
        Ok(row)
    }
}

impl Validate for Notification {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != NOTIFICATION_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "notification.schema_version",
                reason: "must match NOTIFICATION_CONTRACT_VERSION",
            });
        }
        if self.notification_id == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "notification.notification_id",
                reason: "must be > 0",
            });
        }
        if self.created_at.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "notification.created_at",
                reason: "must be > 0",
            });
        }
        self.external_id.validate()?;
        if let Some(cer_id) = &self.cer_id {
            cer_id.validate()?;
        }
        if let Some(vendor_name) = &self.vendor_name {
            vendor_name.validate()?;
        }
        validate_token("notification.message", &self.message, 1024)?;
        self.body.validate()
    }
}
