#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{validate_opt_token, validate_token};
use crate::review::{CerId, ScriptId};
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const APPROVAL_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Analysis version label, e.g. "v3". Deduped per (cer, script) key: the
/// version-history list never carries the same label twice.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionLabel(String);

impl VersionLabel {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for VersionLabel {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("version_label", &self.0, 64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionStatus {
    Generated,
    Approved,
}

impl VersionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VersionStatus::Generated => "generated",
            VersionStatus::Approved => "approved",
        }
    }
}

/// The one currently approved analysis version for a (cer, script) key.
/// Deleted outright when a new sub-request invalidates the approval; the
/// version history is never touched by that deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedVersionRecord {
    pub schema_version: SchemaVersion,
    pub version: VersionLabel,
    pub approved_at: MonotonicTimeNs,
    pub approved_data: Value,
    pub human_insight: Option<String>,
}

impl ApprovedVersionRecord {
    pub fn v1(
        version: VersionLabel,
        approved_at: MonotonicTimeNs,
        approved_data: Value,
        human_insight: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let row = Self {
            schema_version: APPROVAL_CONTRACT_VERSION,
            version,
            approved_at,
            approved_data,
            human_insight,
        };
        row.validate()?;
        Ok(row)
    }
}

impl Validate for ApprovedVersionRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != APPROVAL_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "approved_version.schema_version",
                reason: "must match APPROVAL_CONTRACT_VERSION",
            });
        }
        self.version.validate()?;
        if self.approved_at.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "approved_version.approved_at",
                reason: "must be > 0",
            });
        }
        validate_opt_token(
            "approved_version.human_insight",
            &self.human_insight,
            4096,
        )?;
        Ok(())
    }
}

/// One row of a (cer, script) key's version history. Append-only; rows are
/// immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionHistoryEntry {
    pub schema_version: SchemaVersion,
    pub version: VersionLabel,
    pub created_at: MonotonicTimeNs,
    pub analysis_data: Value,
    pub status: VersionStatus,
    pub human_insight: Option<String>,
}

impl VersionHistoryEntry {
    pub fn v1(
        version: VersionLabel,
        created_at: MonotonicTimeNs,
        analysis_data: Value,
        status: VersionStatus,
        human_insight: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let row = Self {
            schema_version: APPROVAL_CONTRACT_VERSION,
            version,
            created_at,
            analysis_data,
            status,
            human_insight,
        };
        row.validate()?;
        Ok(row)
    }
}

impl Validate for VersionHistoryEntry {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != APPROVAL_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "version_history_entry.schema_version",
                reason: "must match APPROVAL_CONTRACT_VERSION",
            });
        }
        self.version.validate()?;
        if self.created_at.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "version_history_entry.created_at",
                reason: "must be > 0",
            });
        }
        validate_opt_token(
            "version_history_entry.human_insight",
            &self.human_insight,
            4096,
        )?;
        Ok(())
    }
}

/// Record a generated (or approved) analysis version into the per-key
/// history. Idempotent per version label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordVersionRequest {
    pub now: MonotonicTimeNs,
    pub cer_id: CerId,
    pub script_id: ScriptId,
    pub version: VersionLabel,
    pub analysis_data: Value,
    pub status: VersionStatus,
    pub human_insight: Option<String>,
}

impl RecordVersionRequest {
    pub fn v1(
        now: MonotonicTimeNs,
        cer_id: CerId,
        script_id: ScriptId,
        version: VersionLabel,
        analysis_data: Value,
        status: VersionStatus,
        human_insight: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            now,
            cer_id,
            script_id,
            version,
            analysis_data,
            status,
            human_insight,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for RecordVersionRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "record_version_request.now",
                reason: "must be > 0",
            });
        }
        self.cer_id.validate()?;
        self.script_id.validate()?;
        self.version.validate()?;
        validate_opt_token(
            "record_version_request.human_insight",
            &self.human_insight,
            4096,
        )?;
        Ok(())
    }
}

/// Analyst command: approve one analysis version for a (cer, script) key.
/// Approval lives beside the ledger status, never inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveScriptRequest {
    pub now: MonotonicTimeNs,
    pub cer_id: CerId,
    pub script_id: ScriptId,
    pub version: VersionLabel,
    pub analysis_data: Value,
    pub human_insight: Option<String>,
}

impl ApproveScriptRequest {
    pub fn v1(
        now: MonotonicTimeNs,
        cer_id: CerId,
        script_id: ScriptId,
        version: VersionLabel,
        analysis_data: Value,
        human_insight: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            now,
            cer_id,
            script_id,
            version,
            analysis_data,
            human_insight,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for ApproveScriptRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "approve_script_request.now",
                reason: "must be > 0",
            });
        }
        self.cer_id.validate()?;
        self.script_id.validate()?;
        self.version.validate()?;
        validate_opt_token(
            "approve_script_request.human_insight",
            &self.human_insight,
            4096,
        )?;
        Ok(())
    }
}
