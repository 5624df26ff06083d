#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::common::{validate_opt_token, validate_token};
use crate::script::{ScriptKind, ScriptStatus};
use crate::{ContractViolation, SchemaVersion, Validate};

pub const REVIEW_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Control Effectiveness Review id, e.g. "cer-10234".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CerId(String);

impl CerId {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for CerId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("cer_id", &self.0, 64)
    }
}

/// CER-scoped script id, e.g. "ts-2". Meaningful only within one CER's
/// listing; never shown to the vendor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScriptId(String);

impl ScriptId {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for ScriptId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("script_id", &self.0, 64)
    }
}

/// Globally unique test-script id, e.g. "TS-324473". The vendor-facing ledger
/// and the notification stream address scripts by this id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExternalScriptId(String);

impl ExternalScriptId {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for ExternalScriptId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("external_script_id", &self.0, 64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VendorName(String);

impl VendorName {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for VendorName {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("vendor_name", &self.0, 128)
    }
}

/// Viewpoint from which the ledger is observed and commanded. Persona
/// switching is pre-authorized upstream; the kernel only routes by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Persona {
    Analyst,
    Vendor,
    Manager,
}

impl Persona {
    pub fn as_str(self) -> &'static str {
        match self {
            Persona::Analyst => "analyst",
            Persona::Vendor => "vendor",
            Persona::Manager => "manager",
        }
    }
}

/// One test script as fixed at CER-definition time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSeed {
    pub script_id: ScriptId,
    pub external_id: ExternalScriptId,
    pub kind: ScriptKind,
    pub status: ScriptStatus,
    pub requirement_text: String,
    pub script_text: String,
    pub due_date: Option<String>,
    pub coq_request_text: Option<String>,
}

impl ScriptSeed {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        script_id: ScriptId,
        external_id: ExternalScriptId,
        kind: ScriptKind,
        status: ScriptStatus,
        requirement_text: String,
        script_text: String,
        due_date: Option<String>,
        coq_request_text: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let seed = Self {
            script_id,
            external_id,
            kind,
            status,
            requirement_text,
            script_text,
            due_date,
            coq_request_text,
        };
        seed.validate()?;
        Ok(seed)
    }
}

impl Validate for ScriptSeed {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.script_id.validate()?;
        self.external_id.validate()?;
        validate_token(
            "script_seed.requirement_text",
            &self.requirement_text,
            4096,
        )?;
        validate_token("script_seed.script_text", &self.script_text, 4096)?;
        validate_opt_token("script_seed.due_date", &self.due_date, 64)?;
        validate_opt_token(
            "script_seed.coq_request_text",
            &self.coq_request_text,
            4096,
        )?;
        if self.status == ScriptStatus::Approved {
            return Err(ContractViolation::InvalidValue {
                field: "script_seed.status",
                reason: "approved is a derived display state, never a seed status",
            });
        }
        Ok(())
    }
}

/// A CER's fixed script set plus the internal/external identity bijection,
/// installed once at definition time and never mutated by workflow actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CerDefinition {
    pub schema_version: SchemaVersion,
    pub cer_id: CerId,
    pub vendor_name: VendorName,
    pub scripts: Vec<ScriptSeed>,
}

impl CerDefinition {
    pub fn v1(
        cer_id: CerId,
        vendor_name: VendorName,
        scripts: Vec<ScriptSeed>,
    ) -> Result<Self, ContractViolation> {
        let def = Self {
            schema_version: REVIEW_CONTRACT_VERSION,
            cer_id,
            vendor_name,
            scripts,
        };
        def.validate()?;
        Ok(def)
    }
}

impl Validate for CerDefinition {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != REVIEW_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "cer_definition.schema_version",
                reason: "must match REVIEW_CONTRACT_VERSION",
            });
        }
        self.cer_id.validate()?;
        self.vendor_name.validate()?;
        if self.scripts.is_empty() {
            return Err(ContractViolation::EmptyCollection {
                field: "cer_definition.scripts",
            });
        }
        let mut internal_ids = BTreeSet::new();
        let mut external_ids = BTreeSet::new();
        for seed in &self.scripts {
            seed.validate()?;
            if !internal_ids.insert(seed.script_id.clone()) {
                return Err(ContractViolation::InvalidValue {
                    field: "cer_definition.scripts",
                    reason: "duplicate script_id breaks the identity bijection",
                });
            }
            if !external_ids.insert(seed.external_id.clone()) {
                return Err(ContractViolation::InvalidValue {
                    field: "cer_definition.scripts",
                    reason: "duplicate external_script_id breaks the identity bijection",
                });
            }
        }
        Ok(())
    }
}
