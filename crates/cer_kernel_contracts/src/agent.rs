#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use crate::review::{CerId, ScriptId};
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const AGENT_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// The single system-wide in-flight analysis run. One run at a time, across
/// all CERs; there is no cancellation and no timeout path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRunRecord {
    pub schema_version: SchemaVersion,
    pub cer_id: CerId,
    pub script_ids: Option<Vec<ScriptId>>,
    pub started_at: MonotonicTimeNs,
}

impl AgentRunRecord {
    pub fn v1(
        cer_id: CerId,
        script_ids: Option<Vec<ScriptId>>,
        started_at: MonotonicTimeNs,
    ) -> Result<Self, ContractViolation> {
        let row = Self {
            schema_version: AGENT_CONTRACT_VERSION,
            cer_id,
            script_ids,
            started_at,
        };
        row.validate()?;
        Ok(row)
    }
}

impl Validate for AgentRunRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != AGENT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "agent_run_record.schema_version",
                reason: "must match AGENT_CONTRACT_VERSION",
            });
        }
        self.cer_id.validate()?;
        validate_script_subset("agent_run_record.script_ids", &self.script_ids)?;
        if self.started_at.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "agent_run_record.started_at",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

/// Start an analysis run over a CER's full script set, or an explicit subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRunRequest {
    pub now: MonotonicTimeNs,
    pub cer_id: CerId,
    pub script_ids: Option<Vec<ScriptId>>,
}

impl StartRunRequest {
    pub fn v1(
        now: MonotonicTimeNs,
        cer_id: CerId,
        script_ids: Option<Vec<ScriptId>>,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            now,
            cer_id,
            script_ids,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for StartRunRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "start_run_request.now",
                reason: "must be > 0",
            });
        }
        self.cer_id.validate()?;
        validate_script_subset("start_run_request.script_ids", &self.script_ids)
    }
}

/// Completion signal of the analysis run: marks the full script set for the
/// CER, or only the given subset, as processed, and clears the in-flight flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteRunRequest {
    pub now: MonotonicTimeNs,
    pub cer_id: CerId,
    pub script_ids: Option<Vec<ScriptId>>,
}

impl CompleteRunRequest {
    pub fn v1(
        now: MonotonicTimeNs,
        cer_id: CerId,
        script_ids: Option<Vec<ScriptId>>,
    ) -> Result<Self, ContractViolation> {
        let req = Self {
            now,
            cer_id,
            script_ids,
        };
        req.validate()?;
        Ok(req)
    }
}

impl Validate for CompleteRunRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "complete_run_request.now",
                reason: "must be > 0",
            });
        }
        self.cer_id.validate()?;
        validate_script_subset("complete_run_request.script_ids", &self.script_ids)
    }
}

fn validate_script_subset(
    field: &'static str,
    script_ids: &Option<Vec<ScriptId>>,
) -> Result<(), ContractViolation> {
    let Some(ids) = script_ids else {
        return Ok(());
    };
    if ids.is_empty() {
        return Err(ContractViolation::EmptyCollection { field });
    }
    let mut seen = BTreeSet::new();
    for id in ids {
        id.validate()?;
        if !seen.insert(id.clone()) {
            return Err(ContractViolation::InvalidValue {
                field,
                reason: "must not repeat a script_id",
            });
        }
    }
    Ok(())
}
