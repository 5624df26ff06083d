#![forbid(unsafe_code)]

use cer_kernel_contracts::approval::{
    ApproveScriptRequest, ApprovedVersionRecord, RecordVersionRequest, VersionHistoryEntry,
    VersionStatus,
};
use cer_kernel_contracts::review::{CerId, ScriptId};
use cer_kernel_contracts::Validate;
use cer_storage::ReviewStore;

use crate::WorkflowError;

/// Approval pointer + append-only version history for each (cer, script) key.
/// Two separate facts: what was ever generated (history, immutable) and what
/// is currently approved (pointer, deletable).
#[derive(Debug, Default, Clone)]
pub struct ApprovalLedger;

impl ApprovalLedger {
    /// Append-only with dedupe by version label; the history is the single
    /// source of truth for "has this exact version already been generated".
    /// Returns false when the label was already present (no-op, not an error).
    pub fn record_version(
        store: &mut ReviewStore,
        req: &RecordVersionRequest,
    ) -> Result<bool, WorkflowError> {
        req.validate()?;
        let entry = VersionHistoryEntry::v1(
            req.version.clone(),
            req.now,
            req.analysis_data.clone(),
            req.status,
            req.human_insight.clone(),
        )?;
        Ok(store.append_version_history_row(&req.cer_id, &req.script_id, entry)?)
    }

    /// Writes the live approval pointer and the matching history entry. The
    /// script's own ledger status is deliberately untouched: "Approved" as a
    /// displayed state is derived from this store, not written into the
    /// status field.
    pub fn approve(
        store: &mut ReviewStore,
        req: &ApproveScriptRequest,
    ) -> Result<(), WorkflowError> {
        req.validate()?;
        let approved = ApprovedVersionRecord::v1(
            req.version.clone(),
            req.now,
            req.analysis_data.clone(),
            req.human_insight.clone(),
        )?;
        store.set_approved_row(&req.cer_id, &req.script_id, approved)?;

        let entry = VersionHistoryEntry::v1(
            req.version.clone(),
            req.now,
            req.analysis_data.clone(),
            VersionStatus::Approved,
            req.human_insight.clone(),
        )?;
        store.append_version_history_row(&req.cer_id, &req.script_id, entry)?;
        Ok(())
    }

    /// Deletes the current approval pointer only. History is never deleted.
    pub fn invalidate(
        store: &mut ReviewStore,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Option<ApprovedVersionRecord> {
        store.remove_approved_row(cer_id, script_id)
    }
}
