#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use cer_kernel_contracts::agent::AgentRunRecord;
use cer_kernel_contracts::approval::{ApprovedVersionRecord, VersionHistoryEntry};
use cer_kernel_contracts::notification::{Notification, NotificationInput};
use cer_kernel_contracts::review::{CerDefinition, CerId, ExternalScriptId, ScriptId};
use cer_kernel_contracts::script::TestScriptRecord;

use crate::store::{ReviewStore, StorageError};

/// Typed repository interface for the script ledger and the per-CER identity
/// bijection.
pub trait ScriptLedgerRepo {
    fn register_cer_rows(&mut self, definition: CerDefinition) -> Result<(), StorageError>;
    fn script_row(&self, external_id: &ExternalScriptId) -> Option<&TestScriptRecord>;
    fn script_row_by_internal(
        &self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Option<&TestScriptRecord>;
    fn cer_script_rows(&self, cer_id: &CerId) -> Vec<&TestScriptRecord>;
    fn external_id_row(&self, cer_id: &CerId, script_id: &ScriptId)
        -> Option<&ExternalScriptId>;
    fn internal_id_row(&self, external_id: &ExternalScriptId) -> Option<&(CerId, ScriptId)>;
}

/// Typed repository interface for the notification stream.
pub trait NotificationRepo {
    fn append_notification_row(&mut self, input: NotificationInput) -> Result<u64, StorageError>;
    fn notification_rows(&self) -> &[Notification];
    fn unread_notification_count(&self) -> usize;
    fn mark_notification_read_row(&mut self, notification_id: u64) -> bool;
    fn clear_upload_review_rows(
        &mut self,
        external_id: &ExternalScriptId,
        document_name: &str,
    ) -> usize;
}

/// Typed repository interface for the approval pointer and the append-only
/// version history.
pub trait ApprovalVersionRepo {
    fn approved_row(&self, cer_id: &CerId, script_id: &ScriptId)
        -> Option<&ApprovedVersionRecord>;
    fn set_approved_row(
        &mut self,
        cer_id: &CerId,
        script_id: &ScriptId,
        record: ApprovedVersionRecord,
    ) -> Result<(), StorageError>;
    fn remove_approved_row(
        &mut self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Option<ApprovedVersionRecord>;
    fn version_history_rows(
        &self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> &[VersionHistoryEntry];
    fn append_version_history_row(
        &mut self,
        cer_id: &CerId,
        script_id: &ScriptId,
        entry: VersionHistoryEntry,
    ) -> Result<bool, StorageError>;
}

/// Typed repository interface for the processed set and the single agent-run
/// flag.
pub trait AgentRunRepo {
    fn active_run_row(&self) -> Option<&AgentRunRecord>;
    fn set_active_run_row(&mut self, record: AgentRunRecord) -> Result<(), StorageError>;
    fn clear_active_run_row(&mut self) -> Option<AgentRunRecord>;
    fn processed_rows(&self, cer_id: &CerId) -> Option<&BTreeSet<ScriptId>>;
    fn mark_processed_rows(
        &mut self,
        cer_id: &CerId,
        script_ids: &[ScriptId],
    ) -> Result<usize, StorageError>;
}

impl ScriptLedgerRepo for ReviewStore {
    fn register_cer_rows(&mut self, definition: CerDefinition) -> Result<(), StorageError> {
        self.register_cer(definition)
    }

    fn script_row(&self, external_id: &ExternalScriptId) -> Option<&TestScriptRecord> {
        ReviewStore::script_row(self, external_id)
    }

    fn script_row_by_internal(
        &self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Option<&TestScriptRecord> {
        ReviewStore::script_row_by_internal(self, cer_id, script_id)
    }

    fn cer_script_rows(&self, cer_id: &CerId) -> Vec<&TestScriptRecord> {
        ReviewStore::cer_script_rows(self, cer_id)
    }

    fn external_id_row(
        &self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Option<&ExternalScriptId> {
        ReviewStore::external_id_row(self, cer_id, script_id)
    }

    fn internal_id_row(&self, external_id: &ExternalScriptId) -> Option<&(CerId, ScriptId)> {
        ReviewStore::internal_id_row(self, external_id)
    }
}

impl NotificationRepo for ReviewStore {
    fn append_notification_row(&mut self, input: NotificationInput) -> Result<u64, StorageError> {
        self.append_notification(input)
    }

    fn notification_rows(&self) -> &[Notification] {
        ReviewStore::notification_rows(self)
    }

    fn unread_notification_count(&self) -> usize {
        ReviewStore::unread_notification_count(self)
    }

    fn mark_notification_read_row(&mut self, notification_id: u64) -> bool {
        self.mark_notification_read(notification_id)
    }

    fn clear_upload_review_rows(
        &mut self,
        external_id: &ExternalScriptId,
        document_name: &str,
    ) -> usize {
        self.clear_upload_review_notifications(external_id, document_name)
    }
}

impl ApprovalVersionRepo for ReviewStore {
    fn approved_row(
        &self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Option<&ApprovedVersionRecord> {
        ReviewStore::approved_row(self, cer_id, script_id)
    }

    fn set_approved_row(
        &mut self,
        cer_id: &CerId,
        script_id: &ScriptId,
        record: ApprovedVersionRecord,
    ) -> Result<(), StorageError> {
        ReviewStore::set_approved_row(self, cer_id, script_id, record)
    }

    fn remove_approved_row(
        &mut self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Option<ApprovedVersionRecord> {
        ReviewStore::remove_approved_row(self, cer_id, script_id)
    }

    fn version_history_rows(
        &self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> &[VersionHistoryEntry] {
        ReviewStore::version_history_rows(self, cer_id, script_id)
    }

    fn append_version_history_row(
        &mut self,
        cer_id: &CerId,
        script_id: &ScriptId,
        entry: VersionHistoryEntry,
    ) -> Result<bool, StorageError> {
        ReviewStore::append_version_history_row(self, cer_id, script_id, entry)
    }
}

impl AgentRunRepo for ReviewStore {
    fn active_run_row(&self) -> Option<&AgentRunRecord> {
        ReviewStore::active_run_row(self)
    }

    fn set_active_run_row(&mut self, record: AgentRunRecord) -> Result<(), StorageError> {
        ReviewStore::set_active_run_row(self, record)
    }

    fn clear_active_run_row(&mut self) -> Option<AgentRunRecord> {
        ReviewStore::clear_active_run_row(self)
    }

    fn processed_rows(&self, cer_id: &CerId) -> Option<&BTreeSet<ScriptId>> {
        ReviewStore::processed_rows(self, cer_id)
    }

    fn mark_processed_rows(
        &mut self,
        cer_id: &CerId,
        script_ids: &[ScriptId],
    ) -> Result<usize, StorageError> {
        self.mark_processed(cer_id, script_ids)
    }
}
