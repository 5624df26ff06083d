#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use cer_kernel_contracts::agent::AgentRunRecord;
use cer_kernel_contracts::approval::{ApprovedVersionRecord, VersionHistoryEntry};
use cer_kernel_contracts::notification::{Notification, NotificationBody, NotificationInput};
use cer_kernel_contracts::review::{CerDefinition, CerId, ExternalScriptId, ScriptId, VendorName};
use cer_kernel_contracts::script::{TestScriptRecord, SCRIPT_CONTRACT_VERSION};
use cer_kernel_contracts::{ContractViolation, Validate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    ForeignKeyViolation { table: &'static str, key: String },
    DuplicateKey { table: &'static str, key: String },
    ContractViolation(ContractViolation),
}

impl From<ContractViolation> for StorageError {
    fn from(v: ContractViolation) -> Self {
        StorageError::ContractViolation(v)
    }
}

/// The whole in-memory session state of the evidence-review kernel: script
/// ledger, identity bijections, notification stream, approval/version maps,
/// processed sets, and the single agent-run flag.
///
/// All mutation funnels through the workflow runtimes; callers never touch
/// record fields directly. `&mut` access is the serialization mechanism:
/// one exclusive borrow per top-level operation.
#[derive(Debug, Default)]
pub struct ReviewStore {
    cers: BTreeMap<CerId, VendorName>,
    scripts: BTreeMap<ExternalScriptId, TestScriptRecord>,
    // Registration order of each CER's scripts; fixed at definition time.
    script_order: BTreeMap<CerId, Vec<ScriptId>>,
    internal_to_external: BTreeMap<(CerId, ScriptId), ExternalScriptId>,
    external_to_internal: BTreeMap<ExternalScriptId, (CerId, ScriptId)>,

    // Newest first; list order is the display order.
    notifications: Vec<Notification>,
    next_notification_id: u64,

    approved: BTreeMap<(CerId, ScriptId), ApprovedVersionRecord>,
    version_history: BTreeMap<(CerId, ScriptId), Vec<VersionHistoryEntry>>,

    processed: BTreeMap<CerId, BTreeSet<ScriptId>>,
    active_run: Option<AgentRunRecord>,
}

impl ReviewStore {
    pub fn new_in_memory() -> Self {
        Self {
            next_notification_id: 1,
            ..Self::default()
        }
    }

    // ------------------------
    // CER registration + identity bijection
    // ------------------------

    /// Installs a CER's fixed script set and identity mapping. Scripts are
    /// created here and only here; workflow actions never create or delete
    /// them.
    pub fn register_cer(&mut self, definition: CerDefinition) -> Result<(), StorageError> {
        definition.validate()?;
        if self.cers.contains_key(&definition.cer_id) {
            return Err(StorageError::DuplicateKey {
                table: "cers",
                key: definition.cer_id.as_str().to_string(),
            });
        }
        for seed in &definition.scripts {
            if self.scripts.contains_key(&seed.external_id) {
                return Err(StorageError::DuplicateKey {
                    table: "test_scripts",
                    key: seed.external_id.as_str().to_string(),
                });
            }
        }

        let cer_id = definition.cer_id.clone();
        let mut order = Vec::with_capacity(definition.scripts.len());
        for seed in definition.scripts {
            let record = TestScriptRecord {
                schema_version: SCRIPT_CONTRACT_VERSION,
                external_id: seed.external_id.clone(),
                cer_id: cer_id.clone(),
                script_id: seed.script_id.clone(),
                vendor_name: definition.vendor_name.clone(),
                kind: seed.kind,
                status: seed.status,
                requirement_text: seed.requirement_text,
                script_text: seed.script_text,
                due_date: seed.due_date,
                coq_request_text: seed.coq_request_text,
                analyst_comment: None,
                supporting_evidence_note: None,
                final_conclusion: None,
                upload_history: Vec::new(),
                reupload_requests: Vec::new(),
                additional_document_requests: Vec::new(),
            };
            record.validate()?;
            self.internal_to_external.insert(
                (cer_id.clone(), seed.script_id.clone()),
                seed.external_id.clone(),
            );
            self.external_to_internal
                .insert(seed.external_id.clone(), (cer_id.clone(), seed.script_id.clone()));
            self.scripts.insert(seed.external_id, record);
            order.push(seed.script_id);
        }
        self.script_order.insert(cer_id.clone(), order);
        self.cers.insert(cer_id, definition.vendor_name);
        Ok(())
    }

    pub fn cer_vendor(&self, cer_id: &CerId) -> Option<&VendorName> {
        self.cers.get(cer_id)
    }

    pub fn external_id_row(
        &self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Option<&ExternalScriptId> {
        self.internal_to_external
            .get(&(cer_id.clone(), script_id.clone()))
    }

    pub fn internal_id_row(
        &self,
        external_id: &ExternalScriptId,
    ) -> Option<&(CerId, ScriptId)> {
        self.external_to_internal.get(external_id)
    }

    // ------------------------
    // Script ledger rows
    // ------------------------

    pub fn script_row(&self, external_id: &ExternalScriptId) -> Option<&TestScriptRecord> {
        self.scripts.get(external_id)
    }

    pub fn script_row_mut(
        &mut self,
        external_id: &ExternalScriptId,
    ) -> Option<&mut TestScriptRecord> {
        self.scripts.get_mut(external_id)
    }

    pub fn script_row_by_internal(
        &self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Option<&TestScriptRecord> {
        let external_id = self.external_id_row(cer_id, script_id)?;
        self.scripts.get(external_id)
    }

    /// A CER's scripts in registration order.
    pub fn cer_script_rows(&self, cer_id: &CerId) -> Vec<&TestScriptRecord> {
        let Some(order) = self.script_order.get(cer_id) else {
            return Vec::new();
        };
        order
            .iter()
            .filter_map(|script_id| self.script_row_by_internal(cer_id, script_id))
            .collect()
    }

    pub fn cer_script_ids(&self, cer_id: &CerId) -> Option<&[ScriptId]> {
        self.script_order.get(cer_id).map(Vec::as_slice)
    }

    // ------------------------
    // Notification stream
    // ------------------------

    /// Prepends a notification (newest first) and assigns its id.
    pub fn append_notification(
        &mut self,
        input: NotificationInput,
    ) -> Result<u64, StorageError> {
        if !self.scripts.contains_key(&input.external_id) {
            return Err(StorageError::ForeignKeyViolation {
                table: "notifications",
                key: input.external_id.as_str().to_string(),
            });
        }
        let notification_id = self.next_notification_id;
        let row = Notification::from_input_v1(notification_id, input)?;
        self.notifications.insert(0, row);
        self.next_notification_id += 1;
        Ok(notification_id)
    }

    /// Newest first; slice order is the display order.
    pub fn notification_rows(&self) -> &[Notification] {
        &self.notifications
    }

    /// Pure derived query; never cached.
    pub fn unread_notification_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }

    /// Idempotent. Returns false when the id is unknown (already-removed
    /// rows included).
    pub fn mark_notification_read(&mut self, notification_id: u64) -> bool {
        match self
            .notifications
            .iter_mut()
            .find(|n| n.notification_id == notification_id)
        {
            Some(row) => {
                row.is_read = true;
                true
            }
            None => false,
        }
    }

    /// Removes every `upload_needs_review` notification for the given
    /// script+document pair. Returns how many rows went away.
    pub fn clear_upload_review_notifications(
        &mut self,
        external_id: &ExternalScriptId,
        document_name: &str,
    ) -> usize {
        let before = self.notifications.len();
        self.notifications.retain(|n| {
            !(n.external_id == *external_id
                && matches!(
                    &n.body,
                    NotificationBody::UploadNeedsReview { document_name: d } if d == document_name
                ))
        });
        before - self.notifications.len()
    }

    // ------------------------
    // Approval + version history
    // ------------------------

    pub fn approved_row(
        &self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Option<&ApprovedVersionRecord> {
        self.approved.get(&(cer_id.clone(), script_id.clone()))
    }

    pub fn set_approved_row(
        &mut self,
        cer_id: &CerId,
        script_id: &ScriptId,
        record: ApprovedVersionRecord,
    ) -> Result<(), StorageError> {
        self.require_registered_pair(cer_id, script_id, "approved_versions")?;
        record.validate()?;
        self.approved
            .insert((cer_id.clone(), script_id.clone()), record);
        Ok(())
    }

    /// Deletes only the live approval pointer; version history stays intact.
    pub fn remove_approved_row(
        &mut self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Option<ApprovedVersionRecord> {
        self.approved.remove(&(cer_id.clone(), script_id.clone()))
    }

    pub fn version_history_rows(
        &self,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> &[VersionHistoryEntry] {
        self.version_history
            .get(&(cer_id.clone(), script_id.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append-only with dedupe by version label: returns false (and writes
    /// nothing) when the label is already present for the key.
    pub fn append_version_history_row(
        &mut self,
        cer_id: &CerId,
        script_id: &ScriptId,
        entry: VersionHistoryEntry,
    ) -> Result<bool, StorageError> {
        self.require_registered_pair(cer_id, script_id, "version_history")?;
        entry.validate()?;
        let rows = self
            .version_history
            .entry((cer_id.clone(), script_id.clone()))
            .or_default();
        if rows.iter().any(|row| row.version == entry.version) {
            return Ok(false);
        }
        rows.push(entry);
        Ok(true)
    }

    // ------------------------
    // Processed set + agent-run flag
    // ------------------------

    pub fn processed_rows(&self, cer_id: &CerId) -> Option<&BTreeSet<ScriptId>> {
        self.processed.get(cer_id)
    }

    pub fn is_processed(&self, cer_id: &CerId, script_id: &ScriptId) -> bool {
        self.processed
            .get(cer_id)
            .is_some_and(|set| set.contains(script_id))
    }

    pub fn mark_processed(
        &mut self,
        cer_id: &CerId,
        script_ids: &[ScriptId],
    ) -> Result<usize, StorageError> {
        for script_id in script_ids {
            self.require_registered_pair(cer_id, script_id, "processed_scripts")?;
        }
        let set = self.processed.entry(cer_id.clone()).or_default();
        let mut marked = 0;
        for script_id in script_ids {
            if set.insert(script_id.clone()) {
                marked += 1;
            }
        }
        Ok(marked)
    }

    pub fn active_run_row(&self) -> Option<&AgentRunRecord> {
        self.active_run.as_ref()
    }

    pub fn set_active_run_row(&mut self, record: AgentRunRecord) -> Result<(), StorageError> {
        record.validate()?;
        if let Some(running) = &self.active_run {
            return Err(StorageError::DuplicateKey {
                table: "agent_runs",
                key: running.cer_id.as_str().to_string(),
            });
        }
        if !self.cers.contains_key(&record.cer_id) {
            return Err(StorageError::ForeignKeyViolation {
                table: "agent_runs",
                key: record.cer_id.as_str().to_string(),
            });
        }
        self.active_run = Some(record);
        Ok(())
    }

    pub fn clear_active_run_row(&mut self) -> Option<AgentRunRecord> {
        self.active_run.take()
    }

    fn require_registered_pair(
        &self,
        cer_id: &CerId,
        script_id: &ScriptId,
        table: &'static str,
    ) -> Result<(), StorageError> {
        if self.external_id_row(cer_id, script_id).is_none() {
            return Err(StorageError::ForeignKeyViolation {
                table,
                key: format!("{}/{}", cer_id.as_str(), script_id.as_str()),
            });
        }
        Ok(())
    }
}
