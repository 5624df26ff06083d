#![forbid(unsafe_code)]

use cer_kernel_contracts::review::{CerId, ExternalScriptId, ScriptId};
use cer_storage::ReviewStore;

use crate::WorkflowError;

/// Bidirectional translation between a CER-scoped script id and the global
/// external test-script id. The mapping is fixed at CER registration;
/// unregistered lookups fail with NotFound instead of falling back to a
/// default CER.
#[derive(Debug, Default, Clone)]
pub struct IdentityMapper;

impl IdentityMapper {
    pub fn to_external(
        store: &ReviewStore,
        cer_id: &CerId,
        script_id: &ScriptId,
    ) -> Result<ExternalScriptId, WorkflowError> {
        store
            .external_id_row(cer_id, script_id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "identity_mapping",
                key: format!("{}/{}", cer_id.as_str(), script_id.as_str()),
            })
    }

    pub fn to_internal(
        store: &ReviewStore,
        cer_id: &CerId,
        external_id: &ExternalScriptId,
    ) -> Result<ScriptId, WorkflowError> {
        match store.internal_id_row(external_id) {
            Some((mapped_cer, script_id)) if mapped_cer == cer_id => Ok(script_id.clone()),
            _ => Err(WorkflowError::NotFound {
                entity: "identity_mapping",
                key: format!("{}/{}", cer_id.as_str(), external_id.as_str()),
            }),
        }
    }

    /// Global lookup for notification routing: which (CER, internal id) an
    /// external id belongs to.
    pub fn resolve_external(
        store: &ReviewStore,
        external_id: &ExternalScriptId,
    ) -> Result<(CerId, ScriptId), WorkflowError> {
        store
            .internal_id_row(external_id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "identity_mapping",
                key: external_id.as_str().to_string(),
            })
    }
}
