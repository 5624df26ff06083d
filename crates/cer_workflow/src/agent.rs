#![forbid(unsafe_code)]

use cer_kernel_contracts::agent::{AgentRunRecord, CompleteRunRequest, StartRunRequest};
use cer_kernel_contracts::review::{CerId, ScriptId};
use cer_kernel_contracts::Validate;
use cer_storage::ReviewStore;

use crate::WorkflowError;

/// Single system-wide analysis-run flag. One run may be in flight across all
/// CERs; a second start fails with ConcurrentRun and writes nothing. The
/// processed set advances only on completion.
#[derive(Debug, Default, Clone)]
pub struct AgentRunCoordinator;

impl AgentRunCoordinator {
    /// Claims the in-flight flag for a run over the CER's full script set or
    /// an explicit subset. Subset ids must belong to the CER.
    pub fn start_run(
        store: &mut ReviewStore,
        req: &StartRunRequest,
    ) -> Result<(), WorkflowError> {
        req.validate()?;
        if let Some(running) = store.active_run_row() {
            return Err(WorkflowError::ConcurrentRun {
                running_cer: running.cer_id.clone(),
            });
        }
        require_subset(store, &req.cer_id, &req.script_ids)?;
        let record = AgentRunRecord::v1(req.cer_id.clone(), req.script_ids.clone(), req.now)?;
        store.set_active_run_row(record)?;
        Ok(())
    }

    /// Marks the run's scripts processed and releases the flag. Returns how
    /// many scripts were newly marked. The completion's CER must match the
    /// in-flight run; the subset recorded at start is advisory and the
    /// completion names its own.
    pub fn complete_run(
        store: &mut ReviewStore,
        req: &CompleteRunRequest,
    ) -> Result<usize, WorkflowError> {
        req.validate()?;
        let running = store.active_run_row().ok_or(WorkflowError::NotFound {
            entity: "agent_run",
            key: "none in flight".to_string(),
        })?;
        if running.cer_id != req.cer_id {
            return Err(WorkflowError::NotFound {
                entity: "agent_run",
                key: req.cer_id.as_str().to_string(),
            });
        }
        let to_mark: Vec<ScriptId> = match &req.script_ids {
            Some(ids) => ids.clone(),
            None => store
                .cer_script_ids(&req.cer_id)
                .map(<[ScriptId]>::to_vec)
                .unwrap_or_default(),
        };
        let marked = store.mark_processed(&req.cer_id, &to_mark)?;
        store.clear_active_run_row();
        Ok(marked)
    }

    pub fn is_running(store: &ReviewStore) -> bool {
        store.active_run_row().is_some()
    }

    pub fn running_cer(store: &ReviewStore) -> Option<&CerId> {
        store.active_run_row().map(|run| &run.cer_id)
    }
}

fn require_subset(
    store: &ReviewStore,
    cer_id: &CerId,
    script_ids: &Option<Vec<ScriptId>>,
) -> Result<(), WorkflowError> {
    let registered = store
        .cer_script_ids(cer_id)
        .ok_or_else(|| WorkflowError::NotFound {
            entity: "cer",
            key: cer_id.as_str().to_string(),
        })?;
    let Some(ids) = script_ids else {
        return Ok(());
    };
    for id in ids {
        if !registered.contains(id) {
            return Err(WorkflowError::NotFound {
                entity: "test_script",
                key: format!("{}/{}", cer_id.as_str(), id.as_str()),
            });
        }
    }
    Ok(())
}
