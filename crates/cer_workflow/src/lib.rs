#![forbid(unsafe_code)]

pub mod agent;
pub mod approval;
pub mod identity;
pub mod ledger;
pub mod notify;
pub mod subrequest;

use cer_kernel_contracts::review::CerId;
use cer_kernel_contracts::script::ScriptStatus;
use cer_kernel_contracts::ContractViolation;
use cer_storage::StorageError;

/// Operation-level failure taxonomy. Every workflow command returns one of
/// these as a typed value; the presentation layer decides how to surface it.
/// Nothing in the kernel retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Unknown external/internal id or unmapped CER. Lookups fail loudly;
    /// there is no fallback to a default CER.
    NotFound { entity: &'static str, key: String },
    /// An action attempted against a status that does not permit it.
    InvalidTransition {
        operation: &'static str,
        status: ScriptStatus,
    },
    /// A run was started while another run is still in flight.
    ConcurrentRun { running_cer: CerId },
    Storage(StorageError),
    Contract(ContractViolation),
}

impl From<StorageError> for WorkflowError {
    fn from(e: StorageError) -> Self {
        WorkflowError::Storage(e)
    }
}

impl From<ContractViolation> for WorkflowError {
    fn from(e: ContractViolation) -> Self {
        WorkflowError::Contract(e)
    }
}
