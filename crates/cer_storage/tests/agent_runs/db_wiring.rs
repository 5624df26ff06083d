#![forbid(unsafe_code)]

use cer_kernel_contracts::agent::AgentRunRecord;
use cer_kernel_contracts::review::{
    CerDefinition, CerId, ExternalScriptId, ScriptId, ScriptSeed, VendorName,
};
use cer_kernel_contracts::script::{ScriptKind, ScriptStatus};
use cer_kernel_contracts::MonotonicTimeNs;
use cer_storage::repo::AgentRunRepo;
use cer_storage::{ReviewStore, StorageError};

fn seed_store() -> ReviewStore {
    let mut store = ReviewStore::new_in_memory();
    let definition = CerDefinition::v1(
        CerId::new("cer-10234").unwrap(),
        VendorName::new("Meridian Dynamics").unwrap(),
        vec![
            ScriptSeed::v1(
                ScriptId::new("ts-1").unwrap(),
                ExternalScriptId::new("TS-324473").unwrap(),
                ScriptKind::Coq,
                ScriptStatus::CoqResponded,
                "Expense approvals carry manager sign-off".to_string(),
                "Sample 25 expense reports; verify signature".to_string(),
                None,
                None,
            )
            .unwrap(),
            ScriptSeed::v1(
                ScriptId::new("ts-2").unwrap(),
                ExternalScriptId::new("TS-884512").unwrap(),
                ScriptKind::Coq,
                ScriptStatus::CoqResponded,
                "Access reviews run quarterly".to_string(),
                "Pull the latest access review evidence".to_string(),
                None,
                None,
            )
            .unwrap(),
        ],
    )
    .unwrap();
    store.register_cer(definition).unwrap();
    store
}

fn cer() -> CerId {
    CerId::new("cer-10234").unwrap()
}

fn script(id: &str) -> ScriptId {
    ScriptId::new(id).unwrap()
}

fn run(t: u64, cer: &str) -> AgentRunRecord {
    AgentRunRecord::v1(CerId::new(cer).unwrap(), None, MonotonicTimeNs(t)).unwrap()
}

#[test]
fn at_agent_runs_db_01_flag_is_exclusive_until_cleared() {
    let mut store = seed_store();
    assert!(store.active_run_row().is_none());

    store.set_active_run_row(run(10, "cer-10234")).unwrap();
    assert_eq!(
        store.active_run_row().map(|r| r.cer_id.as_str()),
        Some("cer-10234")
    );

    let out = store.set_active_run_row(run(11, "cer-10234"));
    assert!(matches!(
        out,
        Err(StorageError::DuplicateKey {
            table: "agent_runs",
            ..
        })
    ));

    let released = store.clear_active_run_row().expect("was running");
    assert_eq!(released.started_at, MonotonicTimeNs(10));
    assert!(store.active_run_row().is_none());
    store.set_active_run_row(run(20, "cer-10234")).unwrap();
}

#[test]
fn at_agent_runs_db_02_flag_requires_a_registered_cer() {
    let mut store = seed_store();
    let out = store.set_active_run_row(run(10, "cer-unknown"));
    assert!(matches!(
        out,
        Err(StorageError::ForeignKeyViolation {
            table: "agent_runs",
            ..
        })
    ));
    assert!(store.active_run_row().is_none());
}

#[test]
fn at_agent_runs_db_03_processed_marking_counts_only_new_rows() {
    let mut store = seed_store();
    assert!(store.processed_rows(&cer()).is_none());

    let marked = store
        .mark_processed_rows(&cer(), &[script("ts-1"), script("ts-2")])
        .unwrap();
    assert_eq!(marked, 2);

    // Re-marking an already processed script is a silent no-op.
    let marked = store
        .mark_processed_rows(&cer(), &[script("ts-1")])
        .unwrap();
    assert_eq!(marked, 0);

    let set = store.processed_rows(&cer()).expect("processed set");
    assert_eq!(set.len(), 2);
    assert!(set.contains(&script("ts-1")));
    assert!(set.contains(&script("ts-2")));
}

#[test]
fn at_agent_runs_db_04_processed_marking_rejects_unregistered_pairs_atomically() {
    let mut store = seed_store();
    let out = store.mark_processed_rows(&cer(), &[script("ts-1"), script("ts-99")]);
    assert!(matches!(
        out,
        Err(StorageError::ForeignKeyViolation {
            table: "processed_scripts",
            ..
        })
    ));
    // Checked before any write: ts-1 is not marked either.
    assert!(store.processed_rows(&cer()).is_none());
}
