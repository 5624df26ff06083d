#![forbid(unsafe_code)]

use cer_kernel_contracts::approval::{
    ApprovedVersionRecord, VersionHistoryEntry, VersionLabel, VersionStatus,
};
use cer_kernel_contracts::review::{
    CerDefinition, CerId, ExternalScriptId, ScriptId, ScriptSeed, VendorName,
};
use cer_kernel_contracts::script::{ScriptKind, ScriptStatus};
use cer_kernel_contracts::MonotonicTimeNs;
use cer_storage::repo::ApprovalVersionRepo;
use cer_storage::{ReviewStore, StorageError};
use serde_json::json;

fn seed_store() -> ReviewStore {
    let mut store = ReviewStore::new_in_memory();
    let definition = CerDefinition::v1(
        CerId::new("cer-10234").unwrap(),
        VendorName::new("Meridian Dynamics").unwrap(),
        vec![ScriptSeed::v1(
            ScriptId::new("ts-1").unwrap(),
            ExternalScriptId::new("TS-324473").unwrap(),
            ScriptKind::Coq,
            ScriptStatus::CoqResponded,
            "Expense approvals carry manager sign-off".to_string(),
            "Sample 25 expense reports; verify signature".to_string(),
            None,
            None,
        )
        .unwrap()],
    )
    .unwrap();
    store.register_cer(definition).unwrap();
    store
}

fn cer() -> CerId {
    CerId::new("cer-10234").unwrap()
}

fn script() -> ScriptId {
    ScriptId::new("ts-1").unwrap()
}

fn approved(t: u64, version: &str) -> ApprovedVersionRecord {
    ApprovedVersionRecord::v1(
        VersionLabel::new(version).unwrap(),
        MonotonicTimeNs(t),
        json!({"disposition": "effective"}),
        None,
    )
    .unwrap()
}

fn history(t: u64, version: &str, status: VersionStatus) -> VersionHistoryEntry {
    VersionHistoryEntry::v1(
        VersionLabel::new(version).unwrap(),
        MonotonicTimeNs(t),
        json!({"disposition": "effective", "confidence": 0.91}),
        status,
        None,
    )
    .unwrap()
}

#[test]
fn at_approval_ledger_db_01_pointer_upserts_per_key() {
    let mut store = seed_store();
    store
        .set_approved_row(&cer(), &script(), approved(10, "v1"))
        .unwrap();
    store
        .set_approved_row(&cer(), &script(), approved(20, "v2"))
        .unwrap();

    let live = store.approved_row(&cer(), &script()).expect("live approval");
    assert_eq!(live.version.as_str(), "v2");
    assert_eq!(live.approved_at, MonotonicTimeNs(20));
}

#[test]
fn at_approval_ledger_db_02_pointer_requires_a_registered_pair() {
    let mut store = seed_store();
    let out = store.set_approved_row(&cer(), &ScriptId::new("ts-99").unwrap(), approved(10, "v1"));
    assert!(matches!(
        out,
        Err(StorageError::ForeignKeyViolation {
            table: "approved_versions",
            ..
        })
    ));

    let out = store.append_version_history_row(
        &CerId::new("cer-other").unwrap(),
        &script(),
        history(10, "v1", VersionStatus::Generated),
    );
    assert!(matches!(
        out,
        Err(StorageError::ForeignKeyViolation {
            table: "version_history",
            ..
        })
    ));
}

#[test]
fn at_approval_ledger_db_03_remove_returns_the_record_and_empties_the_key() {
    let mut store = seed_store();
    store
        .set_approved_row(&cer(), &script(), approved(10, "v1"))
        .unwrap();

    let removed = store.remove_approved_row(&cer(), &script()).expect("removed");
    assert_eq!(removed.version.as_str(), "v1");
    assert!(store.approved_row(&cer(), &script()).is_none());
    assert!(store.remove_approved_row(&cer(), &script()).is_none());
}

#[test]
fn at_approval_ledger_db_04_history_appends_in_order_and_dedupes_by_label() {
    let mut store = seed_store();
    assert!(store
        .append_version_history_row(&cer(), &script(), history(10, "v1", VersionStatus::Generated))
        .unwrap());
    assert!(store
        .append_version_history_row(&cer(), &script(), history(20, "v2", VersionStatus::Generated))
        .unwrap());
    // Same label again, even with a different status: no-op, not an error.
    assert!(!store
        .append_version_history_row(&cer(), &script(), history(30, "v1", VersionStatus::Approved))
        .unwrap());

    let rows = store.version_history_rows(&cer(), &script());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].version.as_str(), "v1");
    assert_eq!(rows[0].created_at, MonotonicTimeNs(10));
    assert_eq!(rows[0].status, VersionStatus::Generated);
    assert_eq!(rows[1].version.as_str(), "v2");
}

#[test]
fn at_approval_ledger_db_05_unknown_key_reads_as_empty_history() {
    let store = seed_store();
    assert!(store
        .version_history_rows(&CerId::new("cer-other").unwrap(), &script())
        .is_empty());
    assert!(store
        .approved_row(&CerId::new("cer-other").unwrap(), &script())
        .is_none());
}
