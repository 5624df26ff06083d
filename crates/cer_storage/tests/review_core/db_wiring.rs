#![forbid(unsafe_code)]

use cer_kernel_contracts::review::{
    CerDefinition, CerId, ExternalScriptId, ScriptId, ScriptSeed, VendorName,
};
use cer_kernel_contracts::script::{ScriptKind, ScriptStatus};
use cer_storage::repo::ScriptLedgerRepo;
use cer_storage::{ReviewStore, StorageError};

fn seed(external: &str, internal: &str, objective: &str) -> ScriptSeed {
    ScriptSeed::v1(
        ScriptId::new(internal).unwrap(),
        ExternalScriptId::new(external).unwrap(),
        ScriptKind::Coq,
        ScriptStatus::CoqRequested,
        objective.to_string(),
        "Sample and verify".to_string(),
        None,
        None,
    )
    .unwrap()
}

fn definition(cer: &str, vendor: &str, scripts: Vec<ScriptSeed>) -> CerDefinition {
    CerDefinition::v1(
        CerId::new(cer).unwrap(),
        VendorName::new(vendor).unwrap(),
        scripts,
    )
    .unwrap()
}

#[test]
fn at_review_core_db_01_register_installs_rows_and_both_id_directions() {
    let mut store = ReviewStore::new_in_memory();
    store
        .register_cer_rows(definition(
            "cer-10234",
            "Meridian Dynamics",
            vec![
                seed("TS-324473", "ts-1", "Expense approvals carry manager sign-off"),
                seed("TS-884512", "ts-2", "Access reviews run quarterly"),
            ],
        ))
        .unwrap();

    let cer = CerId::new("cer-10234").unwrap();
    let row = store
        .script_row(&ExternalScriptId::new("TS-324473").unwrap())
        .expect("registered script");
    assert_eq!(row.cer_id, cer);
    assert_eq!(row.script_id.as_str(), "ts-1");
    assert_eq!(row.vendor_name.as_str(), "Meridian Dynamics");
    assert_eq!(row.status, ScriptStatus::CoqRequested);
    assert!(row.upload_history.is_empty());

    let external = store
        .external_id_row(&cer, &ScriptId::new("ts-2").unwrap())
        .expect("forward mapping");
    assert_eq!(external.as_str(), "TS-884512");
    let (mapped_cer, mapped_script) = store
        .internal_id_row(&ExternalScriptId::new("TS-884512").unwrap())
        .expect("reverse mapping");
    assert_eq!(mapped_cer, &cer);
    assert_eq!(mapped_script.as_str(), "ts-2");
}

#[test]
fn at_review_core_db_02_script_rows_come_back_in_registration_order() {
    let mut store = ReviewStore::new_in_memory();
    store
        .register_cer_rows(definition(
            "cer-10234",
            "Meridian Dynamics",
            vec![
                seed("TS-900001", "ts-9", "Backups restore within four hours"),
                seed("TS-100002", "ts-1", "Expense approvals carry manager sign-off"),
                seed("TS-500003", "ts-5", "Access reviews run quarterly"),
            ],
        ))
        .unwrap();

    let rows = store.cer_script_rows(&CerId::new("cer-10234").unwrap());
    let ids: Vec<&str> = rows.iter().map(|r| r.script_id.as_str()).collect();
    // Registration order, not the map's key order.
    assert_eq!(ids, vec!["ts-9", "ts-1", "ts-5"]);
}

#[test]
fn at_review_core_db_03_duplicate_cer_id_is_rejected() {
    let mut store = ReviewStore::new_in_memory();
    store
        .register_cer_rows(definition(
            "cer-10234",
            "Meridian Dynamics",
            vec![seed("TS-324473", "ts-1", "Expense approvals carry manager sign-off")],
        ))
        .unwrap();

    let out = store.register_cer_rows(definition(
        "cer-10234",
        "Meridian Dynamics",
        vec![seed("TS-999999", "ts-1", "Change tickets carry peer review")],
    ));
    assert!(matches!(
        out,
        Err(StorageError::DuplicateKey { table: "cers", .. })
    ));
}

#[test]
fn at_review_core_db_04_external_id_is_globally_unique_across_cers() {
    let mut store = ReviewStore::new_in_memory();
    store
        .register_cer_rows(definition(
            "cer-10234",
            "Meridian Dynamics",
            vec![seed("TS-324473", "ts-1", "Expense approvals carry manager sign-off")],
        ))
        .unwrap();

    // Same internal id in another CER is fine; same external id is not.
    let out = store.register_cer_rows(definition(
        "cer-20555",
        "Northwind Audit",
        vec![seed("TS-324473", "ts-1", "Change tickets carry peer review")],
    ));
    assert!(matches!(
        out,
        Err(StorageError::DuplicateKey {
            table: "test_scripts",
            ..
        })
    ));
    assert!(store.cer_vendor(&CerId::new("cer-20555").unwrap()).is_none());
}

#[test]
fn at_review_core_db_05_same_internal_id_maps_per_cer() {
    let mut store = ReviewStore::new_in_memory();
    store
        .register_cer_rows(definition(
            "cer-10234",
            "Meridian Dynamics",
            vec![seed("TS-324473", "ts-1", "Expense approvals carry manager sign-off")],
        ))
        .unwrap();
    store
        .register_cer_rows(definition(
            "cer-20555",
            "Northwind Audit",
            vec![seed("TS-771020", "ts-1", "Change tickets carry peer review")],
        ))
        .unwrap();

    let script = ScriptId::new("ts-1").unwrap();
    let a = store
        .external_id_row(&CerId::new("cer-10234").unwrap(), &script)
        .unwrap();
    let b = store
        .external_id_row(&CerId::new("cer-20555").unwrap(), &script)
        .unwrap();
    assert_eq!(a.as_str(), "TS-324473");
    assert_eq!(b.as_str(), "TS-771020");
}

#[test]
fn at_review_core_db_06_row_mutation_persists_through_the_mut_handle() {
    let mut store = ReviewStore::new_in_memory();
    store
        .register_cer_rows(definition(
            "cer-10234",
            "Meridian Dynamics",
            vec![seed("TS-324473", "ts-1", "Expense approvals carry manager sign-off")],
        ))
        .unwrap();

    let external = ExternalScriptId::new("TS-324473").unwrap();
    {
        let row = store.script_row_mut(&external).unwrap();
        row.status = ScriptStatus::CoqResponded;
        row.analyst_comment = Some("Looks complete".to_string());
    }
    let row = store.script_row(&external).unwrap();
    assert_eq!(row.status, ScriptStatus::CoqResponded);
    assert_eq!(row.analyst_comment.as_deref(), Some("Looks complete"));
}
