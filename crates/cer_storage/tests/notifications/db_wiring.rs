#![forbid(unsafe_code)]

use cer_kernel_contracts::notification::{NotificationBody, NotificationInput};
use cer_kernel_contracts::review::{
    CerDefinition, CerId, ExternalScriptId, ScriptId, ScriptSeed, VendorName,
};
use cer_kernel_contracts::script::{ScriptKind, ScriptStatus};
use cer_kernel_contracts::MonotonicTimeNs;
use cer_storage::repo::NotificationRepo;
use cer_storage::{ReviewStore, StorageError};

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

fn input(t: u64, body: NotificationBody) -> NotificationInput {
    NotificationInput::v1(
        MonotonicTimeNs(t),
        ExternalScriptId::new("TS-324473").unwrap(),
        Some(CerId::new("cer-10234").unwrap()),
        Some(VendorName::new("Meridian Dynamics").unwrap()),
        "Evidence event on TS-324473".to_string(),
        body,
    )
    .unwrap()
}

#[test]
fn at_notifications_db_01_ids_start_at_one_and_rows_prepend() {
    let mut store = seed_store();
    let first = store
        .append_notification_row(input(10, NotificationBody::ActionItemCreated))
        .unwrap();
    let second = store
        .append_notification_row(input(
            20,
            NotificationBody::VendorSubmission {
                file_count: 2,
                needs_approval: true,
            },
        ))
        .unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 2);
    let rows = store.notification_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].notification_id, 2);
    assert_eq!(rows[1].notification_id, 1);
    assert!(rows.iter().all(|n| !n.is_read));
}

#[test]
fn at_notifications_db_02_append_for_unknown_script_is_a_foreign_key_violation() {
    let mut store = seed_store();
    let orphan = NotificationInput::v1(
        MonotonicTimeNs(10),
        ExternalScriptId::new("TS-000000").unwrap(),
        None,
        None,
        "Orphan event".to_string(),
        NotificationBody::ActionItemCreated,
    )
    .unwrap();
    let out = store.append_notification_row(orphan);
    assert!(matches!(
        out,
        Err(StorageError::ForeignKeyViolation {
            table: "notifications",
            ..
        })
    ));
    assert!(store.notification_rows().is_empty());
}

#[test]
fn at_notifications_db_03_unread_count_is_derived_from_the_rows() {
    let mut store = seed_store();
    let a = store
        .append_notification_row(input(10, NotificationBody::ActionItemCreated))
        .unwrap();
    let b = store
        .append_notification_row(input(
            11,
            NotificationBody::UploadNeedsReview {
                document_name: "expense-report.pdf".to_string(),
            },
        ))
        .unwrap();
    assert_eq!(store.unread_notification_count(), 2);

    assert!(store.mark_notification_read_row(a));
    assert_eq!(store.unread_notification_count(), 1);
    // Marking the same row again changes nothing.
    assert!(store.mark_notification_read_row(a));
    assert_eq!(store.unread_notification_count(), 1);

    assert!(store.mark_notification_read_row(b));
    assert_eq!(store.unread_notification_count(), 0);
}

#[test]
fn at_notifications_db_04_mark_read_on_unknown_id_reports_false() {
    let mut store = seed_store();
    assert!(!store.mark_notification_read_row(42));
    assert_eq!(store.unread_notification_count(), 0);
}

#[test]
fn at_notifications_db_05_clear_upload_review_removes_only_the_matching_pair() {
    let mut store = seed_store();
    store
        .append_notification_row(input(
            10,
            NotificationBody::UploadNeedsReview {
                document_name: "expense-report.pdf".to_string(),
            },
        ))
        .unwrap();
    store
        .append_notification_row(input(
            11,
            NotificationBody::UploadNeedsReview {
                document_name: "expense-report.pdf".to_string(),
            },
        ))
        .unwrap();
    store
        .append_notification_row(input(
            12,
            NotificationBody::UploadNeedsReview {
                document_name: "invoice-log.xlsx".to_string(),
            },
        ))
        .unwrap();
    store
        .append_notification_row(input(13, NotificationBody::ActionItemCreated))
        .unwrap();

    let removed = store.clear_upload_review_rows(
        &ExternalScriptId::new("TS-324473").unwrap(),
        "expense-report.pdf",
    );
    assert_eq!(removed, 2);

    let rows = store.notification_rows();
    assert_eq!(rows.len(), 2);
    assert!(matches!(rows[0].body, NotificationBody::ActionItemCreated));
    assert!(matches!(
        &rows[1].body,
        NotificationBody::UploadNeedsReview { document_name } if document_name == "invoice-log.xlsx"
    ));

    // Id assignment keeps counting past removed rows.
    let next = store
        .append_notification_row(input(14, NotificationBody::ActionItemCreated))
        .unwrap();
    assert_eq!(next, 5);
}
