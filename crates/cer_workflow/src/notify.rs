#![forbid(unsafe_code)]

use cer_kernel_contracts::notification::{NotificationBody, NotificationInput};
use cer_kernel_contracts::review::ExternalScriptId;
use cer_kernel_contracts::MonotonicTimeNs;
use cer_storage::ReviewStore;

use crate::WorkflowError;

/// Derives user-facing events from ledger transitions and stores them newest
/// first. List order is the chronological and display order; there is no
/// separate sort step, and the unread count is always derived, never cached.
#[derive(Debug, Default, Clone)]
pub struct NotificationDispatcher;

impl NotificationDispatcher {
    pub fn emit(
        store: &mut ReviewStore,
        now: MonotonicTimeNs,
        external_id: &ExternalScriptId,
        body: NotificationBody,
    ) -> Result<u64, WorkflowError> {
        let script = store
            .script_row(external_id)
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "test_script",
                key: external_id.as_str().to_string(),
            })?;
        let message = compose_message(&body, external_id, script.vendor_name.as_str());
        let input = NotificationInput::v1(
            now,
            external_id.clone(),
            Some(script.cer_id.clone()),
            Some(script.vendor_name.clone()),
            message,
            body,
        )?;
        Ok(store.append_notification(input)?)
    }

    /// Idempotent; flips `is_read` only, never order or count.
    pub fn mark_read(store: &mut ReviewStore, notification_id: u64) -> bool {
        store.mark_notification_read(notification_id)
    }

    /// Removes the `upload_needs_review` notifications for a script+document
    /// pair once the condition they report is resolved.
    pub fn resolve_upload_review(
        store: &mut ReviewStore,
        external_id: &ExternalScriptId,
        document_name: &str,
    ) -> usize {
        store.clear_upload_review_notifications(external_id, document_name)
    }

    pub fn unread_count(store: &ReviewStore) -> usize {
        store.unread_notification_count()
    }
}

fn compose_message(
    body: &NotificationBody,
    external_id: &ExternalScriptId,
    vendor_name: &str,
) -> String {
    match body {
        NotificationBody::VendorSubmission { file_count, .. } => format!(
            "{vendor_name} submitted {file_count} evidence file(s) for {}",
            external_id.as_str()
        ),
        NotificationBody::ActionItemCreated => format!(
            "Action item issued on {} for {vendor_name}",
            external_id.as_str()
        ),
        NotificationBody::UploadNeedsReview { document_name } => format!(
            "{document_name} re-uploaded for {} and needs review",
            external_id.as_str()
        ),
        NotificationBody::ReuploadRequested {
            document_name,
            reason,
        } => format!(
            "Re-upload requested for {document_name} on {}: {reason}",
            external_id.as_str()
        ),
        NotificationBody::AdditionalDocumentRequested { requirement } => format!(
            "Additional document requested on {}: {requirement}",
            external_id.as_str()
        ),
    }
}
