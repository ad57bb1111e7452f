//! Folds a validated submission into a record ready for storage.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::validation::ValidatedRequest;

use super::appointment::{AppointmentRecord, AppointmentStatus, AttachmentInfo, AttachmentUpload};

/// Builds [`AppointmentRecord`]s. Construction only: nothing is written.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordBuilder;

impl RecordBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Assigns a fresh id, stamps `created_at`, sets status to pending and
    /// copies every request field. Text fields are stored trimmed, the way
    /// the validator checked them. Attachment slots keep their file name but
    /// stay unflagged until a reference is attached.
    pub fn build(&self, validated: &ValidatedRequest<'_>, created_at: DateTime<Utc>) -> AppointmentRecord {
        let request = validated.request();

        AppointmentRecord {
            id: Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.trim().to_string(),
            appointment_type: validated.appointment_type(),
            appointment_date: validated.date(),
            appointment_time: validated.time(),
            reason: request.reason.trim().to_string(),
            notes: request.notes.clone(),
            is_intern: request.is_intern,
            attachment: pending_info(request.attachment.as_ref()),
            secondary_attachment: pending_info(request.secondary_attachment.as_ref()),
            created_at,
            status: AppointmentStatus::Pending,
        }
    }
}

fn pending_info(upload: Option<&AttachmentUpload>) -> AttachmentInfo {
    upload
        .map(|u| AttachmentInfo::pending(&u.file_name))
        .unwrap_or_default()
}
