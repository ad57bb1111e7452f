//! Builders for test submissions.

#![allow(dead_code)]

use booking::model::{AppointmentRequest, AttachmentUpload};

/// Builds `AppointmentRequest`s that pass validation against
/// [`crate::common::harness::fixed_now`] unless told otherwise.
pub struct RequestBuilder {
    request: AppointmentRequest,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            request: AppointmentRequest {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: "(555) 123-4567".to_string(),
                appointment_type: "Routine Check-up".to_string(),
                date: "2026-05-06".to_string(),
                time: "14:00".to_string(),
                reason: "Annual physical".to_string(),
                notes: None,
                attachment: None,
                is_intern: false,
                secondary_attachment: None,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.request.name = name.to_string();
        self
    }

    pub fn email(mut self, email: &str) -> Self {
        self.request.email = email.to_string();
        self
    }

    pub fn phone(mut self, phone: &str) -> Self {
        self.request.phone = phone.to_string();
        self
    }

    pub fn appointment_type(mut self, label: &str) -> Self {
        self.request.appointment_type = label.to_string();
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.request.date = date.to_string();
        self
    }

    pub fn time(mut self, time: &str) -> Self {
        self.request.time = time.to_string();
        self
    }

    pub fn reason(mut self, reason: &str) -> Self {
        self.request.reason = reason.to_string();
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.request.notes = Some(notes.to_string());
        self
    }

    pub fn intern(mut self) -> Self {
        self.request.is_intern = true;
        self
    }

    pub fn attachment(mut self, file_name: &str, bytes: &[u8]) -> Self {
        self.request.attachment = Some(AttachmentUpload::new(file_name, "", bytes.to_vec()));
        self
    }

    pub fn secondary_attachment(mut self, file_name: &str, bytes: &[u8]) -> Self {
        self.request.secondary_attachment =
            Some(AttachmentUpload::new(file_name, "", bytes.to_vec()));
        self
    }

    pub fn build(self) -> AppointmentRequest {
        self.request
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
