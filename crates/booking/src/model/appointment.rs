use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire format for appointment dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire format for appointment time slots.
pub const TIME_FORMAT: &str = "%H:%M";

/// Label the booking form shows before a type has been picked.
pub const APPOINTMENT_TYPE_PLACEHOLDER: &str = "Select an appointment type";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentType {
    #[serde(rename = "Career Development")]
    CareerDevelopment,
    #[serde(rename = "Routine Check-up")]
    RoutineCheckup,
    #[serde(rename = "Urgent Care")]
    UrgentCare,
    #[serde(rename = "Performance Evaluation")]
    PerformanceEvaluation,
}

impl AppointmentType {
    pub const ALL: [AppointmentType; 4] = [
        AppointmentType::CareerDevelopment,
        AppointmentType::RoutineCheckup,
        AppointmentType::UrgentCare,
        AppointmentType::PerformanceEvaluation,
    ];

    /// Human-readable label, also used as the stored value.
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentType::CareerDevelopment => "Career Development",
            AppointmentType::RoutineCheckup => "Routine Check-up",
            AppointmentType::UrgentCare => "Urgent Care",
            AppointmentType::PerformanceEvaluation => "Performance Evaluation",
        }
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AppointmentType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AppointmentType::ALL
            .into_iter()
            .find(|t| t.label() == wanted)
            .ok_or_else(|| ParseEnumError {
                kind: "appointment type",
                value: s.to_string(),
            })
    }
}

/// Lifecycle status of a stored appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            _ => Err(ParseEnumError {
                kind: "appointment status",
                value: s.to_string(),
            }),
        }
    }
}

/// A file submitted with the booking form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub file_name: String,
    /// MIME type declared by the client. May be empty.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AttachmentUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for AttachmentUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// Which of the two attachment fields a reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentSlot {
    Primary,
    Secondary,
}

impl AttachmentSlot {
    pub const ALL: [AttachmentSlot; 2] = [AttachmentSlot::Primary, AttachmentSlot::Secondary];

    /// Column holding the upload flag.
    pub fn flag_column(&self) -> &'static str {
        match self {
            AttachmentSlot::Primary => "file_uploaded",
            AttachmentSlot::Secondary => "secondary_uploaded",
        }
    }

    /// Column holding the stored reference.
    pub fn reference_column(&self) -> &'static str {
        match self {
            AttachmentSlot::Primary => "file_path",
            AttachmentSlot::Secondary => "secondary_file_path",
        }
    }
}

impl fmt::Display for AttachmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentSlot::Primary => f.write_str("primary"),
            AttachmentSlot::Secondary => f.write_str("secondary"),
        }
    }
}

/// Raw form submission as collected by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub appointment_type: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub reason: String,
    pub notes: Option<String>,
    pub attachment: Option<AttachmentUpload>,
    pub is_intern: bool,
    pub secondary_attachment: Option<AttachmentUpload>,
}

impl AppointmentRequest {
    pub fn attachment(&self, slot: AttachmentSlot) -> Option<&AttachmentUpload> {
        match slot {
            AttachmentSlot::Primary => self.attachment.as_ref(),
            AttachmentSlot::Secondary => self.secondary_attachment.as_ref(),
        }
    }
}

/// Stored metadata about one attachment field. Never holds the blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachmentInfo {
    pub uploaded: bool,
    pub file_name: Option<String>,
    pub reference: Option<String>,
}

impl AttachmentInfo {
    /// A named attachment that has no stored blob yet. The flag stays clear
    /// until a reference is attached.
    pub fn pending(file_name: &str) -> Self {
        Self {
            uploaded: false,
            file_name: Some(file_name.to_string()),
            reference: None,
        }
    }

    /// A set flag must come with a non-empty reference.
    pub fn is_consistent(&self) -> bool {
        !self.uploaded || self.reference.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// A persisted appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub appointment_type: AppointmentType,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub reason: String,
    pub notes: Option<String>,
    pub is_intern: bool,
    pub attachment: AttachmentInfo,
    pub secondary_attachment: AttachmentInfo,
    pub created_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

impl AppointmentRecord {
    pub fn attachment(&self, slot: AttachmentSlot) -> &AttachmentInfo {
        match slot {
            AttachmentSlot::Primary => &self.attachment,
            AttachmentSlot::Secondary => &self.secondary_attachment,
        }
    }

    pub fn attachment_mut(&mut self, slot: AttachmentSlot) -> &mut AttachmentInfo {
        match slot {
            AttachmentSlot::Primary => &mut self.attachment,
            AttachmentSlot::Secondary => &mut self.secondary_attachment,
        }
    }
}
