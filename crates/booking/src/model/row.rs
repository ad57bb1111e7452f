//! Flat row representation shared by the SQLite and hosted stores.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::appointment::{
    AppointmentRecord, AttachmentInfo, DATE_FORMAT, TIME_FORMAT,
};

/// A stored row that could not be turned back into a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Row '{id}' is malformed: {reason}")]
pub struct RowDecodeError {
    pub id: String,
    pub reason: String,
}

/// One row of the `appointments` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub appointment_type: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub reason: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "false_if_null")]
    pub is_intern: bool,
    #[serde(default, deserialize_with = "false_if_null")]
    pub file_uploaded: bool,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default, deserialize_with = "false_if_null")]
    pub secondary_uploaded: bool,
    #[serde(default)]
    pub secondary_file_name: Option<String>,
    #[serde(default)]
    pub secondary_file_path: Option<String>,
    pub created_at: String,
    pub status: String,
}

fn false_if_null<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl From<&AppointmentRecord> for AppointmentRow {
    fn from(record: &AppointmentRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            appointment_type: record.appointment_type.label().to_string(),
            appointment_date: record.appointment_date.format(DATE_FORMAT).to_string(),
            appointment_time: record.appointment_time.format(TIME_FORMAT).to_string(),
            reason: record.reason.clone(),
            notes: record.notes.clone(),
            is_intern: record.is_intern,
            file_uploaded: record.attachment.uploaded,
            file_name: record.attachment.file_name.clone(),
            file_path: record.attachment.reference.clone(),
            secondary_uploaded: record.secondary_attachment.uploaded,
            secondary_file_name: record.secondary_attachment.file_name.clone(),
            secondary_file_path: record.secondary_attachment.reference.clone(),
            created_at: record
                .created_at
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            status: record.status.as_str().to_string(),
        }
    }
}

impl TryFrom<AppointmentRow> for AppointmentRecord {
    type Error = RowDecodeError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let id = row.id.clone();
        let malformed = |reason: String| RowDecodeError {
            id: id.clone(),
            reason,
        };

        let appointment_type = row
            .appointment_type
            .parse()
            .map_err(|e: super::ParseEnumError| malformed(e.to_string()))?;
        let status = row
            .status
            .parse()
            .map_err(|e: super::ParseEnumError| malformed(e.to_string()))?;
        let appointment_date = NaiveDate::parse_from_str(&row.appointment_date, DATE_FORMAT)
            .map_err(|e| malformed(format!("appointment_date: {}", e)))?;
        // Postgres `time` columns come back with seconds.
        let appointment_time = NaiveTime::parse_from_str(&row.appointment_time, TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&row.appointment_time, "%H:%M:%S"))
            .map_err(|e| malformed(format!("appointment_time: {}", e)))?;
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| malformed(format!("created_at: {}", e)))?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            appointment_type,
            appointment_date,
            appointment_time,
            reason: row.reason,
            notes: row.notes,
            is_intern: row.is_intern,
            attachment: AttachmentInfo {
                uploaded: row.file_uploaded,
                file_name: row.file_name,
                reference: row.file_path,
            },
            secondary_attachment: AttachmentInfo {
                uploaded: row.secondary_uploaded,
                file_name: row.secondary_file_name,
                reference: row.secondary_file_path,
            },
            created_at,
            status,
        })
    }
}
