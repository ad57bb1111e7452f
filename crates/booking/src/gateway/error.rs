use thiserror::Error;

use crate::db::DatabaseError;
use crate::error::StorageError;
use crate::model::RowDecodeError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Store is unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Store rejected the record: {0}")]
    WriteRejected(String),

    #[error("Store rejected the attachment: {0}")]
    UploadRejected(String),

    #[error("Appointment not found: {0}")]
    RecordNotFound(String),

    #[error("Attachment not found: {0}")]
    BlobNotFound(String),

    #[error("Stored appointment '{id}' is malformed: {reason}")]
    MalformedRecord { id: String, reason: String },
}

impl From<DatabaseError> for GatewayError {
    fn from(e: DatabaseError) -> Self {
        if e.is_constraint_violation() {
            GatewayError::WriteRejected(e.to_string())
        } else {
            GatewayError::StorageUnavailable(e.to_string())
        }
    }
}

impl From<StorageError> for GatewayError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidBucket(_)
            | StorageError::UnknownBucket(_)
            | StorageError::FileExists(_) => GatewayError::UploadRejected(e.to_string()),
            StorageError::CreateDirectory { .. }
            | StorageError::WriteFile { .. }
            | StorageError::ReadFile { .. }
            | StorageError::RemoveFile { .. } => GatewayError::StorageUnavailable(e.to_string()),
        }
    }
}

impl From<RowDecodeError> for GatewayError {
    fn from(e: RowDecodeError) -> Self {
        GatewayError::MalformedRecord {
            id: e.id,
            reason: e.reason,
        }
    }
}
