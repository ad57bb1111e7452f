use serde::Serialize;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::model::{AppointmentRequest, AttachmentSlot};
use crate::validation::ValidationFailure;

/// A submission that did not produce a stored record. Both variants hand the
/// request back so the form can be re-shown without re-entry.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("{} field(s) failed validation", .failures.len())]
    Invalid {
        failures: Vec<ValidationFailure>,
        request: Box<AppointmentRequest>,
    },

    #[error("Could not save the appointment: {source}")]
    Persistence {
        #[source]
        source: GatewayError,
        request: Box<AppointmentRequest>,
    },
}

impl SubmitError {
    pub fn request(&self) -> &AppointmentRequest {
        match self {
            SubmitError::Invalid { request, .. } | SubmitError::Persistence { request, .. } => {
                request
            }
        }
    }

    pub fn into_request(self) -> AppointmentRequest {
        match self {
            SubmitError::Invalid { request, .. } | SubmitError::Persistence { request, .. } => {
                *request
            }
        }
    }

    /// Empty for persistence failures.
    pub fn failures(&self) -> &[ValidationFailure] {
        match self {
            SubmitError::Invalid { failures, .. } => failures,
            SubmitError::Persistence { .. } => &[],
        }
    }
}

/// Something went wrong after the record was saved. The record stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SubmissionWarning {
    /// The attachment was not linked to the record. The slot stays
    /// "not uploaded".
    #[serde(rename_all = "camelCase")]
    AttachmentFailed {
        slot: AttachmentSlot,
        file_name: String,
        error: String,
    },
    /// The blob was stored but its reference was not, and deleting the blob
    /// failed. Nothing points at it.
    #[serde(rename_all = "camelCase")]
    OrphanedAttachment { slot: AttachmentSlot, error: String },
}
