use chrono::NaiveDateTime;

use crate::model::AppointmentRequest;

use super::error::SubmissionWarning;

/// Request-scoped state for one submission.
pub struct SubmissionContext {
    // Input
    pub request: AppointmentRequest,
    /// Local wall-clock time the booking window is measured from.
    pub now: NaiveDateTime,

    // Non-fatal problems after the save
    pub warnings: Vec<SubmissionWarning>,
}

impl SubmissionContext {
    pub fn new(request: AppointmentRequest, now: NaiveDateTime) -> Self {
        Self {
            request,
            now,
            warnings: Vec::new(),
        }
    }
}
