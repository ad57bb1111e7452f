//! The booking pipeline and the read side the admin console uses.

pub mod context;
pub mod error;
pub mod runner;

pub use context::SubmissionContext;
pub use error::{SubmissionWarning, SubmitError};
pub use runner::{BookingService, ConnectivityStatus, SubmissionReceipt};
