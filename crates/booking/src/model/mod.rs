pub mod appointment;
pub mod builder;
pub mod row;

pub use appointment::{
    AppointmentRecord, AppointmentRequest, AppointmentStatus, AppointmentType, AttachmentInfo,
    AttachmentSlot, AttachmentUpload, ParseEnumError, APPOINTMENT_TYPE_PLACEHOLDER, DATE_FORMAT,
    TIME_FORMAT,
};
pub use builder::RecordBuilder;
pub use row::{AppointmentRow, RowDecodeError};
