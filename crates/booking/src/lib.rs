pub mod admin;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod sanitize;
pub mod secrets;
pub mod service;
pub mod storage;
pub mod validation;

pub use admin::{AdminError, AdminGate, AdminSession};
pub use config::{load_config, BookingConfig, StoreConfig};
pub use error::{BookingError, ConfigError, Result, StorageError};
pub use gateway::{connect, GatewayError, PersistenceGateway};
pub use logging::{init_logging, LoggingError};
pub use model::{
    AppointmentRecord, AppointmentRequest, AppointmentStatus, AppointmentType, AttachmentSlot,
    AttachmentUpload,
};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use service::{BookingService, SubmissionReceipt, SubmissionWarning, SubmitError};
pub use validation::{FormValidator, ValidationErrorKind, ValidationFailure};
