//! Booking form validation.
//!
//! Each field validator is a pure function returning either success or a
//! [`ValidationFailure`]. [`FormValidator`] runs all of them over a
//! submission and reports every failure at once, so the form can show all
//! problems in a single round trip.

pub mod fields;
pub mod schedule;

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use thiserror::Error;

use crate::config::FormConfig;
use crate::error::ConfigError;
use crate::model::{AppointmentRequest, AppointmentType, TIME_FORMAT};

pub use fields::{
    validate_appointment_type, validate_attachment_size, validate_email, validate_name,
    validate_phone, validate_reason, validate_time_slot, PhoneRules,
};
pub use schedule::{standard_time_slots, validate_appointment_date_time, BookingWindow};

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValidationErrorKind {
    EmptyField,
    InvalidFormat,
    InvalidChoice,
    MalformedInput,
    PastDateTime,
    TooFarInFuture,
    TooLarge,
}

/// Form field a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Email,
    Phone,
    AppointmentType,
    Date,
    Time,
    Reason,
    Attachment,
    SecondaryAttachment,
    IsIntern,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::AppointmentType => "appointmentType",
            Field::Date => "date",
            Field::Time => "time",
            Field::Reason => "reason",
            Field::Attachment => "attachment",
            Field::SecondaryAttachment => "secondaryAttachment",
            Field::IsIntern => "isIntern",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rejected field with a message suitable for the end user.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct ValidationFailure {
    pub field: Field,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(field: Field, kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }

    /// Re-targets the failure at another field.
    pub fn for_field(mut self, field: Field) -> Self {
        self.field = field;
        self
    }
}

/// Everything the validators need besides the submission itself.
#[derive(Debug, Clone)]
pub struct FormRules {
    pub appointment_types: Vec<AppointmentType>,
    pub time_slots: Vec<NaiveTime>,
    pub phone: PhoneRules,
    pub window: BookingWindow,
    pub max_attachment_bytes: u64,
    pub intern_track_enabled: bool,
}

impl Default for FormRules {
    fn default() -> Self {
        Self {
            appointment_types: AppointmentType::ALL.to_vec(),
            time_slots: standard_time_slots(),
            phone: PhoneRules::default(),
            window: BookingWindow::default(),
            max_attachment_bytes: fields::DEFAULT_MAX_ATTACHMENT_BYTES,
            intern_track_enabled: false,
        }
    }
}

impl FormRules {
    pub fn from_config(config: &FormConfig) -> Result<Self, ConfigError> {
        let time_slots = config
            .time_slots
            .iter()
            .map(|slot| {
                NaiveTime::parse_from_str(slot.trim(), TIME_FORMAT).map_err(|e| {
                    ConfigError::InvalidTimeSlot {
                        value: slot.clone(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            appointment_types: config.appointment_types.clone(),
            time_slots,
            phone: PhoneRules {
                min_digits: config.phone_digits.min,
                max_digits: config.phone_digits.max,
            },
            window: BookingWindow::new(config.lead_time_minutes, config.booking_horizon_days),
            max_attachment_bytes: config.max_attachment_bytes,
            intern_track_enabled: config.intern_track_enabled,
        })
    }
}

/// A submission that passed every validator, with its choice fields parsed.
///
/// Only [`FormValidator::validate`] creates these, so anything built from
/// one has been validated.
#[derive(Debug, Clone)]
pub struct ValidatedRequest<'a> {
    request: &'a AppointmentRequest,
    appointment_type: AppointmentType,
    date: NaiveDate,
    time: NaiveTime,
}

impl<'a> ValidatedRequest<'a> {
    pub fn request(&self) -> &'a AppointmentRequest {
        self.request
    }

    pub fn appointment_type(&self) -> AppointmentType {
        self.appointment_type
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }
}

/// Runs every field validator over a submission.
#[derive(Debug, Clone, Default)]
pub struct FormValidator {
    rules: FormRules,
}

impl FormValidator {
    pub fn new(rules: FormRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &FormRules {
        &self.rules
    }

    /// Validates the whole submission against `now` (local wall-clock time).
    /// Returns all failures together; never stops at the first one.
    pub fn validate<'a>(
        &self,
        request: &'a AppointmentRequest,
        now: NaiveDateTime,
    ) -> Result<ValidatedRequest<'a>, Vec<ValidationFailure>> {
        let mut failures = Vec::new();
        let rules = &self.rules;

        collect(&mut failures, validate_name(&request.name));
        collect(&mut failures, validate_email(&request.email));
        collect(&mut failures, validate_phone(&request.phone, &rules.phone));
        let appointment_type = collect(
            &mut failures,
            validate_appointment_type(&request.appointment_type, &rules.appointment_types),
        );
        let schedule = collect(
            &mut failures,
            validate_appointment_date_time(&request.date, &request.time, now, &rules.window),
        );
        // Slot membership is only meaningful for a time that parses; a
        // malformed time was already reported above.
        if let Ok(time) = NaiveTime::parse_from_str(request.time.trim(), TIME_FORMAT) {
            collect(&mut failures, validate_time_slot(time, &rules.time_slots));
        }
        collect(&mut failures, validate_reason(&request.reason));
        collect(
            &mut failures,
            validate_attachment_size(
                request.attachment.as_ref().map(|a| a.size_bytes()),
                rules.max_attachment_bytes,
            ),
        );
        collect(
            &mut failures,
            validate_attachment_size(
                request.secondary_attachment.as_ref().map(|a| a.size_bytes()),
                rules.max_attachment_bytes,
            )
            .map_err(|f| f.for_field(Field::SecondaryAttachment)),
        );

        if !rules.intern_track_enabled {
            if request.is_intern {
                failures.push(ValidationFailure::new(
                    Field::IsIntern,
                    ValidationErrorKind::InvalidChoice,
                    "Intern bookings are not available.",
                ));
            }
            if request.secondary_attachment.is_some() {
                failures.push(ValidationFailure::new(
                    Field::SecondaryAttachment,
                    ValidationErrorKind::InvalidChoice,
                    "An additional attachment is not accepted for this form.",
                ));
            }
        }

        match (failures.is_empty(), appointment_type, schedule) {
            (true, Some(appointment_type), Some((date, time))) => Ok(ValidatedRequest {
                request,
                appointment_type,
                date,
                time,
            }),
            _ => Err(failures),
        }
    }

    /// Like [`validate`](Self::validate) but only reports the failures.
    pub fn check(&self, request: &AppointmentRequest, now: NaiveDateTime) -> Vec<ValidationFailure> {
        self.validate(request, now).err().unwrap_or_default()
    }
}

fn collect<T>(failures: &mut Vec<ValidationFailure>, result: Result<T, ValidationFailure>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(failure) => {
            failures.push(failure);
            None
        }
    }
}
