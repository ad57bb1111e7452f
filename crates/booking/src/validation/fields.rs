//! Single-field validators.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

use crate::model::{AppointmentType, TIME_FORMAT};

use super::{Field, ValidationErrorKind, ValidationFailure};

/// 20 MiB.
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 20 * 1024 * 1024;

static RE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\s\-'.]+$").unwrap());

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$",
    )
    .unwrap()
});

/// Accepted digit count for phone numbers, after stripping separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneRules {
    pub min_digits: usize,
    pub max_digits: usize,
}

impl Default for PhoneRules {
    fn default() -> Self {
        Self {
            min_digits: 10,
            max_digits: 15,
        }
    }
}

pub fn validate_name(name: &str) -> Result<(), ValidationFailure> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationFailure::new(
            Field::Name,
            ValidationErrorKind::EmptyField,
            "Name cannot be empty.",
        ));
    }
    if !RE_NAME.is_match(name) {
        return Err(ValidationFailure::new(
            Field::Name,
            ValidationErrorKind::InvalidFormat,
            "Name may only contain letters, spaces, hyphens, apostrophes and periods.",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationFailure> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationFailure::new(
            Field::Email,
            ValidationErrorKind::EmptyField,
            "Email cannot be empty.",
        ));
    }
    if email.len() > 254 || !RE_EMAIL.is_match(email) {
        return Err(ValidationFailure::new(
            Field::Email,
            ValidationErrorKind::InvalidFormat,
            "Invalid email format.",
        ));
    }
    Ok(())
}

/// Validates a phone number and returns it with spaces, hyphens and
/// parentheses stripped.
pub fn validate_phone(phone: &str, rules: &PhoneRules) -> Result<String, ValidationFailure> {
    if phone.trim().is_empty() {
        return Err(ValidationFailure::new(
            Field::Phone,
            ValidationErrorKind::EmptyField,
            "Phone number cannot be empty.",
        ));
    }

    let normalized: String = phone
        .chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')')))
        .collect();
    let digits = normalized.strip_prefix('+').unwrap_or(&normalized);
    let digit_count = digits.chars().count();

    if digits.is_empty()
        || !digits.chars().all(|c| c.is_ascii_digit())
        || digit_count < rules.min_digits
        || digit_count > rules.max_digits
    {
        return Err(ValidationFailure::new(
            Field::Phone,
            ValidationErrorKind::InvalidFormat,
            format!(
                "Invalid phone number format (expected {} to {} digits).",
                rules.min_digits, rules.max_digits
            ),
        ));
    }

    Ok(normalized)
}

/// The placeholder entry never parses, so it is always rejected.
pub fn validate_appointment_type(
    raw: &str,
    allowed: &[AppointmentType],
) -> Result<AppointmentType, ValidationFailure> {
    raw.parse::<AppointmentType>()
        .ok()
        .filter(|t| allowed.contains(t))
        .ok_or_else(|| {
            ValidationFailure::new(
                Field::AppointmentType,
                ValidationErrorKind::InvalidChoice,
                "Please select a valid appointment type.",
            )
        })
}

pub fn validate_time_slot(time: NaiveTime, slots: &[NaiveTime]) -> Result<(), ValidationFailure> {
    if slots.contains(&time) {
        return Ok(());
    }
    Err(ValidationFailure::new(
        Field::Time,
        ValidationErrorKind::InvalidChoice,
        format!(
            "{} is not an available time slot.",
            time.format(TIME_FORMAT)
        ),
    ))
}

pub fn validate_reason(reason: &str) -> Result<(), ValidationFailure> {
    if reason.trim().is_empty() {
        return Err(ValidationFailure::new(
            Field::Reason,
            ValidationErrorKind::EmptyField,
            "Please provide a reason for the appointment.",
        ));
    }
    Ok(())
}

/// `None` (no attachment) always passes.
pub fn validate_attachment_size(size_bytes: Option<u64>, max_bytes: u64) -> Result<(), ValidationFailure> {
    match size_bytes {
        Some(size) if size > max_bytes => Err(ValidationFailure::new(
            Field::Attachment,
            ValidationErrorKind::TooLarge,
            format!(
                "File size exceeds the maximum limit of {}.",
                format_size(max_bytes)
            ),
        )),
        _ => Ok(()),
    }
}

fn format_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}
