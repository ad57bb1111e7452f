//! Date/time windowing for bookings.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::model::{DATE_FORMAT, TIME_FORMAT};

use super::{Field, ValidationErrorKind, ValidationFailure};

/// How soon and how far ahead a booking may be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    /// Minimum minutes between now and a same-day slot.
    pub lead_time_minutes: u32,
    /// Maximum days ahead of today.
    pub horizon_days: u32,
}

impl Default for BookingWindow {
    fn default() -> Self {
        Self {
            lead_time_minutes: 15,
            horizon_days: 90,
        }
    }
}

impl BookingWindow {
    pub fn new(lead_time_minutes: u32, horizon_days: u32) -> Self {
        Self {
            lead_time_minutes,
            horizon_days,
        }
    }

    fn lead_time(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.lead_time_minutes))
    }

    /// Last bookable date, or `None` if the horizon overflows the calendar.
    fn last_bookable_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        today.checked_add_days(Days::new(u64::from(self.horizon_days)))
    }
}

/// On-the-hour slots from 10:00 to 22:00 inclusive.
pub fn standard_time_slots() -> Vec<NaiveTime> {
    (10..=22)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .collect()
}

/// Checks that `date` + `time` fall inside the booking window relative to
/// `now`, returning the parsed pair.
///
/// Dates before today are always in the past. For today, the slot must be at
/// least the lead time away from `now`. Dates beyond today plus the horizon
/// are too far out.
pub fn validate_appointment_date_time(
    date: &str,
    time: &str,
    now: NaiveDateTime,
    window: &BookingWindow,
) -> Result<(NaiveDate, NaiveTime), ValidationFailure> {
    let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|e| {
        ValidationFailure::new(
            Field::Date,
            ValidationErrorKind::MalformedInput,
            format!("Invalid date format (expected YYYY-MM-DD): {}", e),
        )
    })?;
    let time = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT).map_err(|e| {
        ValidationFailure::new(
            Field::Time,
            ValidationErrorKind::MalformedInput,
            format!("Invalid time format (expected HH:MM): {}", e),
        )
    })?;

    let today = now.date();

    if date < today {
        return Err(ValidationFailure::new(
            Field::Date,
            ValidationErrorKind::PastDateTime,
            "The appointment date is in the past.",
        ));
    }

    if date == today && date.and_time(time) < now + window.lead_time() {
        return Err(ValidationFailure::new(
            Field::Time,
            ValidationErrorKind::PastDateTime,
            format!(
                "For same-day appointments, please pick a time at least {} minutes from now.",
                window.lead_time_minutes
            ),
        ));
    }

    if let Some(last) = window.last_bookable_date(today) {
        if date > last {
            return Err(ValidationFailure::new(
                Field::Date,
                ValidationErrorKind::TooFarInFuture,
                format!(
                    "Appointments can be booked at most {} days in advance.",
                    window.horizon_days
                ),
            ));
        }
    }

    Ok((date, time))
}
