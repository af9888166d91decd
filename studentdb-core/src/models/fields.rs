//! Per-field rules shared by full records and partial updates
//!
//! Each check pushes its violations into the caller's `ValidationErrors` and
//! returns the cleaned value only when the field passed. Lengths count
//! characters, not bytes, so names in any script get the same budget.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Gender, StudentStatus, ValidationError, ValidationErrors};

/// Matches the `VARCHAR(100)` on `students.student_id`.
pub const STUDENT_ID_MAX_LEN: usize = 100;
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 100;
pub const MAJOR_MIN_LEN: usize = 2;
pub const MAJOR_MAX_LEN: usize = 100;
pub const CLASS_NAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 100;
pub const ADDRESS_MAX_LEN: usize = 500;
pub const CONTACT_NAME_MAX_LEN: usize = 50;
/// Matches the `VARCHAR(20)` on `phone` and `emergency_contact_phone`.
pub const PHONE_MAX_LEN: usize = 20;

pub const GPA_MIN: f64 = 0.0;
pub const GPA_MAX: f64 = 4.0;

/// Largest amount `NUMERIC(10,2)` on `scholarship_amount` can hold.
pub const SCHOLARSHIP_MAX: f64 = 99_999_999.99;

pub const MIN_AGE: i32 = 15;
pub const MAX_AGE: i32 = 30;

/// Date format accepted for raw input
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Uppercase prefix followed by at least four digits, e.g. `S2024001`, `CS2023123`
static STUDENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]+\d{4,}$").expect("invalid student id regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("invalid email regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[\d\s\-()]{7,20}$").expect("invalid phone regex"));

/// Whole calendar years between `date_of_birth` and `today`.
///
/// Negative when `date_of_birth` lies in the future.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

fn text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        errors.push(ValidationError::Empty { field });
        return None;
    }

    let len = value.chars().count();
    if len < min {
        errors.push(ValidationError::TooShort { field, min });
        return None;
    }
    if len > max {
        errors.push(ValidationError::TooLong { field, max });
        return None;
    }

    Some(value.to_owned())
}

/// Required free-text field.
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
    min: usize,
    max: usize,
) -> Option<String> {
    match value {
        Some(value) => text(errors, field, value, min, max),
        None => {
            errors.push(ValidationError::Missing { field });
            None
        }
    }
}

/// Optional free-text field; blank input counts as absent.
pub(crate) fn optional_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Option<String> {
    match value {
        Some(value) if !value.trim().is_empty() => text(errors, field, value, 1, max),
        _ => None,
    }
}

pub(crate) fn student_id(errors: &mut ValidationErrors, value: &str) -> Option<String> {
    let value = text(errors, "student_id", value, 1, STUDENT_ID_MAX_LEN)?;
    if !STUDENT_ID_RE.is_match(&value) {
        errors.push(ValidationError::InvalidFormat {
            field: "student_id",
            reason: "must be uppercase letters followed by at least four digits",
        });
        return None;
    }
    Some(value)
}

pub(crate) fn email(errors: &mut ValidationErrors, value: &str) -> Option<String> {
    let value = text(errors, "email", value, 1, EMAIL_MAX_LEN)?;
    if !EMAIL_RE.is_match(&value) {
        errors.push(ValidationError::InvalidFormat {
            field: "email",
            reason: "must be a valid email address",
        });
        return None;
    }
    Some(value)
}

pub(crate) fn phone(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
) -> Option<String> {
    let value = value.trim();
    if value.chars().count() > PHONE_MAX_LEN {
        errors.push(ValidationError::TooLong {
            field,
            max: PHONE_MAX_LEN,
        });
        return None;
    }
    if !PHONE_RE.is_match(value) {
        errors.push(ValidationError::InvalidFormat {
            field,
            reason: "must be 7-20 digits, spaces, dashes or parentheses with an optional leading +",
        });
        return None;
    }
    Some(value.to_owned())
}

pub(crate) fn date(errors: &mut ValidationErrors, field: &'static str, value: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(value.trim(), DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(ValidationError::InvalidFormat {
                field,
                reason: "must be a date in YYYY-MM-DD format",
            });
            None
        }
    }
}

/// Parse a date of birth and check the age window on `today`.
pub(crate) fn date_of_birth(
    errors: &mut ValidationErrors,
    value: &str,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let dob = date(errors, "date_of_birth", value)?;
    let age = age_on(dob, today);
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        errors.push(ValidationError::AgeOutOfRange {
            age,
            min: MIN_AGE,
            max: MAX_AGE,
        });
        return None;
    }
    Some(dob)
}

pub(crate) fn enrollment_after_birth(
    errors: &mut ValidationErrors,
    date_of_birth: NaiveDate,
    enrollment_date: NaiveDate,
) -> bool {
    if enrollment_date <= date_of_birth {
        errors.push(ValidationError::DateOrder {
            earlier: "date_of_birth",
            later: "enrollment_date",
        });
        return false;
    }
    true
}

pub(crate) fn gpa(errors: &mut ValidationErrors, value: f64) -> Option<f64> {
    if !value.is_finite() || !(GPA_MIN..=GPA_MAX).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            field: "gpa",
            value,
            reason: "must be between 0.0 and 4.0",
        });
        return None;
    }
    Some(value)
}

/// GPA range check for callers updating the column on its own.
pub fn check_gpa(value: f64) -> Result<f64, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    gpa(&mut errors, value).ok_or(errors)
}

pub(crate) fn scholarship_amount(errors: &mut ValidationErrors, value: f64) -> Option<f64> {
    if !value.is_finite() || value < 0.0 {
        errors.push(ValidationError::OutOfRange {
            field: "scholarship_amount",
            value,
            reason: "must not be negative",
        });
        return None;
    }
    if value > SCHOLARSHIP_MAX {
        errors.push(ValidationError::OutOfRange {
            field: "scholarship_amount",
            value,
            reason: "must not exceed 99999999.99",
        });
        return None;
    }
    Some(value)
}

pub(crate) fn gender(errors: &mut ValidationErrors, value: &str) -> Option<Gender> {
    value.parse().map_err(|e| errors.push(e)).ok()
}

pub(crate) fn status(errors: &mut ValidationErrors, value: &str) -> Option<StudentStatus> {
    value.parse().map_err(|e| errors.push(e)).ok()
}
