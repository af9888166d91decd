//! Partial updates
//!
//! Each supplied field is checked on its own. The only cross-field rule,
//! enrollment after birth, runs when both dates are part of the same patch.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::fields::{self, *};
use super::{Gender, StudentStatus, ValidationErrors};

/// Untrusted partial-update payload. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentUpdate {
    pub student_id: Option<String>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub enrollment_date: Option<String>,
    pub major: Option<String>,
    pub class_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gpa: Option<f64>,
    pub status: Option<String>,
    pub scholarship_amount: Option<f64>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

/// Validated subset of columns to change. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentPatch {
    pub student_id: Option<String>,
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub enrollment_date: Option<NaiveDate>,
    pub major: Option<String>,
    pub class_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gpa: Option<f64>,
    pub status: Option<StudentStatus>,
    pub scholarship_amount: Option<f64>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

impl StudentPatch {
    pub fn validate(update: &StudentUpdate) -> Result<Self, ValidationErrors> {
        Self::validate_on(update, Local::now().date_naive())
    }

    pub fn validate_on(update: &StudentUpdate, today: NaiveDate) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let patch = Self {
            student_id: update
                .student_id
                .as_deref()
                .and_then(|v| fields::student_id(&mut errors, v)),
            name: update
                .name
                .as_deref()
                .and_then(|v| required_text(&mut errors, "name", Some(v), NAME_MIN_LEN, NAME_MAX_LEN)),
            gender: update.gender.as_deref().and_then(|v| fields::gender(&mut errors, v)),
            date_of_birth: update
                .date_of_birth
                .as_deref()
                .and_then(|v| fields::date_of_birth(&mut errors, v, today)),
            enrollment_date: update
                .enrollment_date
                .as_deref()
                .and_then(|v| date(&mut errors, "enrollment_date", v)),
            major: update
                .major
                .as_deref()
                .and_then(|v| required_text(&mut errors, "major", Some(v), MAJOR_MIN_LEN, MAJOR_MAX_LEN)),
            class_name: update
                .class_name
                .as_deref()
                .and_then(|v| required_text(&mut errors, "class_name", Some(v), 1, CLASS_NAME_MAX_LEN)),
            email: update.email.as_deref().and_then(|v| fields::email(&mut errors, v)),
            phone: update
                .phone
                .as_deref()
                .and_then(|v| fields::phone(&mut errors, "phone", v)),
            address: optional_text(&mut errors, "address", update.address.as_deref(), ADDRESS_MAX_LEN),
            gpa: update.gpa.and_then(|v| fields::gpa(&mut errors, v)),
            status: update.status.as_deref().and_then(|v| fields::status(&mut errors, v)),
            scholarship_amount: update
                .scholarship_amount
                .and_then(|v| fields::scholarship_amount(&mut errors, v)),
            emergency_contact_name: optional_text(
                &mut errors,
                "emergency_contact_name",
                update.emergency_contact_name.as_deref(),
                CONTACT_NAME_MAX_LEN,
            ),
            emergency_contact_phone: update
                .emergency_contact_phone
                .as_deref()
                .and_then(|v| fields::phone(&mut errors, "emergency_contact_phone", v)),
        };

        if let (Some(dob), Some(enrolled)) = (patch.date_of_birth, patch.enrollment_date) {
            enrollment_after_birth(&mut errors, dob, enrolled);
        }

        if errors.is_empty() {
            Ok(patch)
        } else {
            Err(errors)
        }
    }

    /// True when no column would change.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn empty_update_is_valid_and_empty() {
        let patch = StudentPatch::validate_on(&StudentUpdate::default(), today()).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn validates_supplied_fields_only() {
        let update = StudentUpdate {
            gpa: Some(3.9),
            status: Some("graduated".into()),
            ..Default::default()
        };
        let patch = StudentPatch::validate_on(&update, today()).unwrap();
        assert_eq!(patch.gpa, Some(3.9));
        assert_eq!(patch.status, Some(StudentStatus::Graduated));
        assert!(patch.name.is_none());
        assert!(!patch.is_empty());
    }

    #[test]
    fn single_date_skips_cross_field_check() {
        // Enrollment alone cannot be compared against a birth date not in the patch
        let update = StudentUpdate {
            enrollment_date: Some("1990-01-01".into()),
            ..Default::default()
        };
        assert!(StudentPatch::validate_on(&update, today()).is_ok());
    }

    #[test]
    fn both_dates_are_cross_checked() {
        let update = StudentUpdate {
            date_of_birth: Some("2005-08-15".into()),
            enrollment_date: Some("2004-09-01".into()),
            ..Default::default()
        };
        let errors = StudentPatch::validate_on(&update, today()).unwrap_err();
        assert_eq!(
            errors.into_vec(),
            vec![ValidationError::DateOrder {
                earlier: "date_of_birth",
                later: "enrollment_date",
            }]
        );
    }

    #[test]
    fn collects_all_field_errors() {
        let update = StudentUpdate {
            name: Some("".into()),
            gpa: Some(5.0),
            email: Some("broken".into()),
            ..Default::default()
        };
        let errors = StudentPatch::validate_on(&update, today()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.has_field("name"));
        assert!(errors.has_field("gpa"));
        assert!(errors.has_field("email"));
    }

    #[test]
    fn ignores_unknown_json_fields() {
        let update: StudentUpdate =
            serde_json::from_str(r#"{"gpa": 3.2, "id": 99, "created_at": "x"}"#).unwrap();
        assert_eq!(update.gpa, Some(3.2));
    }
}
