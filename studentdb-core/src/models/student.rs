//! Creating a student: raw input in, validated `NewStudent` out

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::fields::{self, *};
use super::{Gender, StudentStatus, ValidationErrors};

/// Untrusted create payload (HTTP body, CLI, generator).
///
/// Every field is optional here so that validation can report all missing
/// fields together. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentInput {
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

/// A student record that satisfied every rule and is ready to insert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStudent {
    pub student_id: String,
    pub name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: NaiveDate,
    pub enrollment_date: NaiveDate,
    pub major: String,
    pub class_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gpa: Option<f64>,
    pub status: StudentStatus,
    pub scholarship_amount: f64,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

impl NewStudent {
    /// Validate against the local calendar date.
    pub fn validate(input: &StudentInput) -> Result<Self, ValidationErrors> {
        Self::validate_on(input, Local::now().date_naive())
    }

    /// Validate with an explicit "today", which anchors the age window and
    /// the default enrollment date.
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use studentdb_core::{NewStudent, StudentInput};
    ///
    /// let input = StudentInput {
    ///     student_id: Some("S2024001".into()),
    ///     name: Some("Zhang San".into()),
    ///     date_of_birth: Some("2005-08-15".into()),
    ///     enrollment_date: Some("2023-09-01".into()),
    ///     major: Some("Computer Science".into()),
    ///     class_name: Some("CS2023-01".into()),
    ///     ..Default::default()
    /// };
    /// let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    /// assert!(NewStudent::validate_on(&input, today).is_ok());
    /// ```
    pub fn validate_on(input: &StudentInput, today: NaiveDate) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let student_id = match input.student_id.as_deref() {
            Some(value) => fields::student_id(&mut errors, value),
            None => {
                errors.push(super::ValidationError::Missing { field: "student_id" });
                None
            }
        };
        let name = required_text(&mut errors, "name", input.name.as_deref(), NAME_MIN_LEN, NAME_MAX_LEN);
        let gender = input.gender.as_deref().and_then(|g| fields::gender(&mut errors, g));

        let date_of_birth = match input.date_of_birth.as_deref() {
            Some(value) => fields::date_of_birth(&mut errors, value, today),
            None => {
                errors.push(super::ValidationError::Missing { field: "date_of_birth" });
                None
            }
        };
        let enrollment_date = match input.enrollment_date.as_deref() {
            Some(value) => date(&mut errors, "enrollment_date", value),
            None => Some(today),
        };
        if let (Some(dob), Some(enrolled)) = (date_of_birth, enrollment_date) {
            enrollment_after_birth(&mut errors, dob, enrolled);
        }

        let major = required_text(&mut errors, "major", input.major.as_deref(), MAJOR_MIN_LEN, MAJOR_MAX_LEN);
        let class_name = required_text(
            &mut errors,
            "class_name",
            input.class_name.as_deref(),
            1,
            CLASS_NAME_MAX_LEN,
        );

        let email = input.email.as_deref().and_then(|e| fields::email(&mut errors, e));
        let phone = input.phone.as_deref().and_then(|p| fields::phone(&mut errors, "phone", p));
        let address = optional_text(&mut errors, "address", input.address.as_deref(), ADDRESS_MAX_LEN);
        let gpa = input.gpa.and_then(|g| fields::gpa(&mut errors, g));
        let status = match input.status.as_deref() {
            Some(value) => fields::status(&mut errors, value),
            None => Some(StudentStatus::default()),
        };
        let scholarship_amount = fields::scholarship_amount(&mut errors, input.scholarship_amount.unwrap_or(0.0));
        let emergency_contact_name = optional_text(
            &mut errors,
            "emergency_contact_name",
            input.emergency_contact_name.as_deref(),
            CONTACT_NAME_MAX_LEN,
        );
        let emergency_contact_phone = input
            .emergency_contact_phone
            .as_deref()
            .and_then(|p| fields::phone(&mut errors, "emergency_contact_phone", p));

        match (
            student_id,
            name,
            date_of_birth,
            enrollment_date,
            major,
            class_name,
            status,
            scholarship_amount,
        ) {
            (
                Some(student_id),
                Some(name),
                Some(date_of_birth),
                Some(enrollment_date),
                Some(major),
                Some(class_name),
                Some(status),
                Some(scholarship_amount),
            ) if errors.is_empty() => Ok(Self {
                student_id,
                name,
                gender,
                date_of_birth,
                enrollment_date,
                major,
                class_name,
                email,
                phone,
                address,
                gpa,
                status,
                scholarship_amount,
                emergency_contact_name,
                emergency_contact_phone,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn valid_input() -> StudentInput {
        StudentInput {
            student_id: Some("S2024001".into()),
            name: Some("张三".into()),
            gender: Some("male".into()),
            date_of_birth: Some("2005-08-15".into()),
            enrollment_date: Some("2023-09-01".into()),
            major: Some("计算机科学与技术".into()),
            class_name: Some("CS2023-01".into()),
            email: Some("zhangsan@university.edu".into()),
            phone: Some("+8613800138000".into()),
            address: Some("北京市海淀区中关村大街1号".into()),
            gpa: Some(3.75),
            status: None,
            scholarship_amount: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
        }
    }

    #[test]
    fn valid_student() {
        let student = NewStudent::validate_on(&valid_input(), today()).unwrap();
        assert_eq!(student.student_id, "S2024001");
        assert_eq!(student.gender, Some(Gender::Male));
        assert_eq!(student.gpa, Some(3.75));
        assert_eq!(student.status, StudentStatus::Active);
        assert_eq!(student.scholarship_amount, 0.0);
    }

    #[test]
    fn enrollment_defaults_to_today() {
        let input = StudentInput {
            enrollment_date: None,
            ..valid_input()
        };
        let student = NewStudent::validate_on(&input, today()).unwrap();
        assert_eq!(student.enrollment_date, today());
    }

    #[test]
    fn gender_is_optional() {
        let input = StudentInput {
            gender: None,
            ..valid_input()
        };
        let student = NewStudent::validate_on(&input, today()).unwrap();
        assert_eq!(student.gender, None);
    }

    #[test]
    fn invalid_age_too_young() {
        let input = StudentInput {
            date_of_birth: Some("2015-01-01".into()),
            ..valid_input()
        };
        let errors = NewStudent::validate_on(&input, today()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::AgeOutOfRange { age: 9, .. })));
    }

    #[test]
    fn invalid_age_too_old() {
        let input = StudentInput {
            date_of_birth: Some("1980-01-01".into()),
            ..valid_input()
        };
        let errors = NewStudent::validate_on(&input, today()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::AgeOutOfRange { age: 44, .. })));
    }

    #[test]
    fn enrollment_must_follow_birth() {
        let input = StudentInput {
            enrollment_date: Some("2005-08-15".into()),
            ..valid_input()
        };
        let errors = NewStudent::validate_on(&input, today()).unwrap_err();
        assert_eq!(
            errors.into_vec(),
            vec![ValidationError::DateOrder {
                earlier: "date_of_birth",
                later: "enrollment_date",
            }]
        );
    }

    #[test]
    fn reports_every_violation() {
        let input = StudentInput {
            student_id: Some("bad".into()),
            name: None,
            gender: Some("unknown".into()),
            gpa: Some(4.5),
            status: Some("expelled".into()),
            email: Some("nope".into()),
            ..valid_input()
        };
        let errors = NewStudent::validate_on(&input, today()).unwrap_err();
        for field in ["student_id", "name", "gender", "gpa", "status", "email"] {
            assert!(errors.has_field(field), "expected a violation on {field}");
        }
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn empty_input_lists_required_fields() {
        let errors = NewStudent::validate_on(&StudentInput::default(), today()).unwrap_err();
        let missing: Vec<_> = errors
            .iter()
            .filter_map(|e| match e {
                ValidationError::Missing { field } => Some(*field),
                _ => None,
            })
            .collect();
        assert_eq!(
            missing,
            vec!["student_id", "name", "date_of_birth", "major", "class_name"]
        );
    }

    #[test]
    fn negative_scholarship_rejected() {
        let input = StudentInput {
            scholarship_amount: Some(-1.0),
            ..valid_input()
        };
        let errors = NewStudent::validate_on(&input, today()).unwrap_err();
        assert!(errors.has_field("scholarship_amount"));
    }

    #[test]
    fn values_wider_than_their_columns_rejected() {
        let input = StudentInput {
            phone: Some(format!("+{}", "1".repeat(20))),
            emergency_contact_phone: Some("1".repeat(21)),
            scholarship_amount: Some(1.0e12),
            ..valid_input()
        };
        let errors = NewStudent::validate_on(&input, today()).unwrap_err();
        assert!(errors.has_field("phone"));
        assert!(errors.has_field("emergency_contact_phone"));
        assert!(errors.has_field("scholarship_amount"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn gpa_boundaries() {
        for gpa in [0.0, 4.0] {
            let input = StudentInput {
                gpa: Some(gpa),
                ..valid_input()
            };
            assert!(NewStudent::validate_on(&input, today()).is_ok());
        }
        let input = StudentInput {
            gpa: Some(4.1),
            ..valid_input()
        };
        assert!(NewStudent::validate_on(&input, today()).is_err());
    }

    #[test]
    fn rejects_unknown_json_fields() {
        let json = r#"{"student_id":"S2024001","id":7}"#;
        assert!(serde_json::from_str::<StudentInput>(json).is_err());
    }

    #[test]
    fn deserializes_json_body() {
        let json = r#"{
            "student_id": "S2024001",
            "name": "Zhang San",
            "date_of_birth": "2005-08-15",
            "enrollment_date": "2023-09-01",
            "major": "Computer Science",
            "class_name": "CS2023-01",
            "gpa": 3.75,
            "status": "graduated"
        }"#;
        let input: StudentInput = serde_json::from_str(json).unwrap();
        let student = NewStudent::validate_on(&input, today()).unwrap();
        assert_eq!(student.status, StudentStatus::Graduated);
    }

    mod properties {
        use super::*;
        use crate::models::age_on;
        use chrono::Duration;
        use proptest::prelude::*;

        proptest! {
            // Any accepted record has an age in the window and enrolls after birth
            #[test]
            fn accepted_records_hold_invariants(dob_offset in 0i64..20_000, enroll_offset in -20_000i64..20_000) {
                let dob = today() - Duration::days(dob_offset);
                let enrolled = dob + Duration::days(enroll_offset);
                let input = StudentInput {
                    date_of_birth: Some(dob.format("%Y-%m-%d").to_string()),
                    enrollment_date: Some(enrolled.format("%Y-%m-%d").to_string()),
                    ..valid_input()
                };
                match NewStudent::validate_on(&input, today()) {
                    Ok(student) => {
                        let age = age_on(student.date_of_birth, today());
                        prop_assert!((15..=30).contains(&age));
                        prop_assert!(student.enrollment_date > student.date_of_birth);
                    }
                    Err(errors) => {
                        let age = age_on(dob, today());
                        prop_assert!(!(15..=30).contains(&age) || enrolled <= dob);
                        prop_assert!(!errors.is_empty());
                    }
                }
            }
        }
    }
}
