//! Persisted student rows and aggregate views over them

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{age_on, Gender, StudentStatus};

/// A row of the `students` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i32,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Age in whole years on the given day.
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        age_on(self.date_of_birth, today)
    }

    /// Age in whole years on the local calendar date.
    pub fn age(&self) -> i32 {
        self.age_on(Local::now().date_naive())
    }
}

/// Number of students enrolled in a major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorCount {
    pub major: String,
    pub count: i64,
}

/// Summary returned by the repository's aggregate query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentStatistics {
    pub total_students: i64,
    pub active_students: i64,
    pub graduated_students: i64,
    /// Rounded to two decimals; `None` when no student has a GPA
    pub average_gpa: Option<f64>,
    /// At most five majors, largest first
    pub top_majors: Vec<MajorCount>,
}

impl StudentStatistics {
    pub fn is_empty(&self) -> bool {
        self.total_students == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_relative_to_fixed_day() {
        let now = Utc::now();
        let student = Student {
            id: 1,
            student_id: "S2024001".into(),
            name: "Zhang San".into(),
            gender: None,
            date_of_birth: NaiveDate::from_ymd_opt(2005, 8, 15).unwrap(),
            enrollment_date: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
            major: "Computer Science".into(),
            class_name: "CS2023-01".into(),
            email: None,
            phone: None,
            address: None,
            gpa: Some(3.75),
            status: StudentStatus::Active,
            scholarship_amount: 0.0,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(student.age_on(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()), 18);
    }

    #[test]
    fn statistics_serialize_absent_average_as_null() {
        let stats = StudentStatistics {
            total_students: 0,
            active_students: 0,
            graduated_students: 0,
            average_gpa: None,
            top_majors: vec![],
        };
        assert!(stats.is_empty());
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json["average_gpa"].is_null());
        assert_eq!(json["top_majors"], serde_json::json!([]));
    }
}
