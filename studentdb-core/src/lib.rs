//! studentdb-core: the validation layer for student records
//!
//! Everything that must hold before a record reaches the database lives here:
//! the raw input shapes, field rules, the validated `NewStudent` / `StudentPatch`
//! values, connection configuration, and the synthetic data generator.

pub mod config;
pub mod error;
pub mod generator;
pub mod models;

pub use config::{ConnectionProfile, DatabaseConfig};
pub use error::{CoreError, Result};
pub use generator::{DataGenerator, Locale};
pub use models::{
    age_on, check_gpa, Gender, MajorCount, NewStudent, Student, StudentInput, StudentPatch,
    StudentStatistics, StudentStatus, StudentUpdate, ValidationError, ValidationErrors,
};
