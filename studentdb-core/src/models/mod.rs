//! Student models with validation at construction
//!
//! Raw input (`StudentInput`, `StudentUpdate`) is untrusted. The only way to
//! obtain a `NewStudent` or `StudentPatch` is through validation, which reports
//! every violated rule at once instead of stopping at the first.

pub mod enums;
pub mod fields;
pub mod patch;
pub mod record;
pub mod student;
pub mod validation;

pub use enums::{Gender, StudentStatus};
pub use fields::{age_on, check_gpa};
pub use patch::{StudentPatch, StudentUpdate};
pub use record::{MajorCount, Student, StudentStatistics};
pub use student::{NewStudent, StudentInput};
pub use validation::{ValidationError, ValidationErrors};
