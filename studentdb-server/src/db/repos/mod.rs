//! Repository implementations for database access
//!
//! Repositories follow these patterns:
//! - Handle conflicts via ON CONFLICT (no check-then-insert)
//! - Run each operation inside one unit of work
//! - Return typed records, never raw rows

pub mod students;

pub use students::StudentRepo;
