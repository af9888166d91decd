//! studentdb-server: Postgres persistence and HTTP API for student records
//!
//! The repository is the only code that issues SQL against `students`.
//! Everything else (the HTTP routes here, the CLI next door) goes through it.

pub mod db;
pub mod http;
pub mod models;

pub use db::{ConnectionProvider, DbError, SchemaManager, StudentRepo};
pub use models::{Paginated, Pagination};
