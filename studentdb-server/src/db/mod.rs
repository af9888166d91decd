//! Database layer - connection provider, repository, schema provisioning
//!
//! # Design Principles
//!
//! - Pooled connections passed in explicitly, no process-wide singleton
//! - Every repository operation is one unit of work (one transaction)
//! - Rely on DB constraints and ON CONFLICT, no check-then-insert
//! - Rows become typed `Student` values at the repository boundary

pub mod error;
pub mod pool;
pub mod repos;
pub mod schema;

pub use error::{DbError, DbResult};
pub use pool::{
    connect_options, connect_with_retry, create_pool, retry_transient, unit_of_work, ConnectionProvider,
};
pub use repos::*;
pub use schema::{create_student_table_on, table_columns_on, ColumnInfo, SchemaManager};
