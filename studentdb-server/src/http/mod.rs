//! HTTP layer
//!
//! Axum server with:
//! - CORS (localhost only by default)
//! - Request tracing
//! - Graceful shutdown
//! - JSON error responses, 422 with per-field details on validation failure

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{router, run_server, AppState, ServerConfig, ServerError};
