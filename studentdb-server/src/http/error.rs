//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use studentdb_core::ValidationErrors;

use crate::db::DbError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (422), one detail per violated rule
    Validation(ValidationErrors),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Database constraint rejected the write (409)
    Conflict { message: String },

    /// Database error (500, logged)
    Database(DbError),

    /// Request could not be read (bad path, malformed body)
    Rejected { status: StatusCode, message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(errors) => {
                let details: Vec<_> = errors
                    .iter()
                    .map(|e| json!({ "field": e.field(), "message": e.to_string() }))
                    .collect();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({
                        "error": "validation_error",
                        "message": errors.to_string(),
                        "details": details
                    }),
                )
            }
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": message
                }),
            ),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
            Self::Rejected { status, message } => (
                *status,
                json!({
                    "error": "invalid_request",
                    "message": message
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Validation(errors) => Self::Validation(errors),
            DbError::Constraint { constraint, message } => Self::Conflict {
                message: match constraint {
                    Some(name) => format!("{} ({})", message, name),
                    None => message,
                },
            },
            _ => Self::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use studentdb_core::ValidationError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_422_with_details() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::Missing { field: "name" });
        errors.push(ValidationError::AgeOutOfRange {
            age: 9,
            min: 15,
            max: 30,
        });

        let response = ApiError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "name");
        assert_eq!(body["details"][1]["field"], "date_of_birth");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err = ApiError::NotFound {
            resource: "student",
            id: "42".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "student '42' not found");
    }

    #[tokio::test]
    async fn constraint_violation_is_409() {
        let err = ApiError::from(DbError::Constraint {
            constraint: Some("students_email_key".into()),
            message: "duplicate key value violates unique constraint".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn database_error_hides_details() {
        let err = ApiError::from(DbError::from(sqlx::Error::PoolClosed));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "an internal error occurred");
    }
}
