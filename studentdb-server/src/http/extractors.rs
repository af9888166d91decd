//! Custom Axum extractors

use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// Surrogate student id from the path
pub struct StudentPk(pub i32);

impl<S> FromRequestParts<S> for StudentPk
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::Rejected {
                status: StatusCode::BAD_REQUEST,
                message: e.body_text(),
            })?;

        match raw.parse::<i32>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(ApiError::Rejected {
                status: StatusCode::BAD_REQUEST,
                message: format!("invalid student id '{}': must be a positive integer", raw),
            }),
        }
    }
}

/// JSON body whose rejections use the API error shape
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Rejected {
                status: rejection.status(),
                message: rejection.body_text(),
            })?;
        Ok(Self(value))
    }
}
