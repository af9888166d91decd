//! Student endpoints
//!
//! Bodies are validated before any query runs; a rejected body never touches
//! the database.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use studentdb_core::{NewStudent, Student, StudentInput, StudentPatch, StudentStatistics, StudentUpdate};

use crate::db::StudentRepo;
use crate::http::error::ApiError;
use crate::http::extractors::{StudentPk, ValidJson};
use crate::http::server::AppState;
use crate::models::{Paginated, Pagination, PaginationParams};

const DEFAULT_TOP_LIMIT: i64 = 10;
const MAX_TOP_LIMIT: i64 = 100;

/// Student record plus its current age
#[derive(Debug, Serialize)]
pub struct StudentResponse {
    #[serde(flatten)]
    pub student: Student,
    pub age: i32,
}

impl From<Student> for StudentResponse {
    fn from(student: Student) -> Self {
        Self {
            age: student.age(),
            student,
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopParams {
    pub limit: Option<i64>,
}

fn not_found(id: i32) -> ApiError {
    ApiError::NotFound {
        resource: "student",
        id: id.to_string(),
    }
}

/// GET /students - list students with pagination
async fn list_students(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<StudentResponse>>, ApiError> {
    let page = Pagination::from(params);
    let result = StudentRepo::new(&state.pool).list(page).await?;
    Ok(Json(result.map(StudentResponse::from)))
}

/// POST /students - create a student
///
/// An existing `student_id` is not an error: the stored record is returned
/// unchanged.
async fn create_student(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<StudentInput>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = NewStudent::validate(&input)?;
    let (record, created) = StudentRepo::new(&state.pool)
        .insert_or_get(&student)
        .await?
        .ok_or_else(|| ApiError::Conflict {
            message: format!("student '{}' was removed while being created", student.student_id),
        })?;

    if !created {
        tracing::debug!(student_id = %student.student_id, "create hit existing student");
    }
    Ok(Json(StudentResponse::from(record)))
}

/// GET /students/{id}
async fn get_student(
    State(state): State<Arc<AppState>>,
    StudentPk(id): StudentPk,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = StudentRepo::new(&state.pool)
        .get_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(StudentResponse::from(student)))
}

/// PATCH /students/{id} - update the supplied fields only
async fn update_student(
    State(state): State<Arc<AppState>>,
    StudentPk(id): StudentPk,
    ValidJson(update): ValidJson<StudentUpdate>,
) -> Result<Json<StudentResponse>, ApiError> {
    let patch = StudentPatch::validate(&update)?;
    let student = StudentRepo::new(&state.pool)
        .update_fields(id, &patch)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(StudentResponse::from(student)))
}

/// DELETE /students/{id}
async fn delete_student(
    State(state): State<Arc<AppState>>,
    StudentPk(id): StudentPk,
) -> Result<Json<StatusResponse>, ApiError> {
    if StudentRepo::new(&state.pool).delete(id).await? {
        Ok(Json(StatusResponse { status: "ok" }))
    } else {
        Err(not_found(id))
    }
}

/// GET /students/top?limit=N - highest GPAs first
async fn top_students(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopParams>,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT);
    let students = StudentRepo::new(&state.pool).list_top_by_gpa(limit).await?;
    Ok(Json(students.into_iter().map(StudentResponse::from).collect()))
}

/// GET /students/stats
async fn statistics(State(state): State<Arc<AppState>>) -> Result<Json<StudentStatistics>, ApiError> {
    let stats = StudentRepo::new(&state.pool).aggregate_statistics().await?;
    Ok(Json(stats))
}

/// Student routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route("/students/stats", get(statistics))
        .route("/students/top", get(top_students))
        .route(
            "/students/{id}",
            get(get_student).patch(update_student).delete(delete_student),
        )
}
