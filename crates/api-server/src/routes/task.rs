//! Task API endpoints
//!
//! RESTful API for task CRUD operations.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info};

use weekplan_core::task::{DateRangeQuery, Task, TaskPayload, TaskRef, Upserted};
use weekplan_core::Error;

use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Status and client-facing message for a core error
fn map_error(err: Error) -> ApiError {
    match err {
        Error::InvalidInput(msg) | Error::Validation(msg) => {
            error_response(StatusCode::BAD_REQUEST, msg)
        }
        Error::TaskNotFound(_) => error_response(StatusCode::NOT_FOUND, "Task not found"),
        other => {
            error!("Task request failed: {}", other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

fn read_payload(
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<TaskPayload, ApiError> {
    payload
        .map(|Json(payload)| payload)
        .map_err(|rejection| error_response(StatusCode::BAD_REQUEST, rejection.body_text()))
}

fn parse_ref(raw: &str) -> Result<TaskRef, ApiError> {
    raw.parse().map_err(map_error)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tasks?start=YYYY-MM-DD&end=YYYY-MM-DD - Tasks within a date range
async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let Query(query) =
        query.map_err(|rejection| error_response(StatusCode::BAD_REQUEST, rejection.body_text()))?;
    let range = query.into_range().map_err(map_error)?;

    let tasks = state.tasks().list(&range).await.map_err(map_error)?;
    Ok(Json(tasks))
}

/// POST /api/tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let new = read_payload(payload)?.into_new_task().map_err(map_error)?;

    let task = state.tasks().create(new).await.map_err(map_error)?;
    info!("Created task {} for {}", task.id, task.date);
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/{id} - Get a single task
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    match parse_ref(&id)? {
        TaskRef::Persisted(id) => state.tasks().get(id).await.map(Json).map_err(map_error),
        TaskRef::Temporary(_) => Err(error_response(StatusCode::NOT_FOUND, "Task not found")),
    }
}

/// PUT /api/tasks/{id} - Update a task; a temporary id creates one
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TaskPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let target = parse_ref(&id)?;
    let changes = read_payload(payload)?.into_changes().map_err(map_error)?;

    match state.tasks().update(&target, changes).await.map_err(map_error)? {
        Upserted::Updated(task) => Ok((StatusCode::OK, Json(task))),
        Upserted::Created(task) => {
            info!("Created task {} in place of {}", task.id, target);
            Ok((StatusCode::CREATED, Json(task)))
        }
    }
}

/// DELETE /api/tasks/{id} - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let target = parse_ref(&id)?;
    state.tasks().delete(&target).await.map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}
