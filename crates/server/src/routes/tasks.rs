// crates/server/src/routes/tasks.rs
//! Task inspection and deletion endpoints.
//!
//! - GET    /task/{id}/status — Poll a job's lifecycle state
//! - GET    /task/{id}/result — Fetch the PNG once the job completed
//! - DELETE /task/{id}        — Remove a job, cancelling it if running

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use pageshot_core::{DeleteOutcome, JobSnapshot, JobStatus};

use crate::error::{ApiError, ApiResult};
use crate::routes::screenshot::png_response;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Result body for a job that is not done yet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPendingResponse {
    pub task_id: Uuid,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
}

/// Result body for a failed job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultFailedResponse {
    pub task_id: Uuid,
    pub status: JobStatus,
    pub message: String,
    pub error_details: Option<String>,
}

/// Response for a delete request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub task_id: Uuid,
    pub status: String,
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/task/{id}/status - Poll a job.
pub async fn get_task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<JobSnapshot>> {
    match state.manager.status(task_id).await {
        Some(snapshot) => Ok(Json(snapshot)),
        None => Err(ApiError::TaskNotFound(task_id)),
    }
}

/// GET /api/task/{id}/result - Fetch a job's result.
///
/// Completed jobs stream their PNG; failed jobs answer 500 with the
/// recorded error; anything still in flight answers 200 with a progress
/// body so pollers can keep waiting.
pub async fn get_task_result(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Response> {
    let Some((snapshot, payload)) = state.manager.result(task_id).await else {
        return Err(ApiError::TaskNotFound(task_id));
    };

    match snapshot.status {
        JobStatus::Failed => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ResultFailedResponse {
                task_id,
                status: snapshot.status,
                message: "Task failed".to_string(),
                error_details: snapshot.error_details,
            }),
        )
            .into_response()),
        JobStatus::Completed => {
            let Some(output) = payload else {
                return Err(ApiError::Internal(format!(
                    "completed task {} has no result",
                    task_id
                )));
            };
            Ok(png_response(
                output.png,
                &format!("screenshot_{}.png", task_id),
            ))
        }
        _ => Ok(Json(ResultPendingResponse {
            task_id,
            status: snapshot.status,
            progress: snapshot.progress,
            message: "Task not completed yet".to_string(),
        })
        .into_response()),
    }
}

/// DELETE /api/task/{id} - Remove a job.
///
/// A running job is cancelled and answered with 202 since its record
/// stays behind (marked cancelled); otherwise the record is gone and the
/// answer is 200.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Response> {
    match state.manager.delete(task_id).await {
        None => Err(ApiError::TaskNotFound(task_id)),
        Some(DeleteOutcome::CancelRequested) => Ok((
            StatusCode::ACCEPTED,
            Json(DeleteResponse {
                task_id,
                status: "cancelled".to_string(),
                message: "Cancellation requested".to_string(),
            }),
        )
            .into_response()),
        Some(DeleteOutcome::Deleted) => Ok(Json(DeleteResponse {
            task_id,
            status: "deleted".to_string(),
            message: "Task deleted".to_string(),
        })
        .into_response()),
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the task routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/task/{task_id}/status", get(get_task_status))
        .route("/task/{task_id}/result", get(get_task_result))
        .route("/task/{task_id}", delete(delete_task))
}

// ============================================================================
// Tests
// ============================================================================
