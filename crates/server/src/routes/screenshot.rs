// crates/server/src/routes/screenshot.rs
//! Screenshot submission endpoints.
//!
//! - POST /screenshot/submit — Queue a capture job, return its id
//! - POST /screenshot/sync   — Capture inline and stream the PNG back

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use pageshot_core::CaptureRequest;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Response for a queued screenshot job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub task_id: Uuid,
    pub status: String,
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/screenshot/submit - Queue a screenshot job.
///
/// Validation failures are rejected here; everything else is accepted and
/// the job id returned immediately, before any capture work happens.
pub async fn submit_screenshot(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CaptureRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    request.validate().map_err(ApiError::BadRequest)?;

    let task_id = state.manager.submit(request).await;
    Ok(Json(SubmitResponse {
        task_id,
        status: "submitted".to_string(),
        message: "Screenshot task submitted".to_string(),
    }))
}

/// POST /api/screenshot/sync - Capture a screenshot inline.
///
/// Goes straight to the engine, bypassing the queue and the worker pool,
/// so it is not bounded by pool capacity. The request's own timeout
/// applies; hitting it maps to 504.
pub async fn sync_screenshot(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CaptureRequest>,
) -> ApiResult<Response> {
    request.validate().map_err(ApiError::BadRequest)?;

    let output = state
        .engine
        .capture(&request, CancellationToken::new())
        .await?;
    Ok(png_response(output.png, "screenshot.png"))
}

/// PNG download response, forced to attachment like the async result.
pub(crate) fn png_response(png: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        png,
    )
        .into_response()
}

// ============================================================================
// Router
// ============================================================================

/// Create the screenshot routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/screenshot/submit", post(submit_screenshot))
        .route("/screenshot/sync", post(sync_screenshot))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        body_bytes, do_post_json, send, started_state, test_state, InstantEngine, TimeoutEngine,
        TEST_PNG,
    };
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_submit_returns_task_id() {
        let state = started_state(Arc::new(InstantEngine)).await;
        let app = crate::create_app(state.clone());

        let (status, body) =
            do_post_json(app, "/api/screenshot/submit", r#"{"url": "https://example.com"}"#).await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "submitted");
        assert!(json["taskId"].is_string());
        assert!(json["message"].as_str().unwrap().contains("submitted"));

        state.manager.stop().await;
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_url() {
        let state = test_state(Arc::new(InstantEngine));
        let app = crate::create_app(state);

        let (status, body) =
            do_post_json(app, "/api/screenshot/submit", r#"{"url": "ftp://example.com"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Bad request");
    }

    #[tokio::test]
    async fn test_submit_rejects_oversized_timeout() {
        let state = test_state(Arc::new(InstantEngine));
        let app = crate::create_app(state);

        // Parses as f64 but overflows a Duration; must bounce at the
        // door instead of reaching a worker.
        let (status, body) = do_post_json(
            app,
            "/api/screenshot/submit",
            r#"{"url": "https://example.com", "timeoutSecs": 1e30}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Bad request");
        assert!(json["details"].as_str().unwrap().contains("timeoutSecs"));
    }

    #[tokio::test]
    async fn test_submit_without_body_fails() {
        let state = test_state(Arc::new(InstantEngine));
        let app = crate::create_app(state);

        let response = send(app, Method::POST, "/api/screenshot/submit", None).await;
        assert!(
            response.status().is_client_error(),
            "Expected 4xx client error, got {}",
            response.status()
        );
    }

    #[tokio::test]
    async fn test_sync_streams_png() {
        let state = test_state(Arc::new(InstantEngine));
        let app = crate::create_app(state);

        let response = send(
            app,
            Method::POST,
            "/api/screenshot/sync",
            Some(r#"{"url": "https://example.com"}"#.to_string()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=screenshot.png"
        );
        assert_eq!(body_bytes(response).await, TEST_PNG);
    }

    #[tokio::test]
    async fn test_sync_timeout_maps_to_504() {
        let state = test_state(Arc::new(TimeoutEngine));
        let app = crate::create_app(state);

        let (status, body) =
            do_post_json(app, "/api/screenshot/sync", r#"{"url": "https://example.com"}"#).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Screenshot timed out");
    }

    #[test]
    fn test_submit_response_wire_casing() {
        let response = SubmitResponse {
            task_id: Uuid::nil(),
            status: "submitted".to_string(),
            message: "Screenshot task submitted".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"taskId\""));
        assert!(!json.contains("task_id"));
    }
}
