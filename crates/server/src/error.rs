// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pageshot_core::CaptureError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::TaskNotFound(id) => {
                tracing::warn!(task_id = %id, "Task not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Task not found", format!("Task ID: {}", id)),
                )
            }
            ApiError::Capture(capture_err) => {
                let (status, error_msg) = match capture_err {
                    CaptureError::Timeout(secs) => {
                        tracing::error!(timeout_secs = %secs, "Capture timed out");
                        (StatusCode::GATEWAY_TIMEOUT, "Screenshot timed out")
                    }
                    CaptureError::SpawnFailed(msg) => {
                        tracing::error!(error = %msg, "Browser failed to start");
                        (StatusCode::INTERNAL_SERVER_ERROR, "Browser unavailable")
                    }
                    CaptureError::BrowserFailed(msg) => {
                        tracing::error!(error = %msg, "Browser failed to render");
                        (StatusCode::INTERNAL_SERVER_ERROR, "Screenshot failed")
                    }
                    CaptureError::Cancelled => {
                        tracing::warn!("Capture cancelled");
                        (StatusCode::INTERNAL_SERVER_ERROR, "Capture cancelled")
                    }
                    CaptureError::InvalidRequest(msg) => {
                        tracing::warn!(error = %msg, "Invalid capture request");
                        (StatusCode::BAD_REQUEST, "Invalid capture request")
                    }
                    CaptureError::Io(source) => {
                        tracing::error!(error = %source, "IO error during capture");
                        (StatusCode::INTERNAL_SERVER_ERROR, "IO error during capture")
                    }
                };
                (
                    status,
                    ErrorResponse::with_details(error_msg, capture_err.to_string()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;

    /// Helper to extract status code and body from a response
    async fn extract_response(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        (status, error_response)
    }

    #[tokio::test]
    async fn test_task_not_found_returns_404() {
        let id = Uuid::new_v4();
        let error = ApiError::TaskNotFound(id);
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Task not found");
        assert!(body.details.unwrap().contains(&id.to_string()));
    }

    #[tokio::test]
    async fn test_capture_timeout_returns_504() {
        let error = ApiError::Capture(CaptureError::Timeout(30));
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body.error, "Screenshot timed out");
        assert!(body.details.unwrap().contains("30"));
    }

    #[tokio::test]
    async fn test_spawn_failure_returns_500() {
        let error = ApiError::Capture(CaptureError::SpawnFailed("no such file".to_string()));
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Browser unavailable");
    }

    #[tokio::test]
    async fn test_browser_failure_returns_500() {
        let error = ApiError::Capture(CaptureError::BrowserFailed("exit 1".to_string()));
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Screenshot failed");
    }

    #[tokio::test]
    async fn test_invalid_capture_request_returns_400() {
        let error = ApiError::Capture(CaptureError::InvalidRequest("bad url".to_string()));
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Invalid capture request");
    }

    #[tokio::test]
    async fn test_bad_request_returns_400() {
        let error = ApiError::BadRequest("url must be http(s)".to_string());
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Bad request");
        assert!(body.details.unwrap().contains("http(s)"));
    }

    #[tokio::test]
    async fn test_internal_error_returns_500() {
        let error = ApiError::Internal("Something went wrong".to_string());
        let response = error.into_response();
        let (status, body) = extract_response(response).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
        // Internal errors should NOT expose details to clients
        assert!(body.details.is_none());
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse::new("Test error");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"error\":\"Test error\""));
        assert!(!json.contains("details")); // None should be skipped

        let response = ErrorResponse::with_details("Test error", "More info");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"error\":\"Test error\""));
        assert!(json.contains("\"details\":\"More info\""));
    }

    #[test]
    fn test_api_error_from_capture_error() {
        let capture_err = CaptureError::Timeout(5);
        let api_err: ApiError = capture_err.into();
        assert!(matches!(api_err, ApiError::Capture(_)));
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Internal("oops".to_string());
        assert_eq!(err.to_string(), "Internal server error: oops");

        let err = ApiError::BadRequest("nope".to_string());
        assert_eq!(err.to_string(), "Bad request: nope");
    }
}
