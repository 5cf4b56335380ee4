// crates/server/src/testing.rs
//! Fake capture engines and request helpers shared by the server tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use pageshot_core::{
    CaptureEngine, CaptureError, CaptureOutput, CaptureRequest, ManagerConfig,
};

use crate::state::AppState;

pub(crate) const TEST_PNG: &[u8] = b"\x89PNG\r\n\x1a\ntest";

/// Succeeds immediately with `TEST_PNG`.
pub(crate) struct InstantEngine;

#[async_trait]
impl CaptureEngine for InstantEngine {
    async fn capture(
        &self,
        _request: &CaptureRequest,
        _cancel: CancellationToken,
    ) -> Result<CaptureOutput, CaptureError> {
        Ok(CaptureOutput {
            png: TEST_PNG.to_vec(),
        })
    }

    fn name(&self) -> &str {
        "instant"
    }

    async fn health_check(&self) -> Result<(), CaptureError> {
        Ok(())
    }
}

/// Always fails with a browser error.
pub(crate) struct FailEngine;

#[async_trait]
impl CaptureEngine for FailEngine {
    async fn capture(
        &self,
        _request: &CaptureRequest,
        _cancel: CancellationToken,
    ) -> Result<CaptureOutput, CaptureError> {
        Err(CaptureError::BrowserFailed("render blew up".to_string()))
    }

    fn name(&self) -> &str {
        "fail"
    }

    async fn health_check(&self) -> Result<(), CaptureError> {
        Ok(())
    }
}

/// Sleeps long enough that jobs stay visibly running during a test.
pub(crate) struct SleepEngine(pub Duration);

#[async_trait]
impl CaptureEngine for SleepEngine {
    async fn capture(
        &self,
        _request: &CaptureRequest,
        _cancel: CancellationToken,
    ) -> Result<CaptureOutput, CaptureError> {
        tokio::time::sleep(self.0).await;
        Ok(CaptureOutput {
            png: TEST_PNG.to_vec(),
        })
    }

    fn name(&self) -> &str {
        "sleep"
    }

    async fn health_check(&self) -> Result<(), CaptureError> {
        Ok(())
    }
}

/// Reports a capture timeout without actually waiting.
pub(crate) struct TimeoutEngine;

#[async_trait]
impl CaptureEngine for TimeoutEngine {
    async fn capture(
        &self,
        _request: &CaptureRequest,
        _cancel: CancellationToken,
    ) -> Result<CaptureOutput, CaptureError> {
        Err(CaptureError::Timeout(5))
    }

    fn name(&self) -> &str {
        "timeout"
    }

    async fn health_check(&self) -> Result<(), CaptureError> {
        Ok(())
    }
}

/// App state around the given engine, pool not yet started.
pub(crate) fn test_state(engine: Arc<dyn CaptureEngine>) -> Arc<AppState> {
    let config = ManagerConfig {
        workers: 1,
        cancel_grace: Duration::from_millis(200),
        ..ManagerConfig::default()
    };
    AppState::new(engine, config)
}

/// App state with a running worker pool.
pub(crate) async fn started_state(engine: Arc<dyn CaptureEngine>) -> Arc<AppState> {
    let state = test_state(engine);
    state.manager.start().await;
    state
}

pub(crate) async fn do_get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = send(app, Method::GET, uri, None).await;
    split(response).await
}

pub(crate) async fn do_post_json(app: Router, uri: &str, json_body: &str) -> (StatusCode, String) {
    let response = send(app, Method::POST, uri, Some(json_body.to_string())).await;
    split(response).await
}

pub(crate) async fn do_delete(app: Router, uri: &str) -> (StatusCode, String) {
    let response = send(app, Method::DELETE, uri, None).await;
    split(response).await
}

/// Raw response, for tests that need headers or binary bodies.
pub(crate) async fn send(app: Router, method: Method, uri: &str, body: Option<String>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json)
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub(crate) async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn split(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let bytes = body_bytes(response).await;
    (status, String::from_utf8(bytes).unwrap())
}
