// crates/core/src/capture.rs
//! Capture engine abstraction.
//!
//! The job manager never talks to a browser directly; it drives a
//! `CaptureEngine`. The production engine shells out to headless Chromium,
//! tests plug in lightweight fakes.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::request::CaptureRequest;

/// Finished capture. The payload is a rendered PNG.
#[derive(Debug, Clone)]
pub struct CaptureOutput {
    pub png: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to spawn browser process: {0}")]
    SpawnFailed(String),

    #[error("capture timed out after {0}s")]
    Timeout(u64),

    #[error("capture was cancelled")]
    Cancelled,

    #[error("browser exited abnormally: {0}")]
    BrowserFailed(String),

    #[error("invalid capture request: {0}")]
    InvalidRequest(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A way of turning a `CaptureRequest` into pixels.
///
/// Implementations must stop promptly when `cancel` fires; the returned
/// error in that case should be `CaptureError::Cancelled`. Engines are
/// shared across workers, so `&self` methods only.
#[async_trait]
pub trait CaptureEngine: Send + Sync {
    /// Render the page described by `request`.
    async fn capture(
        &self,
        request: &CaptureRequest,
        cancel: CancellationToken,
    ) -> Result<CaptureOutput, CaptureError>;

    /// Short engine identifier for logs.
    fn name(&self) -> &str;

    /// Cheap probe that the engine's backing binary is usable.
    async fn health_check(&self) -> Result<(), CaptureError>;
}
