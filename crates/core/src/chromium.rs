// crates/core/src/chromium.rs
//! Headless Chromium capture engine.
//!
//! Shells out to a Chromium binary in headless screenshot mode. One
//! process per capture, killed on drop, so cancellation and timeout both
//! reap the browser.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::capture::{CaptureEngine, CaptureError, CaptureOutput};
use crate::request::CaptureRequest;

const SCREENSHOT_FILE: &str = "shot.png";

pub struct ChromiumEngine {
    binary_path: String,
}

impl ChromiumEngine {
    pub fn new() -> Self {
        Self {
            binary_path: "chromium".to_string(),
        }
    }

    /// Binary path from `PAGESHOT_CHROMIUM_BIN`, falling back to
    /// `chromium` on the PATH.
    pub fn from_env() -> Self {
        match std::env::var("PAGESHOT_CHROMIUM_BIN") {
            Ok(path) if !path.is_empty() => Self::new().with_binary_path(path),
            _ => Self::new(),
        }
    }

    pub fn with_binary_path(mut self, path: impl Into<String>) -> Self {
        self.binary_path = path.into();
        self
    }

    /// Command line for one capture, ending in the target URL.
    ///
    /// Explicit dimensions render at scale factor 1; presets use their
    /// native factor. `waitTimeSecs` becomes the virtual time budget so
    /// the page gets its settle window before the shot.
    fn build_args(request: &CaptureRequest, out_path: &std::path::Path) -> Vec<String> {
        let (width, height) = request.viewport();
        let scale = if request.width.is_some() || request.height.is_some() {
            1
        } else {
            request.device.scale_factor()
        };
        let budget_ms = (request.wait_time_secs.max(0.0) * 1000.0) as u64;

        vec![
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--hide-scrollbars".to_string(),
            format!("--window-size={},{}", width, height),
            format!("--force-device-scale-factor={}", scale),
            format!("--user-agent={}", request.effective_user_agent()),
            format!("--virtual-time-budget={}", budget_ms),
            format!("--screenshot={}", out_path.display()),
            request.url.clone(),
        ]
    }
}

impl Default for ChromiumEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate to at most `max` bytes, backing up to a char boundary so
/// multibyte browser output never splits mid-character.
fn clip_for_log(s: &str, max: usize) -> &str {
    let mut cut = s.len().min(max);
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}

#[async_trait]
impl CaptureEngine for ChromiumEngine {
    async fn capture(
        &self,
        request: &CaptureRequest,
        cancel: CancellationToken,
    ) -> Result<CaptureOutput, CaptureError> {
        if !request.timeout_secs.is_finite() || request.timeout_secs <= 0.0 {
            return Err(CaptureError::InvalidRequest(
                "timeoutSecs must be positive".to_string(),
            ));
        }
        // try, not from: a finite f64 can still overflow a Duration.
        let deadline = Duration::try_from_secs_f64(request.timeout_secs).map_err(|_| {
            CaptureError::InvalidRequest(format!(
                "timeoutSecs too large: {}",
                request.timeout_secs
            ))
        })?;

        if request.full_page {
            debug!(
                "fullPage requested for {}; headless CLI captures the viewport",
                request.url
            );
        }

        let start = Instant::now();
        // Dropped on every exit path, taking the PNG with it.
        let workdir = tempfile::tempdir()?;
        let out_path = workdir.path().join(SCREENSHOT_FILE);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(Self::build_args(request, &out_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Spawning {} for {}", self.binary_path, request.url);
        let child = cmd
            .spawn()
            .map_err(|e| CaptureError::SpawnFailed(e.to_string()))?;

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Capture of {} cancelled, killing browser", request.url);
                return Err(CaptureError::Cancelled);
            }
            result = tokio::time::timeout(deadline, child.wait_with_output()) => {
                match result {
                    Ok(Ok(output)) => output,
                    Ok(Err(e)) => return Err(CaptureError::Io(e)),
                    Err(_) => {
                        error!(
                            "Chromium timed out after {}s rendering {}",
                            request.timeout_secs, request.url
                        );
                        return Err(CaptureError::Timeout(request.timeout_secs as u64));
                    }
                }
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                "Chromium exited with {}: {}",
                output.status,
                clip_for_log(&stderr, 500)
            );
            return Err(CaptureError::BrowserFailed(format!(
                "{}: {}",
                output.status, stderr
            )));
        }

        let png = tokio::fs::read(&out_path).await?;
        if png.is_empty() {
            return Err(CaptureError::BrowserFailed(
                "browser produced no screenshot".to_string(),
            ));
        }

        debug!(
            "Captured {} ({} bytes) in {:?}",
            request.url,
            png.len(),
            start.elapsed()
        );
        Ok(CaptureOutput { png })
    }

    fn name(&self) -> &str {
        "chromium"
    }

    async fn health_check(&self) -> Result<(), CaptureError> {
        let output = Command::new(&self.binary_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| CaptureError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(CaptureError::BrowserFailed(
                "chromium --version failed".to_string(),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        debug!("Chromium available: {}", version.trim());
        Ok(())
    }
}
