// crates/core/src/request.rs
//! Typed capture parameters for a screenshot job.
//!
//! Every job carries one `CaptureRequest`; the engine decides how to honor
//! it. Device presets mirror common hardware so callers can say `"phone"`
//! instead of spelling out a viewport.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Device preset selecting a viewport and default user agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Pc,
    Phone,
    Tablet,
}

impl Device {
    /// Preset viewport in CSS pixels (width, height).
    pub fn viewport(self) -> (u32, u32) {
        match self {
            Device::Pc => (1920, 1080),
            // iPhone 12/13 Pro and iPad Pro 12.9" portrait.
            Device::Phone => (390, 844),
            Device::Tablet => (1024, 1366),
        }
    }

    /// Device pixel ratio for the preset.
    pub fn scale_factor(self) -> u8 {
        match self {
            Device::Pc => 1,
            Device::Phone => 3,
            Device::Tablet => 2,
        }
    }

    /// User agent sent when the request does not override it.
    pub fn default_user_agent(self) -> &'static str {
        match self {
            Device::Pc => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36"
            }
            Device::Phone => {
                "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) \
                 AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 \
                 Mobile/15E148 Safari/604.1"
            }
            Device::Tablet => {
                "Mozilla/5.0 (iPad; CPU OS 15_0 like Mac OS X) \
                 AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 \
                 Mobile/15E148 Safari/604.1"
            }
        }
    }
}

/// Parameters for one page capture.
///
/// `width`/`height` override the device preset when both are given;
/// a custom size always renders at scale factor 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    /// Page to render. Must be an http(s) URL.
    pub url: String,
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Overrides the device preset's user agent.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Capture the full page height instead of the viewport. Best-effort;
    /// engines that cannot honor it fall back to the viewport.
    #[serde(default)]
    pub full_page: bool,
    /// Settle time after load before the shot is taken.
    #[serde(default = "default_wait_time")]
    pub wait_time_secs: f64,
    /// Upper bound for the whole capture.
    #[serde(default = "default_timeout")]
    pub timeout_secs: f64,
}

fn default_wait_time() -> f64 {
    1.0
}

fn default_timeout() -> f64 {
    120.0
}

impl CaptureRequest {
    /// Build a request for `url` with preset defaults.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            device: Device::default(),
            width: None,
            height: None,
            user_agent: None,
            full_page: false,
            wait_time_secs: default_wait_time(),
            timeout_secs: default_timeout(),
        }
    }

    /// Effective viewport: explicit dimensions win over the preset.
    pub fn viewport(&self) -> (u32, u32) {
        let (preset_w, preset_h) = self.device.viewport();
        (self.width.unwrap_or(preset_w), self.height.unwrap_or(preset_h))
    }

    /// Effective user agent: explicit override wins over the preset.
    pub fn effective_user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .unwrap_or_else(|| self.device.default_user_agent())
    }

    /// Shallow validation of the parameter shape. Semantic validation of
    /// the page itself is the engine's problem.
    pub fn validate(&self) -> Result<(), String> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(format!("url must be http(s), got: {}", self.url));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err("width/height must be non-zero when given".to_string());
        }
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err("timeoutSecs must be positive".to_string());
        }
        // A Duration cannot hold more than u64::MAX seconds.
        if Duration::try_from_secs_f64(self.timeout_secs).is_err() {
            return Err(format!("timeoutSecs too large: {}", self.timeout_secs));
        }
        Ok(())
    }
}
