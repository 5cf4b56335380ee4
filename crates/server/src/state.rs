// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use pageshot_core::{CaptureEngine, JobManager, ManagerConfig};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Job manager owning the store, queue and worker pool.
    pub manager: Arc<JobManager>,
    /// Capture engine, shared with the manager. Used directly by the
    /// synchronous screenshot route, which bypasses the queue.
    pub engine: Arc<dyn CaptureEngine>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    ///
    /// The manager is built around the given engine but not started;
    /// callers decide when the pool comes up.
    pub fn new(engine: Arc<dyn CaptureEngine>, config: ManagerConfig) -> Arc<Self> {
        let manager = Arc::new(JobManager::new(engine.clone(), config));
        Arc::new(Self {
            start_time: Instant::now(),
            manager,
            engine,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
