// crates/server/src/routes/system.rs
//! System statistics endpoint.
//!
//! Combines a host CPU/memory sample with the job manager's counters so
//! operators can see pool saturation and tracked-job totals at a glance.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sysinfo::System;

use pageshot_core::{ManagerStats, StatusCounts};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Host resource usage sample.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemUsage {
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

/// Worker pool occupancy.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskManagerInfo {
    pub max_concurrent_tasks: usize,
    pub current_running_tasks: usize,
    pub tasks_in_queue: usize,
}

/// Per-status totals for every job still tracked in memory.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksOverview {
    pub pending_tracked: usize,
    pub running_tracked: usize,
    pub completed_tracked: usize,
    pub failed_tracked: usize,
    pub cancelled_tracked: usize,
    pub total_tracked_in_memory: usize,
}

/// Full stats payload.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatsResponse {
    pub system: SystemUsage,
    pub task_manager: TaskManagerInfo,
    pub tasks_overview: TasksOverview,
}

impl From<ManagerStats> for TaskManagerInfo {
    fn from(stats: ManagerStats) -> Self {
        Self {
            max_concurrent_tasks: stats.max_workers,
            current_running_tasks: stats.running,
            tasks_in_queue: stats.queued,
        }
    }
}

impl From<StatusCounts> for TasksOverview {
    fn from(counts: StatusCounts) -> Self {
        Self {
            pending_tracked: counts.pending,
            running_tracked: counts.running,
            completed_tracked: counts.completed,
            failed_tracked: counts.failed,
            cancelled_tracked: counts.cancelled,
            total_tracked_in_memory: counts.total,
        }
    }
}

// ============================================================================
// Sampling
// ============================================================================

/// Sample host CPU and memory usage.
///
/// Blocks for sysinfo's minimum CPU measurement interval, so it should be
/// called from `tokio::task::spawn_blocking`.
pub fn sample_system_usage() -> SystemUsage {
    let mut sys = System::new();
    sys.refresh_memory();

    // Two refreshes separated by the minimum interval, or the CPU reading
    // is always zero.
    sys.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();

    let total = sys.total_memory();
    let memory_percent = if total > 0 {
        (sys.used_memory() as f32 / total as f32) * 100.0
    } else {
        0.0
    };

    SystemUsage {
        cpu_percent: sys.global_cpu_usage(),
        memory_percent,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/system/stats - Host usage plus job manager counters.
pub async fn get_system_stats(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SystemStatsResponse>> {
    let system = tokio::task::spawn_blocking(sample_system_usage)
        .await
        .map_err(|e| ApiError::Internal(format!("stats sampler panicked: {}", e)))?;

    let stats = state.manager.stats().await;

    Ok(Json(SystemStatsResponse {
        system,
        task_manager: stats.into(),
        tasks_overview: stats.counts.into(),
    }))
}

// ============================================================================
// Router
// ============================================================================

/// Create the system routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/system/stats", get(get_system_stats))
}

// ============================================================================
// Tests
// ============================================================================
