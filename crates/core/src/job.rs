// crates/core/src/job.rs
//! Job records and their public snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::capture::CaptureOutput;
use crate::request::CaptureRequest;

/// Lifecycle of a job. `Pending` and `Running` are live, the rest are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Handle a worker leaves behind while its job runs.
///
/// `token` asks the capture to stop; `done` resolves when the worker has
/// released the job record, so a deleter can wait for the handover.
pub(crate) struct CancelHandle {
    pub token: CancellationToken,
    pub done: oneshot::Receiver<()>,
}

/// One tracked job. Lives in the manager's store from submit until the
/// reaper or a delete removes it.
pub(crate) struct Job {
    pub id: Uuid,
    pub request: CaptureRequest,
    pub status: JobStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<CaptureOutput>,
    pub error: Option<String>,
    pub cancel: Option<CancelHandle>,
}

impl Job {
    pub fn new(request: CaptureRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            status: JobStatus::Pending,
            progress: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            cancel: None,
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            task_id: self.id,
            status: self.status,
            progress: self.progress,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            error_details: self.error.clone(),
        }
    }
}

/// Point-in-time view of a job, safe to hand to callers. Timestamps are
/// RFC 3339; absent ones serialize as null so pollers see every field.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub task_id: Uuid,
    pub status: JobStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_details: Option<String>,
}

/// What a delete actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Record removed outright (was pending or already terminal).
    Deleted,
    /// Job was mid-capture; it was signalled and marked cancelled, and
    /// its record kept for inspection.
    CancelRequested,
}

/// Per-status record counts at one instant.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub total: usize,
}

/// Pool and store gauges for the stats endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerStats {
    pub max_workers: usize,
    /// Jobs currently executing in a worker.
    pub running: usize,
    /// Jobs waiting for a worker.
    pub queued: usize,
    pub counts: StatusCounts,
}
