// crates/core/src/manager.rs
//! Bounded-concurrency job manager.
//!
//! Owns the job store, the FIFO queue, and the worker pool. Submission
//! always succeeds and returns an id; a fixed number of workers drain the
//! queue and run captures through the configured engine. A reaper task
//! evicts terminal records once they outlive their TTL.
//!
//! Locking is one `Mutex` around the whole store. Workers re-validate a
//! job under that lock before running it and again before recording the
//! outcome, so deletes racing against execution always converge on one
//! final state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capture::{CaptureEngine, CaptureError, CaptureOutput};
use crate::config::ManagerConfig;
use crate::job::{
    CancelHandle, DeleteOutcome, Job, JobSnapshot, JobStatus, ManagerStats, StatusCounts,
};
use crate::request::CaptureRequest;

/// Live worker pool. Present between `start` and `stop`.
struct PoolState {
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

pub struct JobManager {
    engine: Arc<dyn CaptureEngine>,
    config: ManagerConfig,
    jobs: Mutex<HashMap<Uuid, Job>>,
    queue_tx: mpsc::UnboundedSender<Uuid>,
    /// Workers take turns holding this while they wait for the next id.
    queue_rx: Mutex<mpsc::UnboundedReceiver<Uuid>>,
    pool: Mutex<Option<PoolState>>,
}

impl JobManager {
    pub fn new(engine: Arc<dyn CaptureEngine>, config: ManagerConfig) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            config,
            jobs: Mutex::new(HashMap::new()),
            queue_tx,
            queue_rx: Mutex::new(queue_rx),
            pool: Mutex::new(None),
        }
    }

    /// Register a job and enqueue it. Never blocks on pool capacity.
    pub async fn submit(&self, request: CaptureRequest) -> Uuid {
        let job = Job::new(request);
        let id = job.id;

        let mut jobs = self.jobs.lock().await;
        jobs.insert(id, job);
        if self.queue_tx.send(id).is_err() {
            // The receiver lives on self, so this only fires mid-teardown.
            warn!("Job queue closed, {} will never be picked up", id);
        }
        drop(jobs);

        info!("Job {} submitted", id);
        id
    }

    /// Snapshot of a job, or `None` for unknown/already-deleted ids.
    pub async fn status(&self, id: Uuid) -> Option<JobSnapshot> {
        let jobs = self.jobs.lock().await;
        jobs.get(&id).map(Job::snapshot)
    }

    /// Snapshot plus payload. The payload is only present once the job
    /// has completed.
    pub async fn result(&self, id: Uuid) -> Option<(JobSnapshot, Option<CaptureOutput>)> {
        let jobs = self.jobs.lock().await;
        jobs.get(&id).map(|job| (job.snapshot(), job.result.clone()))
    }

    /// Remove a job, cancelling it first if it is mid-capture.
    ///
    /// Pending and terminal jobs are removed outright. A running job is
    /// signalled and given `cancel_grace` to unwind; whether or not it
    /// does, the record is marked `Cancelled` and kept for inspection.
    /// Returns `None` for unknown ids.
    pub async fn delete(&self, id: Uuid) -> Option<DeleteOutcome> {
        let mut jobs = self.jobs.lock().await;
        let status = jobs.get(&id)?.status;

        match status {
            JobStatus::Pending => {
                jobs.remove(&id);
                info!("Job {} deleted before it ran", id);
                Some(DeleteOutcome::Deleted)
            }
            JobStatus::Running => {
                let handle = jobs.get_mut(&id).and_then(|job| job.cancel.take());
                drop(jobs);

                match handle {
                    Some(handle) => {
                        handle.token.cancel();
                        // Resolves as soon as the worker releases the record.
                        let _ = tokio::time::timeout(self.config.cancel_grace, handle.done).await;
                    }
                    None => {
                        // A concurrent delete already took the handle; give
                        // the worker the same window before writing.
                        tokio::time::sleep(self.config.cancel_grace).await;
                    }
                }

                let mut jobs = self.jobs.lock().await;
                if let Some(job) = jobs.get_mut(&id) {
                    job.status = JobStatus::Cancelled;
                    job.error = Some("deleted by caller".to_string());
                    job.completed_at = Some(Utc::now());
                    job.progress = 0;
                }
                info!("Job {} cancelled by delete", id);
                Some(DeleteOutcome::CancelRequested)
            }
            _ => {
                jobs.remove(&id);
                info!("Job {} record deleted ({})", id, status);
                Some(DeleteOutcome::Deleted)
            }
        }
    }

    /// Pool and store gauges, all read under one lock so they are
    /// mutually consistent.
    pub async fn stats(&self) -> ManagerStats {
        let jobs = self.jobs.lock().await;
        let mut counts = StatusCounts::default();
        for job in jobs.values() {
            match job.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
                JobStatus::Cancelled => counts.cancelled += 1,
            }
        }
        counts.total = jobs.len();

        ManagerStats {
            max_workers: self.config.workers,
            running: counts.running,
            queued: counts.pending,
            counts,
        }
    }

    /// Drop terminal records older than the configured TTL. Age is
    /// measured from creation, not completion. Returns how many went.
    pub async fn reap_expired(&self) -> usize {
        // A TTL past i64 millis never expires; `as` would wrap it negative.
        let ttl_ms = i64::try_from(self.config.job_ttl.as_millis()).unwrap_or(i64::MAX);
        let now = Utc::now();

        let mut jobs = self.jobs.lock().await;
        let expired: Vec<Uuid> = jobs
            .values()
            .filter(|job| job.status.is_terminal())
            .filter(|job| (now - job.created_at).num_milliseconds() > ttl_ms)
            .map(|job| job.id)
            .collect();
        for id in &expired {
            jobs.remove(id);
        }

        if !expired.is_empty() {
            info!("Cleaned up {} expired jobs", expired.len());
        }
        expired.len()
    }

    // ========================================================================
    // Pool lifecycle
    // ========================================================================

    /// Spawn the workers and the reaper. Idempotent while running.
    pub async fn start(self: &Arc<Self>) {
        let mut pool = self.pool.lock().await;
        if pool.is_some() {
            warn!("Job manager already running");
            return;
        }

        let shutdown = CancellationToken::new();
        let mut tasks = Vec::with_capacity(self.config.workers + 1);
        for index in 0..self.config.workers {
            tasks.push(self.spawn_worker(index, shutdown.clone()));
        }
        tasks.push(self.spawn_reaper(shutdown.clone()));
        *pool = Some(PoolState { shutdown, tasks });

        info!(
            "Job manager started: {} workers, engine {}",
            self.config.workers,
            self.engine.name()
        );
    }

    /// Stop the pool. Queued jobs stay pending; a job mid-capture is
    /// abandoned where it stands and its record may remain `Running`.
    pub async fn stop(&self) {
        let state = {
            let mut pool = self.pool.lock().await;
            pool.take()
        };
        let Some(state) = state else {
            return;
        };

        state.shutdown.cancel();
        for task in state.tasks {
            let _ = task.await;
        }
        info!("Job manager stopped");
    }

    fn spawn_worker(self: &Arc<Self>, index: usize, shutdown: CancellationToken) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            debug!("Worker {} ready", index);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = manager.run_next() => {}
                }
            }
            debug!("Worker {} stopped", index);
        })
    }

    fn spawn_reaper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.config.reap_interval);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        manager.reap_expired().await;
                    }
                }
            }
            debug!("Reaper stopped");
        })
    }

    /// One worker iteration: wait for an id, claim it, run the capture,
    /// record the outcome.
    async fn run_next(&self) {
        let id = {
            let mut queue = self.queue_rx.lock().await;
            match queue.recv().await {
                Some(id) => id,
                // The sender lives on self, so a closed queue means the
                // manager is being torn down. Park until shutdown wins.
                None => std::future::pending::<Uuid>().await,
            }
        };

        // Claim. The record may have been deleted or touched since it was
        // enqueued; anything not pending is stale and gets dropped here.
        let (request, token, done_tx) = {
            let mut jobs = self.jobs.lock().await;
            let Some(job) = jobs.get_mut(&id) else {
                debug!("Job {} vanished before it ran, skipping", id);
                return;
            };
            if job.status != JobStatus::Pending {
                debug!("Job {} is {}, not pending, skipping", id, job.status);
                return;
            }

            job.status = JobStatus::Running;
            job.started_at = Some(Utc::now());
            let token = CancellationToken::new();
            let (done_tx, done_rx) = oneshot::channel::<()>();
            job.cancel = Some(CancelHandle {
                token: token.clone(),
                done: done_rx,
            });
            (job.request.clone(), token, done_tx)
        };

        info!("Job {} running: {}", id, request.url);
        let started = Instant::now();

        // The token is checked here as well as inside the engine, so even
        // an engine that never looks at it gets dropped on cancel.
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(CaptureError::Cancelled),
            result = self.engine.capture(&request, token.clone()) => result,
        };

        {
            let mut jobs = self.jobs.lock().await;
            match jobs.get_mut(&id) {
                None => debug!("Job {} was removed mid-run, dropping outcome", id),
                Some(job) if job.status != JobStatus::Running => {
                    debug!("Job {} already finalized as {}", id, job.status)
                }
                Some(_) if token.is_cancelled() => {
                    // The deleter owns the terminal write for this job.
                    debug!("Job {} unwound after cancel in {:?}", id, started.elapsed())
                }
                Some(job) => {
                    job.cancel = None;
                    job.completed_at = Some(Utc::now());
                    match outcome {
                        Ok(output) => {
                            job.status = JobStatus::Completed;
                            job.progress = 100;
                            info!(
                                "Job {} completed in {:?} ({} bytes)",
                                id,
                                started.elapsed(),
                                output.png.len()
                            );
                            job.result = Some(output);
                        }
                        Err(err) => {
                            job.status = JobStatus::Failed;
                            job.error = Some(err.to_string());
                            warn!("Job {} failed after {:?}: {}", id, started.elapsed(), err);
                        }
                    }
                }
            }
        }
        // Store lock is released above; only now let any waiting deleter
        // proceed, so it always observes the final record.
        drop(done_tx);
    }
}
