// crates/core/src/config.rs
//! Tunables for the job manager.

use std::time::Duration;

use tracing::warn;

/// Knobs controlling the worker pool and record retention.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Number of concurrent capture workers.
    pub workers: usize,
    /// How long finished job records are kept before the reaper drops them.
    pub job_ttl: Duration,
    /// How often the reaper scans for expired records.
    pub reap_interval: Duration,
    /// How long a delete waits for a running job to acknowledge
    /// cancellation before its record is finalized anyway.
    pub cancel_grace: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            job_ttl: Duration::from_secs(600),
            reap_interval: Duration::from_secs(1),
            cancel_grace: Duration::from_secs(1),
        }
    }
}

impl ManagerConfig {
    /// Config from the environment, sized to the machine.
    ///
    /// `PAGESHOT_WORKERS` overrides the worker count (default: available
    /// cores), `PAGESHOT_JOB_TTL_SECS` overrides record retention.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.workers = match env_parse::<usize>("PAGESHOT_WORKERS") {
            Some(n) => n.max(1),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(config.workers),
        };

        if let Some(secs) = env_parse::<u64>("PAGESHOT_JOB_TTL_SECS") {
            config.job_ttl = Duration::from_secs(secs);
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}
