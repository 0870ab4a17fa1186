//! Scheduled announcement refresh.
//!
//! Uses a Redis lock so only one instance recomputes the announcement
//! per tick when several servers run side by side.

use std::time::Duration;

use anyhow::{Context, Result};
use redis::Client as RedisClient;
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::announcements;
use crate::cache::CacheLayer;

/// Lock TTL in seconds (5 minutes).
const LOCK_TTL_SECS: u64 = 300;

/// Cron lock key in Redis.
const CRON_LOCK_KEY: &str = "cron:lock";

/// Result of a cron run.
#[derive(Debug, Clone)]
pub enum CronResult {
    /// Cron ran successfully.
    Completed {
        /// Tasks executed.
        tasks_run: Vec<String>,
        /// Duration of the run.
        duration_ms: u64,
    },
    /// Another instance is already running.
    Skipped,
    /// Cron failed with an error.
    Failed(String),
}

/// Cron service for scheduled operations.
pub struct CronService {
    redis: RedisClient,
    pool: PgPool,
    cache: CacheLayer,
}

impl CronService {
    /// Create a new cron service.
    pub fn new(redis: RedisClient, pool: PgPool, cache: CacheLayer) -> Self {
        Self { redis, pool, cache }
    }

    /// Run the scheduled jobs once.
    ///
    /// Acquires a distributed lock before running to ensure only one
    /// instance executes cron at a time.
    pub async fn run(&self) -> CronResult {
        let start = std::time::Instant::now();

        let lock_value = match self.acquire_lock().await {
            Ok(Some(v)) => v,
            Ok(None) => {
                debug!("cron lock held by another instance, skipping");
                return CronResult::Skipped;
            }
            Err(e) => {
                warn!(error = %e, "failed to acquire cron lock");
                return CronResult::Failed(e.to_string());
            }
        };

        info!("acquired cron lock, running tasks");

        let mut tasks_run = Vec::new();
        let outcome = announcements::cache_announcement(&self.pool, &self.cache).await;

        if let Err(e) = self.release_lock(&lock_value).await {
            warn!(error = %e, "failed to release cron lock");
        }

        match outcome {
            Ok(announcement) => {
                let state = if announcement.is_empty() { "cleared" } else { "set" };
                tasks_run.push(format!("announcement: {state}"));
            }
            Err(e) => {
                warn!(error = %e, "failed to refresh announcement");
                return CronResult::Failed(e.to_string());
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(duration_ms = duration_ms, tasks = ?tasks_run, "cron completed");

        CronResult::Completed {
            tasks_run,
            duration_ms,
        }
    }

    /// Run the jobs every `interval` until shutdown is signalled.
    pub async fn run_scheduler(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        info!(interval_secs = interval.as_secs(), "announcement scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let CronResult::Failed(e) = self.run().await {
                        warn!(error = %e, "scheduled cron run failed");
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender also means shutdown
                    if changed.is_err() || *shutdown.borrow() {
                        info!("announcement scheduler stopping");
                        break;
                    }
                }
            }
        }
    }

    /// Acquire the distributed cron lock.
    ///
    /// Returns the lock value if acquired, None if already held.
    async fn acquire_lock(&self) -> Result<Option<String>> {
        let lock_value = format!("{}:{}", hostname(), std::process::id());

        let mut conn = self
            .redis
            .get_multiplexed_async_connection()
            .await
            .context("failed to get Redis connection")?;

        // SET NX EX - set only if not exists, with expiry
        let result: Option<String> = redis::cmd("SET")
            .arg(CRON_LOCK_KEY)
            .arg(&lock_value)
            .arg("NX")
            .arg("EX")
            .arg(LOCK_TTL_SECS)
            .query_async(&mut conn)
            .await
            .context("failed to acquire lock")?;

        Ok(result.map(|_| lock_value))
    }

    /// Release the distributed cron lock if we still own it.
    async fn release_lock(&self, lock_value: &str) -> Result<()> {
        let mut conn = self
            .redis
            .get_multiplexed_async_connection()
            .await
            .context("failed to get Redis connection")?;

        let script = redis::Script::new(RELEASE_LOCK_SCRIPT);
        script
            .key(CRON_LOCK_KEY)
            .arg(lock_value)
            .invoke_async::<()>(&mut conn)
            .await
            .context("failed to release lock")?;

        debug!("released cron lock");
        Ok(())
    }
}

/// Get hostname for lock identification.
fn hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Lua script to release lock only if we own it.
const RELEASE_LOCK_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

impl std::fmt::Debug for CronService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronService").finish()
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname() {
        let h = hostname();
        assert!(!h.is_empty());
    }
}
