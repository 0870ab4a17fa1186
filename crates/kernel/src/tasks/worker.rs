//! Background task worker.
//!
//! Pops [`Task`]s off the Redis queue and runs them outside the request path.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::email::EmailService;
use super::queue::Queue;
use super::{TASK_QUEUE, Task, announcements};
use crate::cache::CacheLayer;

/// Seconds a single BLPOP waits before checking for shutdown again.
const POP_TIMEOUT_SECS: u64 = 5;

/// Pause after a queue error before retrying.
const ERROR_BACKOFF: Duration = Duration::from_secs(2);

pub struct TaskWorker {
    queue: Arc<dyn Queue>,
    cache: CacheLayer,
    email: Option<Arc<EmailService>>,
}

impl TaskWorker {
    pub fn new(queue: Arc<dyn Queue>, cache: CacheLayer, email: Option<Arc<EmailService>>) -> Self {
        Self {
            queue,
            cache,
            email,
        }
    }

    /// Process tasks until shutdown is signalled.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("task worker started");

        loop {
            tokio::select! {
                popped = self.queue.pop(TASK_QUEUE, POP_TIMEOUT_SECS) => match popped {
                    Ok(Some(raw)) => {
                        if let Err(e) = self.handle_raw(&raw).await {
                            warn!(error = %e, "task failed");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "failed to pop task");
                        tokio::time::sleep(ERROR_BACKOFF).await;
                    }
                },
                changed = shutdown.changed() => {
                    // A dropped sender also means shutdown
                    if changed.is_err() || *shutdown.borrow() {
                        info!("task worker stopping");
                        break;
                    }
                }
            }
        }
    }

    async fn handle_raw(&self, raw: &str) -> Result<()> {
        let task: Task = serde_json::from_str(raw).context("failed to parse task")?;
        self.handle(task).await
    }

    /// Run a single task.
    pub async fn handle(&self, task: Task) -> Result<()> {
        match task {
            Task::SendConfirmationEmail {
                email,
                conference_info,
            } => match &self.email {
                Some(service) => {
                    service
                        .send_conference_confirmation(&email, &conference_info)
                        .await?;
                    info!(to = %email, "conference confirmation sent");
                }
                None => {
                    debug!(to = %email, info = %conference_info, "SMTP not configured, confirmation email skipped");
                }
            },
            Task::SetFeaturedSpeaker {
                speaker_name,
                session_names,
            } => {
                announcements::cache_featured_speaker(&self.cache, &speaker_name, &session_names)
                    .await;
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for TaskWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskWorker")
            .field("email", &self.email.is_some())
            .finish()
    }
}
