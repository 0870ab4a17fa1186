//! Background tasks and scheduled jobs.
//!
//! Request handlers enqueue [`Task`]s on a Redis list; the [`TaskWorker`]
//! drains it. The [`CronService`] refreshes the nearly-sold-out announcement
//! on a timer or when the cron endpoint is hit.

pub mod announcements;
mod cron;
mod email;
mod queue;
mod worker;

pub use announcements::{FEATURED_SPEAKER_KEY, RECENT_ANNOUNCEMENTS_KEY};
pub use cron::{CronResult, CronService};
pub use email::EmailService;
pub use queue::{Queue, RedisQueue};
pub use worker::TaskWorker;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the task queue (Redis key `queue:tasks`).
pub const TASK_QUEUE: &str = "tasks";

/// A unit of deferred work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Task {
    /// Email the organizer a summary of the conference they created.
    SendConfirmationEmail {
        email: String,
        conference_info: String,
    },

    /// Replace the featured speaker message.
    SetFeaturedSpeaker {
        speaker_name: String,
        session_names: String,
    },
}

/// Serialize a task and push it on the task queue.
pub async fn enqueue(queue: &dyn Queue, task: &Task) -> Result<()> {
    let payload = serde_json::to_string(task).context("failed to serialize task")?;
    queue.push(TASK_QUEUE, &payload).await
}
