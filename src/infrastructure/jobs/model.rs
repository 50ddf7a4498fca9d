use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

pub type JobId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Active,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Point-in-time view of a job, as returned to pollers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: JobId,
    pub name: String,
    pub state: JobState,
    pub progress: u8,
    pub attempts: u32,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    pub(crate) fn queued(id: JobId, name: String) -> Self {
        Self {
            id,
            name,
            state: JobState::Queued,
            progress: 0,
            attempts: 0,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Emitted once per job when it reaches a terminal state.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Completed(JobSnapshot),
    Failed(JobSnapshot),
}

impl JobEvent {
    pub fn snapshot(&self) -> &JobSnapshot {
        match self {
            JobEvent::Completed(snapshot) | JobEvent::Failed(snapshot) => snapshot,
        }
    }
}

/// How often a failing task is retried and how long to wait in between.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Attempt `n` waits `backoff * n` before attempt `n + 1`.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}
