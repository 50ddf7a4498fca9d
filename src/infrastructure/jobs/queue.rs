//! In-process job queue with a fixed worker pool and linear retry backoff.

use super::model::{JobEvent, JobId, JobSnapshot, JobState, RetryPolicy};
use super::progress::ProgressReporter;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use uuid::Uuid;

type JobTable = Arc<RwLock<HashMap<JobId, JobSnapshot>>>;

/// How long a finished job stays visible to `get_job`.
pub const FINISHED_JOB_RETENTION: Duration = Duration::from_secs(60 * 60);

/// A unit of background work.
///
/// Returning an error fails the attempt; the queue decides whether to retry.
#[async_trait]
pub trait JobTask: Send + Sync {
    fn name(&self) -> String;

    async fn run(&self, handle: &JobHandle) -> anyhow::Result<()>;
}

/// Given to a running task to report progress on its job.
#[derive(Clone)]
pub struct JobHandle {
    id: JobId,
    jobs: JobTable,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Raise the job's progress. Lower values than the current one are
    /// ignored and anything above 100 is clamped.
    pub fn update_progress(&self, percent: u8) {
        let percent = percent.min(100);
        if let Some(job) = self.jobs.write().get_mut(&self.id) {
            if percent > job.progress {
                job.progress = percent;
                tracing::debug!(job_id = %self.id, progress = percent, "Job progress");
            }
        }
    }
}

impl ProgressReporter for JobHandle {
    fn report(&self, percent: u8) {
        self.update_progress(percent);
    }
}

struct QueuedJob {
    id: JobId,
    task: Arc<dyn JobTask>,
}

#[derive(Clone)]
pub struct JobQueue {
    jobs: JobTable,
    sender: mpsc::UnboundedSender<QueuedJob>,
    events: broadcast::Sender<JobEvent>,
    retention: Duration,
}

impl JobQueue {
    /// Spawn `workers` workers on the current tokio runtime.
    pub fn start(workers: usize, retry: RetryPolicy) -> Self {
        let jobs: JobTable = Arc::new(RwLock::new(HashMap::new()));
        let (sender, receiver) = mpsc::unbounded_channel::<QueuedJob>();
        let receiver = Arc::new(Mutex::new(receiver));
        let (events, _) = broadcast::channel(64);

        let workers = workers.max(1);
        for worker_id in 0..workers {
            let receiver = receiver.clone();
            let jobs = jobs.clone();
            let events = events.clone();
            let retry = retry.clone();
            tokio::spawn(async move {
                loop {
                    let next = receiver.lock().await.recv().await;
                    let Some(job) = next else {
                        tracing::debug!(worker_id = worker_id, "Job worker stopping");
                        break;
                    };
                    process(job, &jobs, &events, &retry).await;
                }
            });
        }

        tracing::info!(
            workers = workers,
            max_attempts = retry.max_attempts,
            backoff_secs = retry.backoff.as_secs_f64(),
            "Job queue started"
        );

        Self {
            jobs,
            sender,
            events,
            retention: FINISHED_JOB_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn enqueue(&self, task: Arc<dyn JobTask>) -> JobId {
        self.prune_finished();

        let id = Uuid::new_v4();
        let name = task.name();
        self.jobs
            .write()
            .insert(id, JobSnapshot::queued(id, name.clone()));

        if self.sender.send(QueuedJob { id, task }).is_err() {
            tracing::error!(job_id = %id, "Job queue has no workers");
            if let Some(job) = self.jobs.write().get_mut(&id) {
                job.state = JobState::Failed;
                job.error = Some("job queue is not running".to_string());
                job.finished_at = Some(Utc::now());
            }
        } else {
            tracing::info!(job_id = %id, name = %name, "Job enqueued");
        }

        id
    }

    pub fn get_job(&self, id: JobId) -> Option<JobSnapshot> {
        self.jobs.read().get(&id).cloned()
    }

    /// Drop finished jobs older than the retention window.
    fn prune_finished(&self) {
        let now = Utc::now();
        let retention = self.retention;
        let mut table = self.jobs.write();
        let before = table.len();
        table.retain(|_, job| match job.finished_at {
            Some(finished_at) => (now - finished_at)
                .to_std()
                .map_or(true, |age| age < retention),
            None => true,
        });
        let pruned = before - table.len();
        if pruned > 0 {
            tracing::debug!(pruned = pruned, "Pruned finished jobs");
        }
    }

    /// Receive completion and failure events for jobs finishing from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }
}

fn update(jobs: &JobTable, id: JobId, f: impl FnOnce(&mut JobSnapshot)) -> Option<JobSnapshot> {
    let mut table = jobs.write();
    let job = table.get_mut(&id)?;
    f(job);
    Some(job.clone())
}

async fn process(
    job: QueuedJob,
    jobs: &JobTable,
    events: &broadcast::Sender<JobEvent>,
    retry: &RetryPolicy,
) {
    let handle = JobHandle {
        id: job.id,
        jobs: jobs.clone(),
    };
    let name = job.task.name();
    let mut attempt = 0;

    loop {
        attempt += 1;
        update(jobs, job.id, |snapshot| {
            snapshot.state = JobState::Active;
            snapshot.attempts = attempt;
            snapshot.progress = 0;
        });
        tracing::info!(job_id = %job.id, name = %name, attempt = attempt, "Job started");

        let start_time = std::time::Instant::now();
        match job.task.run(&handle).await {
            Ok(()) => {
                let snapshot = update(jobs, job.id, |snapshot| {
                    snapshot.state = JobState::Completed;
                    snapshot.progress = 100;
                    snapshot.error = None;
                    snapshot.finished_at = Some(Utc::now());
                });
                tracing::info!(
                    job_id = %job.id,
                    name = %name,
                    attempts = attempt,
                    latency_ms = start_time.elapsed().as_millis(),
                    "Job completed"
                );
                if let Some(snapshot) = snapshot {
                    let _ = events.send(JobEvent::Completed(snapshot));
                }
                return;
            }
            Err(e) if attempt < retry.max_attempts => {
                let delay = retry.delay_after(attempt);
                update(jobs, job.id, |snapshot| {
                    snapshot.state = JobState::Queued;
                    snapshot.error = Some(format!("{:#}", e));
                });
                tracing::warn!(
                    job_id = %job.id,
                    name = %name,
                    attempt = attempt,
                    error = %format!("{:#}", e),
                    retry_in_ms = delay.as_millis(),
                    "Job attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                let snapshot = update(jobs, job.id, |snapshot| {
                    snapshot.state = JobState::Failed;
                    snapshot.error = Some(format!("{:#}", e));
                    snapshot.finished_at = Some(Utc::now());
                });
                tracing::error!(
                    job_id = %job.id,
                    name = %name,
                    attempts = attempt,
                    error = %format!("{:#}", e),
                    "Job failed"
                );
                if let Some(snapshot) = snapshot {
                    let _ = events.send(JobEvent::Failed(snapshot));
                }
                return;
            }
        }
    }
}
