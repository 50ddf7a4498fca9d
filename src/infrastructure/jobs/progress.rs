/// Sink for coarse progress percentages of a long-running task.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, percent: u8);
}

/// Discards progress; for callers that run work outside the queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _percent: u8) {}
}
