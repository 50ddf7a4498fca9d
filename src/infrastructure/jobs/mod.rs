pub mod model;
pub mod progress;
pub mod queue;

pub use model::{JobEvent, JobId, JobSnapshot, JobState, RetryPolicy};
pub use progress::{NoopProgress, ProgressReporter};
pub use queue::{JobHandle, JobQueue, JobTask};
