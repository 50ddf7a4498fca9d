use crate::domain::pipeline::CourseRecord;
use crate::error::AppResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for courses and their pipeline state.
#[async_trait]
pub trait PipelineRepository: Send + Sync {
    async fn insert(&self, course: &CourseRecord) -> AppResult<()>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CourseRecord>>;

    /// Overwrite the stored record with `course`.
    async fn save(&self, course: &CourseRecord) -> AppResult<()>;

    /// Overwrite the stored record unless a run holds the course.
    ///
    /// Returns false, writing nothing, when the stored status is `generating`.
    async fn save_if_idle(&self, course: &CourseRecord) -> AppResult<bool>;

    /// Atomically move a course to `generating`.
    ///
    /// Returns the claimed record, or `None` when the course does not exist
    /// or a run already holds it.
    async fn try_claim(&self, id: Uuid) -> AppResult<Option<CourseRecord>>;

    /// Move every course left in `generating` to `error` with `message`.
    ///
    /// Runs live in process memory, so at startup any such claim belongs to
    /// a run that no longer exists. Returns the number of courses released.
    async fn fail_interrupted(&self, message: &str) -> AppResult<u64>;

    /// Check the backing store is reachable.
    async fn ping(&self) -> AppResult<()>;
}
