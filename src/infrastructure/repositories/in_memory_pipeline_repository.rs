use super::pipeline_repository::PipelineRepository;
use crate::domain::pipeline::{CourseRecord, CourseStatus};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Process-local course store.
#[derive(Default)]
pub struct InMemoryPipelineRepository {
    courses: RwLock<HashMap<Uuid, CourseRecord>>,
}

impl InMemoryPipelineRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PipelineRepository for InMemoryPipelineRepository {
    async fn insert(&self, course: &CourseRecord) -> AppResult<()> {
        let mut courses = self.courses.write();
        if courses.contains_key(&course.id) {
            return Err(AppError::Conflict(format!("Course {} already exists", course.id)));
        }
        courses.insert(course.id, course.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CourseRecord>> {
        Ok(self.courses.read().get(&id).cloned())
    }

    async fn save(&self, course: &CourseRecord) -> AppResult<()> {
        match self.courses.write().get_mut(&course.id) {
            Some(stored) => {
                *stored = course.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Course {} not found", course.id))),
        }
    }

    async fn save_if_idle(&self, course: &CourseRecord) -> AppResult<bool> {
        match self.courses.write().get_mut(&course.id) {
            Some(stored) if stored.status == CourseStatus::Generating => Ok(false),
            Some(stored) => {
                *stored = course.clone();
                Ok(true)
            }
            None => Err(AppError::NotFound(format!("Course {} not found", course.id))),
        }
    }

    async fn try_claim(&self, id: Uuid) -> AppResult<Option<CourseRecord>> {
        let mut courses = self.courses.write();
        let Some(course) = courses.get_mut(&id) else {
            return Ok(None);
        };
        if course.status == CourseStatus::Generating {
            return Ok(None);
        }
        course.status = CourseStatus::Generating;
        course.error_message = None;
        course.updated_at = Utc::now();
        Ok(Some(course.clone()))
    }

    async fn fail_interrupted(&self, message: &str) -> AppResult<u64> {
        let mut released = 0;
        for course in self.courses.write().values_mut() {
            if course.status == CourseStatus::Generating {
                course.mark_failed(message);
                released += 1;
            }
        }
        Ok(released)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
