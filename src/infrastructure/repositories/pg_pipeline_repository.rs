use super::pipeline_repository::PipelineRepository;
use crate::domain::pipeline::{CourseRecord, CourseStatus, PipelineStage, PipelineState};
use crate::error::{AppError, AppResult};
use crate::infrastructure::db::{check_connection, DbPool};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgQueryResult;
use sqlx::types::Json;
use std::sync::Arc;
use uuid::Uuid;

const COURSE_COLUMNS: &str = r#"
    id, title, native_language, target_language, narrator_voice_id,
    target_duration_seconds, status, state, approx_duration_seconds,
    error_message, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct CourseRow {
    id: Uuid,
    title: String,
    native_language: String,
    target_language: String,
    narrator_voice_id: String,
    target_duration_seconds: Option<f64>,
    status: String,
    state: Json<PipelineState>,
    approx_duration_seconds: Option<f64>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CourseRow> for CourseRecord {
    type Error = AppError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        let status: CourseStatus = row.status.parse().map_err(AppError::Internal)?;
        Ok(CourseRecord {
            id: row.id,
            title: row.title,
            native_language: row.native_language,
            target_language: row.target_language,
            narrator_voice_id: row.narrator_voice_id,
            target_duration_seconds: row.target_duration_seconds,
            created_at: row.created_at,
            updated_at: row.updated_at,
            status,
            state: row.state.0,
            approx_duration_seconds: row.approx_duration_seconds,
            error_message: row.error_message,
        })
    }
}

pub struct PgPipelineRepository {
    pool: Arc<DbPool>,
}

impl PgPipelineRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineRepository for PgPipelineRepository {
    async fn insert(&self, course: &CourseRecord) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query(
            r#"
            INSERT INTO courses (
                id, title, native_language, target_language, narrator_voice_id,
                target_duration_seconds, stage, status, state,
                approx_duration_seconds, error_message, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(course.id)
        .bind(&course.title)
        .bind(&course.native_language)
        .bind(&course.target_language)
        .bind(&course.narrator_voice_id)
        .bind(course.target_duration_seconds)
        .bind(stage_column(course))
        .bind(course.status().as_str())
        .bind(Json(course.state()))
        .bind(course.approx_duration_seconds())
        .bind(course.error_message())
        .bind(course.created_at)
        .bind(course.updated_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CourseRecord>> {
        let pool = self.pool.as_ref();
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {} FROM courses WHERE id = $1",
            COURSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(CourseRecord::try_from).transpose()
    }

    async fn save(&self, course: &CourseRecord) -> AppResult<()> {
        let result = update_course(self.pool.as_ref(), course, false).await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Course {} not found", course.id)));
        }

        Ok(())
    }

    async fn save_if_idle(&self, course: &CourseRecord) -> AppResult<bool> {
        let result = update_course(self.pool.as_ref(), course, true).await?;
        if result.rows_affected() > 0 {
            return Ok(true);
        }

        match self.find_by_id(course.id).await? {
            Some(_) => Ok(false),
            None => Err(AppError::NotFound(format!("Course {} not found", course.id))),
        }
    }

    async fn try_claim(&self, id: Uuid) -> AppResult<Option<CourseRecord>> {
        let pool = self.pool.as_ref();
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            r#"
            UPDATE courses
            SET status = 'generating', error_message = NULL, updated_at = NOW()
            WHERE id = $1 AND status <> 'generating'
            RETURNING {}
            "#,
            COURSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(CourseRecord::try_from).transpose()
    }

    async fn fail_interrupted(&self, message: &str) -> AppResult<u64> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET status = 'error', error_message = $1, updated_at = NOW()
            WHERE status = 'generating'
            "#,
        )
        .bind(message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> AppResult<()> {
        check_connection(&self.pool).await?;
        Ok(())
    }
}

/// Full-record update. With `only_if_idle` the row is left alone while a run
/// holds it.
async fn update_course(
    pool: &DbPool,
    course: &CourseRecord,
    only_if_idle: bool,
) -> AppResult<PgQueryResult> {
    let guard = if only_if_idle {
        " AND status <> 'generating'"
    } else {
        ""
    };
    let result = sqlx::query(&format!(
        r#"
        UPDATE courses
        SET title = $2,
            target_duration_seconds = $3,
            stage = $4,
            status = $5,
            state = $6,
            approx_duration_seconds = $7,
            error_message = $8,
            updated_at = $9
        WHERE id = $1{}
        "#,
        guard
    ))
    .bind(course.id)
    .bind(&course.title)
    .bind(course.target_duration_seconds)
    .bind(stage_column(course))
    .bind(course.status().as_str())
    .bind(Json(course.state()))
    .bind(course.approx_duration_seconds())
    .bind(course.error_message())
    .bind(course.updated_at)
    .execute(pool)
    .await?;

    Ok(result)
}

/// The stage column mirrors the payload tag for querying; the error state
/// lives in `status`.
fn stage_column(course: &CourseRecord) -> &'static str {
    match course.payload_stage() {
        PipelineStage::Exchanges => "exchanges",
        PipelineStage::Script => "script",
        PipelineStage::AudioReady | PipelineStage::Error => "audio-ready",
    }
}
