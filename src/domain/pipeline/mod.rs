pub mod error;
pub mod model;
pub mod service;

pub use error::PipelineServiceError;
pub use model::{CourseRecord, CourseStatus, PipelineStage, PipelineState};
pub use service::{
    GenerationTask, PipelineRunner, PipelineService, PipelineServiceApi, RunOutcome,
    INTERRUPTED_RUN_MESSAGE,
};

use crate::domain::audio::SegmentTiming;
use crate::domain::script::{Exchange, ScriptUnit};
use crate::infrastructure::jobs::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Request to create a course
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: String,
    pub native_language: String,
    pub target_language: String,
    pub narrator_voice_id: String,
    #[serde(default)]
    pub target_duration_seconds: Option<f64>,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateExchangesRequest {
    pub exchanges: Vec<Exchange>,
}

/// Script units arrive loosely typed; unknown entries are dropped.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScriptRequest {
    pub script_units: Vec<JsonValue>,
}

/// Course view for course endpoints
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: Uuid,
    pub title: String,
    pub native_language: String,
    pub target_language: String,
    pub narrator_voice_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_duration_seconds: Option<f64>,
    pub stage: PipelineStage,
    pub status: CourseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approx_duration_seconds: Option<f64>,
    pub exchanges: Vec<Exchange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_units: Option<Vec<ScriptUnit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<SegmentTiming>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CourseRecord> for CourseResponse {
    fn from(course: CourseRecord) -> Self {
        let stage = course.stage();
        let assembly = course.state.assembly().cloned();
        Self {
            id: course.id,
            stage,
            status: course.status,
            approx_duration_seconds: course.approx_duration_seconds,
            exchanges: course.state.exchanges().to_vec(),
            script_units: course.state.script_units().map(<[ScriptUnit]>::to_vec),
            audio_url: assembly.as_ref().map(|a| a.audio_url.clone()),
            segments: assembly.map(|a| a.segments),
            error_message: course.error_message,
            title: course.title,
            native_language: course.native_language,
            target_language: course.target_language,
            narrator_voice_id: course.narrator_voice_id,
            target_duration_seconds: course.target_duration_seconds,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

/// Outcome of asking for a generation run
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    pub already_ready: bool,
    pub status: CourseStatus,
}
