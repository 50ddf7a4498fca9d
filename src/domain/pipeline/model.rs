use crate::domain::audio::AssemblyResult;
use crate::domain::script::{Exchange, LessonContext, ScriptUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stage-specific payload of a course.
///
/// Each variant carries everything produced up to that stage and nothing
/// after it, so moving back to an earlier stage drops downstream artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "stage",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum PipelineState {
    Exchanges {
        exchanges: Vec<Exchange>,
    },
    Script {
        exchanges: Vec<Exchange>,
        script_units: Vec<ScriptUnit>,
    },
    AudioReady {
        exchanges: Vec<Exchange>,
        script_units: Vec<ScriptUnit>,
        assembly: AssemblyResult,
    },
}

impl PipelineState {
    pub fn exchanges(&self) -> &[Exchange] {
        match self {
            PipelineState::Exchanges { exchanges }
            | PipelineState::Script { exchanges, .. }
            | PipelineState::AudioReady { exchanges, .. } => exchanges,
        }
    }

    pub fn script_units(&self) -> Option<&[ScriptUnit]> {
        match self {
            PipelineState::Exchanges { .. } => None,
            PipelineState::Script { script_units, .. }
            | PipelineState::AudioReady { script_units, .. } => Some(script_units),
        }
    }

    pub fn assembly(&self) -> Option<&AssemblyResult> {
        match self {
            PipelineState::AudioReady { assembly, .. } => Some(assembly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    Exchanges,
    Script,
    AudioReady,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Draft,
    Generating,
    Ready,
    Error,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Draft => "draft",
            CourseStatus::Generating => "generating",
            CourseStatus::Ready => "ready",
            CourseStatus::Error => "error",
        }
    }
}

impl std::str::FromStr for CourseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CourseStatus::Draft),
            "generating" => Ok(CourseStatus::Generating),
            "ready" => Ok(CourseStatus::Ready),
            "error" => Ok(CourseStatus::Error),
            other => Err(format!("unknown course status '{}'", other)),
        }
    }
}

/// A course and its generation pipeline.
///
/// Status and payload only change through the methods below, which enforce
/// the invalidation rules between stages.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRecord {
    pub id: Uuid,
    pub title: String,
    pub native_language: String,
    pub target_language: String,
    pub narrator_voice_id: String,
    pub target_duration_seconds: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub(crate) status: CourseStatus,
    pub(crate) state: PipelineState,
    pub(crate) approx_duration_seconds: Option<f64>,
    pub(crate) error_message: Option<String>,
}

impl CourseRecord {
    pub fn new(
        title: String,
        native_language: String,
        target_language: String,
        narrator_voice_id: String,
        target_duration_seconds: Option<f64>,
        exchanges: Vec<Exchange>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            native_language,
            target_language,
            narrator_voice_id,
            target_duration_seconds,
            created_at: now,
            updated_at: now,
            status: CourseStatus::Draft,
            state: PipelineState::Exchanges { exchanges },
            approx_duration_seconds: None,
            error_message: None,
        }
    }

    pub fn status(&self) -> CourseStatus {
        self.status
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn approx_duration_seconds(&self) -> Option<f64> {
        self.approx_duration_seconds
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn stage(&self) -> PipelineStage {
        if self.status == CourseStatus::Error {
            return PipelineStage::Error;
        }
        match self.state {
            PipelineState::Exchanges { .. } => PipelineStage::Exchanges,
            PipelineState::Script { .. } => PipelineStage::Script,
            PipelineState::AudioReady { .. } => PipelineStage::AudioReady,
        }
    }

    /// Stage the payload belongs to, regardless of an error status.
    pub fn payload_stage(&self) -> PipelineStage {
        match self.state {
            PipelineState::Exchanges { .. } => PipelineStage::Exchanges,
            PipelineState::Script { .. } => PipelineStage::Script,
            PipelineState::AudioReady { .. } => PipelineStage::AudioReady,
        }
    }

    /// Audio is published and nothing has been edited since.
    pub fn is_ready(&self) -> bool {
        self.status == CourseStatus::Ready && self.state.assembly().is_some()
    }

    pub fn lesson_context(&self) -> LessonContext {
        LessonContext {
            title: self.title.clone(),
            narrator_voice_id: self.narrator_voice_id.clone(),
            native_language: self.native_language.clone(),
            target_language: self.target_language.clone(),
        }
    }

    /// Replace the exchanges, discarding any script and audio.
    pub fn replace_exchanges(&mut self, exchanges: Vec<Exchange>) {
        self.state = PipelineState::Exchanges { exchanges };
        self.reset_to_draft();
    }

    /// Replace the script, discarding any audio. Exchanges are kept.
    pub fn replace_script(&mut self, script_units: Vec<ScriptUnit>) {
        self.set_script(script_units);
        self.reset_to_draft();
    }

    /// Store a generated script without touching the run status.
    pub(crate) fn set_script(&mut self, script_units: Vec<ScriptUnit>) {
        let exchanges = self.state.exchanges().to_vec();
        self.state = PipelineState::Script {
            exchanges,
            script_units,
        };
        self.approx_duration_seconds = None;
        self.touch();
    }

    pub(crate) fn set_estimate(&mut self, seconds: f64) {
        self.approx_duration_seconds = Some(seconds);
        self.touch();
    }

    /// Publish an assembly for the current script.
    ///
    /// Returns false, leaving the record untouched, when there is no script.
    pub(crate) fn complete_audio(&mut self, assembly: AssemblyResult) -> bool {
        let next = match &self.state {
            PipelineState::Script {
                exchanges,
                script_units,
            } => PipelineState::AudioReady {
                exchanges: exchanges.clone(),
                script_units: script_units.clone(),
                assembly,
            },
            _ => return false,
        };

        self.approx_duration_seconds = next
            .assembly()
            .map(|a| a.total_duration_ms as f64 / 1000.0);
        self.state = next;
        self.status = CourseStatus::Ready;
        self.error_message = None;
        self.touch();
        true
    }

    /// Restore the ready status of a course whose audio is still current.
    pub(crate) fn mark_ready(&mut self) -> bool {
        if self.state.assembly().is_none() {
            return false;
        }
        self.status = CourseStatus::Ready;
        self.error_message = None;
        self.touch();
        true
    }

    pub(crate) fn mark_generating(&mut self) {
        self.status = CourseStatus::Generating;
        self.error_message = None;
        self.touch();
    }

    /// Flag the run as failed. The payload is kept so a retry resumes from
    /// the stage that was reached.
    pub(crate) fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = CourseStatus::Error;
        self.error_message = Some(message.into());
        self.touch();
    }

    fn reset_to_draft(&mut self) {
        self.status = CourseStatus::Draft;
        self.approx_duration_seconds = None;
        self.error_message = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
