use crate::domain::audio::AudioError;
use crate::domain::script::ScriptError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineServiceError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("course not found")]
    NotFound,
    #[error("job not found")]
    JobNotFound,
    #[error("course is already generating")]
    AlreadyGenerating,
    #[error("script generation failed: {0}")]
    Script(#[from] ScriptError),
    #[error("audio assembly failed: {0}")]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<AppError> for PipelineServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => PipelineServiceError::Invalid(msg),
            AppError::NotFound(_) => PipelineServiceError::NotFound,
            AppError::Conflict(_) => PipelineServiceError::AlreadyGenerating,
            _ => PipelineServiceError::Dependency(err.to_string()),
        }
    }
}

impl From<PipelineServiceError> for AppError {
    fn from(err: PipelineServiceError) -> Self {
        match err {
            PipelineServiceError::Invalid(msg) => AppError::BadRequest(msg),
            PipelineServiceError::NotFound => AppError::NotFound("Course not found".to_string()),
            PipelineServiceError::JobNotFound => AppError::NotFound("Job not found".to_string()),
            PipelineServiceError::AlreadyGenerating => {
                AppError::Conflict("Course is already generating".to_string())
            }
            PipelineServiceError::Script(e @ ScriptError::NoContent) => {
                AppError::BadRequest(e.to_string())
            }
            PipelineServiceError::Audio(
                e @ (AudioError::Synthesis { .. } | AudioError::Storage(_)),
            ) => AppError::ExternalService(e.to_string()),
            PipelineServiceError::Audio(e) => AppError::Internal(e.to_string()),
            PipelineServiceError::Dependency(msg) => AppError::Internal(msg),
            PipelineServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
