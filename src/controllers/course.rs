use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::pipeline::{
    CourseResponse, CreateCourseRequest, GenerationResponse, PipelineServiceApi,
    UpdateExchangesRequest, UpdateScriptRequest,
};
use crate::error::AppResult;
use crate::infrastructure::jobs::JobSnapshot;

pub struct CourseController {
    pipeline_service: Arc<dyn PipelineServiceApi>,
}

impl CourseController {
    pub fn new(pipeline_service: Arc<dyn PipelineServiceApi>) -> Self {
        Self { pipeline_service }
    }

    /// POST /api/courses - Create a course at the exchanges stage
    pub async fn create_course(
        State(controller): State<Arc<CourseController>>,
        Json(request): Json<CreateCourseRequest>,
    ) -> AppResult<(StatusCode, Json<CourseResponse>)> {
        let course = controller.pipeline_service.create_course(request).await?;
        Ok((StatusCode::CREATED, Json(course)))
    }

    /// GET /api/courses/{courseId}
    pub async fn get_course(
        State(controller): State<Arc<CourseController>>,
        Path(course_id): Path<Uuid>,
    ) -> AppResult<Json<CourseResponse>> {
        let course = controller.pipeline_service.get_course(course_id).await?;
        Ok(Json(course))
    }

    /// PUT /api/courses/{courseId}/exchanges - Replace exchanges
    pub async fn update_exchanges(
        State(controller): State<Arc<CourseController>>,
        Path(course_id): Path<Uuid>,
        Json(request): Json<UpdateExchangesRequest>,
    ) -> AppResult<Json<CourseResponse>> {
        let course = controller
            .pipeline_service
            .update_exchanges(course_id, request)
            .await?;
        Ok(Json(course))
    }

    /// PUT /api/courses/{courseId}/script - Replace script units
    pub async fn update_script(
        State(controller): State<Arc<CourseController>>,
        Path(course_id): Path<Uuid>,
        Json(request): Json<UpdateScriptRequest>,
    ) -> AppResult<Json<CourseResponse>> {
        let course = controller
            .pipeline_service
            .update_script(course_id, request)
            .await?;
        Ok(Json(course))
    }

    /// POST /api/courses/{courseId}/generate - Enqueue audio generation
    ///
    /// 202 with the job id, or 200 when the audio is already current.
    pub async fn generate(
        State(controller): State<Arc<CourseController>>,
        Path(course_id): Path<Uuid>,
    ) -> AppResult<(StatusCode, Json<GenerationResponse>)> {
        let response = controller
            .pipeline_service
            .request_generation(course_id)
            .await?;
        let status = if response.already_ready {
            StatusCode::OK
        } else {
            StatusCode::ACCEPTED
        };
        Ok((status, Json(response)))
    }

    /// GET /api/jobs/{jobId}
    pub async fn get_job(
        State(controller): State<Arc<CourseController>>,
        Path(job_id): Path<Uuid>,
    ) -> AppResult<Json<JobSnapshot>> {
        let job = controller.pipeline_service.get_job(job_id).await?;
        Ok(Json(job))
    }
}
