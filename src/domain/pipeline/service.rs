use super::error::PipelineServiceError;
use super::model::{CourseRecord, CourseStatus};
use super::{
    CourseResponse, CreateCourseRequest, GenerationResponse, UpdateExchangesRequest,
    UpdateScriptRequest,
};
use crate::domain::audio::{AssemblyResult, AudioAssembler};
use crate::domain::duration::{estimate_seconds, DurationPadder};
use crate::domain::script::{decode_units, ScriptGenerator};
use crate::domain::tts::group;
use crate::infrastructure::jobs::{
    JobHandle, JobId, JobQueue, JobSnapshot, JobTask, NoopProgress, ProgressReporter,
};
use crate::infrastructure::repositories::PipelineRepository;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub const PROGRESS_CLAIMED: u8 = 5;
pub const PROGRESS_SCRIPT: u8 = 10;
pub const PROGRESS_PADDED: u8 = 20;
pub const PROGRESS_BATCHED: u8 = 35;
pub const PROGRESS_PERSISTED: u8 = 90;
pub const PROGRESS_DONE: u8 = 100;

/// Error recorded on courses whose run did not survive a restart.
pub const INTERRUPTED_RUN_MESSAGE: &str = "generation interrupted by a service restart";

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Audio for the current script already existed; nothing was synthesized.
    AlreadyReady(AssemblyResult),
    Completed(AssemblyResult),
}

impl RunOutcome {
    pub fn assembly(&self) -> &AssemblyResult {
        match self {
            RunOutcome::AlreadyReady(assembly) | RunOutcome::Completed(assembly) => assembly,
        }
    }
}

/// Drives one course from its current stage to `audio-ready`.
pub struct PipelineRunner {
    repo: Arc<dyn PipelineRepository>,
    generator: Arc<dyn ScriptGenerator>,
    assembler: Arc<AudioAssembler>,
}

impl PipelineRunner {
    pub fn new(
        repo: Arc<dyn PipelineRepository>,
        generator: Arc<dyn ScriptGenerator>,
        assembler: Arc<AudioAssembler>,
    ) -> Self {
        Self {
            repo,
            generator,
            assembler,
        }
    }

    pub fn repository(&self) -> &Arc<dyn PipelineRepository> {
        &self.repo
    }

    /// Run the pipeline for a course.
    ///
    /// A course whose audio is still current is returned without any
    /// provider call. On failure the course is marked `error` and the error
    /// is returned so the caller's retry policy can decide what happens next.
    pub async fn run(
        &self,
        course_id: Uuid,
        progress: &dyn ProgressReporter,
    ) -> Result<RunOutcome, PipelineServiceError> {
        let mut course = self
            .repo
            .find_by_id(course_id)
            .await?
            .ok_or(PipelineServiceError::NotFound)?;

        if let Some(assembly) = course.state().assembly().cloned() {
            if course.status() != CourseStatus::Ready {
                course.mark_ready();
                self.repo.save(&course).await?;
            }
            tracing::info!(course_id = %course_id, "Course audio is current, skipping generation");
            progress.report(PROGRESS_DONE);
            return Ok(RunOutcome::AlreadyReady(assembly));
        }

        let start_time = std::time::Instant::now();
        match self.advance(&mut course, progress).await {
            Ok(assembly) => {
                tracing::info!(
                    course_id = %course_id,
                    total_duration_ms = assembly.total_duration_ms,
                    segment_count = assembly.segments.len(),
                    latency_ms = start_time.elapsed().as_millis(),
                    "Course generation completed"
                );
                Ok(RunOutcome::Completed(assembly))
            }
            Err(e) => {
                tracing::error!(course_id = %course_id, error = %e, "Course generation failed");
                course.mark_failed(e.to_string());
                if let Err(save_err) = self.repo.save(&course).await {
                    tracing::error!(
                        course_id = %course_id,
                        error = %save_err,
                        "Failed to record generation failure"
                    );
                }
                Err(e)
            }
        }
    }

    async fn advance(
        &self,
        course: &mut CourseRecord,
        progress: &dyn ProgressReporter,
    ) -> Result<AssemblyResult, PipelineServiceError> {
        if course.status() != CourseStatus::Generating {
            course.mark_generating();
            self.repo.save(course).await?;
        }
        progress.report(PROGRESS_CLAIMED);

        let lesson = course.lesson_context();

        if course.state().script_units().is_none() {
            let units = self
                .generator
                .generate(&lesson, course.state().exchanges())
                .await?;
            tracing::debug!(course_id = %course.id, unit_count = units.len(), "Script generated");
            course.set_script(units);
            self.repo.save(course).await?;
        }
        progress.report(PROGRESS_SCRIPT);

        let mut units = course.state().script_units().unwrap_or_default().to_vec();
        match course.target_duration_seconds {
            Some(target_seconds) => {
                let material = self
                    .generator
                    .review_material(&lesson, course.state().exchanges())
                    .await?;
                let padder = DurationPadder::new(course.narrator_voice_id.clone());
                let outcome = padder.pad_to_target(units, target_seconds, &material);
                if outcome.rounds_added > 0 {
                    course.set_script(outcome.units.clone());
                }
                course.set_estimate(outcome.estimated_seconds);
                units = outcome.units;
            }
            None => course.set_estimate(estimate_seconds(&units)),
        }
        self.repo.save(course).await?;
        progress.report(PROGRESS_PADDED);

        let plan = group(&units, &course.native_language, &course.target_language);
        progress.report(PROGRESS_BATCHED);

        let silence = self.assembler.silence_cache()?;
        let folder = format!("courses/{}", course.id);
        let assembly = self
            .assembler
            .assemble(&plan, units.len(), &folder, &silence, progress)
            .await?;

        if !course.complete_audio(assembly.clone()) {
            return Err(PipelineServiceError::Dependency(
                "course has no script to attach audio to".to_string(),
            ));
        }
        self.repo.save(course).await?;
        progress.report(PROGRESS_PERSISTED);
        progress.report(PROGRESS_DONE);

        Ok(assembly)
    }
}

/// Queue task generating one course.
///
/// The first attempt runs under the claim taken when the job was enqueued;
/// retries claim the course again and stand down if another run holds it.
pub struct GenerationTask {
    runner: Arc<PipelineRunner>,
    course_id: Uuid,
    attempts: AtomicU32,
}

impl GenerationTask {
    pub fn new(runner: Arc<PipelineRunner>, course_id: Uuid) -> Self {
        Self {
            runner,
            course_id,
            attempts: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl JobTask for GenerationTask {
    fn name(&self) -> String {
        format!("generate-course:{}", self.course_id)
    }

    async fn run(&self, handle: &JobHandle) -> anyhow::Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt > 1 && self.runner.repository().try_claim(self.course_id).await?.is_none() {
            tracing::warn!(
                course_id = %self.course_id,
                job_id = %handle.id(),
                "Course claimed by another run, retry abandoned"
            );
            return Ok(());
        }

        self.runner.run(self.course_id, handle).await?;
        Ok(())
    }
}

#[async_trait]
pub trait PipelineServiceApi: Send + Sync {
    async fn create_course(
        &self,
        request: CreateCourseRequest,
    ) -> Result<CourseResponse, PipelineServiceError>;

    async fn get_course(&self, course_id: Uuid) -> Result<CourseResponse, PipelineServiceError>;

    async fn update_exchanges(
        &self,
        course_id: Uuid,
        request: UpdateExchangesRequest,
    ) -> Result<CourseResponse, PipelineServiceError>;

    async fn update_script(
        &self,
        course_id: Uuid,
        request: UpdateScriptRequest,
    ) -> Result<CourseResponse, PipelineServiceError>;

    async fn request_generation(
        &self,
        course_id: Uuid,
    ) -> Result<GenerationResponse, PipelineServiceError>;

    async fn get_job(&self, job_id: JobId) -> Result<JobSnapshot, PipelineServiceError>;
}

pub struct PipelineService {
    repo: Arc<dyn PipelineRepository>,
    runner: Arc<PipelineRunner>,
    queue: JobQueue,
}

impl PipelineService {
    pub fn new(runner: Arc<PipelineRunner>, queue: JobQueue) -> Self {
        Self {
            repo: runner.repository().clone(),
            runner,
            queue,
        }
    }

    async fn load(&self, course_id: Uuid) -> Result<CourseRecord, PipelineServiceError> {
        self.repo
            .find_by_id(course_id)
            .await?
            .ok_or(PipelineServiceError::NotFound)
    }

    async fn load_editable(&self, course_id: Uuid) -> Result<CourseRecord, PipelineServiceError> {
        let course = self.load(course_id).await?;
        if course.status() == CourseStatus::Generating {
            return Err(PipelineServiceError::AlreadyGenerating);
        }
        Ok(course)
    }

    /// A generate request may claim the course between the load and this
    /// write; the edit then loses and the claim stands.
    async fn save_edit(&self, course: &CourseRecord) -> Result<(), PipelineServiceError> {
        if !self.repo.save_if_idle(course).await? {
            return Err(PipelineServiceError::AlreadyGenerating);
        }
        Ok(())
    }
}

fn validate_create(request: &CreateCourseRequest) -> Result<(), PipelineServiceError> {
    let required = [
        ("title", &request.title),
        ("nativeLanguage", &request.native_language),
        ("targetLanguage", &request.target_language),
        ("narratorVoiceId", &request.narrator_voice_id),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(PipelineServiceError::Invalid(format!("{} must not be empty", field)));
    }
    if let Some(seconds) = request.target_duration_seconds {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(PipelineServiceError::Invalid(
                "targetDurationSeconds must be positive".to_string(),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl PipelineServiceApi for PipelineService {
    async fn create_course(
        &self,
        request: CreateCourseRequest,
    ) -> Result<CourseResponse, PipelineServiceError> {
        validate_create(&request)?;

        let course = CourseRecord::new(
            request.title.trim().to_string(),
            request.native_language,
            request.target_language,
            request.narrator_voice_id,
            request.target_duration_seconds,
            request.exchanges,
        );
        self.repo.insert(&course).await?;

        tracing::info!(course_id = %course.id, title = %course.title, "Course created");

        Ok(course.into())
    }

    async fn get_course(&self, course_id: Uuid) -> Result<CourseResponse, PipelineServiceError> {
        Ok(self.load(course_id).await?.into())
    }

    async fn update_exchanges(
        &self,
        course_id: Uuid,
        request: UpdateExchangesRequest,
    ) -> Result<CourseResponse, PipelineServiceError> {
        let mut course = self.load_editable(course_id).await?;
        course.replace_exchanges(request.exchanges);
        self.save_edit(&course).await?;

        tracing::info!(course_id = %course_id, "Exchanges replaced, downstream artifacts cleared");

        Ok(course.into())
    }

    async fn update_script(
        &self,
        course_id: Uuid,
        request: UpdateScriptRequest,
    ) -> Result<CourseResponse, PipelineServiceError> {
        let mut course = self.load_editable(course_id).await?;
        let units = decode_units(request.script_units);
        course.replace_script(units);
        self.save_edit(&course).await?;

        tracing::info!(course_id = %course_id, "Script replaced, audio cleared");

        Ok(course.into())
    }

    async fn request_generation(
        &self,
        course_id: Uuid,
    ) -> Result<GenerationResponse, PipelineServiceError> {
        let course = self.load(course_id).await?;

        match course.status() {
            CourseStatus::Generating => return Err(PipelineServiceError::AlreadyGenerating),
            _ if course.state().assembly().is_some() => {
                let outcome = self.runner.run(course_id, &NoopProgress).await?;
                tracing::info!(
                    course_id = %course_id,
                    audio_url = %outcome.assembly().audio_url,
                    "Generation requested for ready course"
                );
                return Ok(GenerationResponse {
                    job_id: None,
                    already_ready: true,
                    status: CourseStatus::Ready,
                });
            }
            _ => {}
        }

        let nothing_to_say = course.state().script_units().is_none()
            && !course.state().exchanges().iter().any(|e| e.is_contentful());
        if nothing_to_say {
            return Err(PipelineServiceError::Invalid(
                "course has no exchanges or script to generate from".to_string(),
            ));
        }

        if self.repo.try_claim(course_id).await?.is_none() {
            return Err(PipelineServiceError::AlreadyGenerating);
        }

        let task = Arc::new(GenerationTask::new(self.runner.clone(), course_id));
        let job_id = self.queue.enqueue(task);

        tracing::info!(course_id = %course_id, job_id = %job_id, "Course generation enqueued");

        Ok(GenerationResponse {
            job_id: Some(job_id),
            already_ready: false,
            status: CourseStatus::Generating,
        })
    }

    async fn get_job(&self, job_id: JobId) -> Result<JobSnapshot, PipelineServiceError> {
        self.queue
            .get_job(job_id)
            .ok_or(PipelineServiceError::JobNotFound)
    }
}
