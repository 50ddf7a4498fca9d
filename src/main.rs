use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use convolab_audio::controllers::course::CourseController;
use convolab_audio::domain::audio::AudioAssembler;
use convolab_audio::domain::pipeline::{
    PipelineRunner, PipelineService, PipelineServiceApi, INTERRUPTED_RUN_MESSAGE,
};
use convolab_audio::domain::script::{DrillScriptGenerator, ScriptGenerator};
use convolab_audio::domain::tts::TtsService;
use convolab_audio::infrastructure::config::{Config, LogFormat, PollyEngine, StorageBackend};
use convolab_audio::infrastructure::db::{check_connection, create_pool, run_migrations};
use convolab_audio::infrastructure::http::{build_router, start_http_server};
use convolab_audio::infrastructure::jobs::{JobQueue, RetryPolicy};
use convolab_audio::infrastructure::media::{FfmpegToolkit, MediaToolkit};
use convolab_audio::infrastructure::repositories::{
    GcsStorageRepository, GoogleTtsRepository, LocalStorageRepository, PgPipelineRepository,
    PipelineRepository, PollyTtsRepository, StorageRepository, TtsRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        "Starting ConvoLab audio service on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database connection pool created");

    check_connection(&pool).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database connection verified and migrations applied");

    // AWS Polly client
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;
    tracing::info!(region = ?aws_config.region(), "AWS configuration loaded");
    let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Providers and infrastructure adapters
    tracing::info!("Instantiating providers...");
    let google_tts: Arc<dyn TtsRepository> = Arc::new(GoogleTtsRepository::new(
        config.google_tts_api_key.clone(),
        config.google_tts_endpoint.clone(),
    ));
    let polly_tts: Arc<dyn TtsRepository> = Arc::new(PollyTtsRepository::new(
        polly_client,
        config.polly_engine == PollyEngine::Neural,
    ));
    let media: Arc<dyn MediaToolkit> = Arc::new(FfmpegToolkit::new(
        config.ffmpeg_path.clone(),
        config.ffprobe_path.clone(),
        config.audio_format(),
    ));

    let (storage, local_files): (Arc<dyn StorageRepository>, Option<PathBuf>) =
        match config.storage_backend {
            StorageBackend::Gcs => {
                let bucket = config.gcs_bucket.clone().unwrap_or_default();
                let token = config.gcs_access_token.clone().unwrap_or_default();
                tracing::info!(bucket = %bucket, "Using GCS storage");
                (Arc::new(GcsStorageRepository::new(bucket, token)), None)
            }
            StorageBackend::Local => {
                let root = PathBuf::from(&config.local_storage_dir);
                tokio::fs::create_dir_all(&root).await?;
                tracing::info!(root = %root.display(), "Using local storage");
                (
                    Arc::new(LocalStorageRepository::new(
                        root.clone(),
                        config.public_base_url.clone(),
                    )),
                    Some(root),
                )
            }
        };

    // 2. Repositories
    let pipeline_repo: Arc<dyn PipelineRepository> =
        Arc::new(PgPipelineRepository::new(pool.clone()));

    // Claims held by runs of a previous process can never be released by them
    let released = pipeline_repo.fail_interrupted(INTERRUPTED_RUN_MESSAGE).await?;
    if released > 0 {
        tracing::warn!(courses = released, "Released courses left generating by a previous run");
    }

    // 3. Services
    tracing::info!("Instantiating services...");
    let tts_service = Arc::new(TtsService::new(google_tts, polly_tts));
    let assembler = Arc::new(AudioAssembler::new(tts_service, media, storage));
    let generator: Arc<dyn ScriptGenerator> = Arc::new(DrillScriptGenerator::new());
    let runner = Arc::new(PipelineRunner::new(
        pipeline_repo.clone(),
        generator,
        assembler,
    ));

    let queue = JobQueue::start(
        config.job_workers,
        RetryPolicy::new(config.job_max_attempts, config.job_retry_backoff()),
    );
    tracing::info!(
        workers = config.job_workers,
        max_attempts = config.job_max_attempts,
        "Job queue started"
    );

    let pipeline_service: Arc<dyn PipelineServiceApi> =
        Arc::new(PipelineService::new(runner, queue));

    // 4. Controllers
    let course_controller = Arc::new(CourseController::new(pipeline_service));

    let app = build_router(pipeline_repo, course_controller, local_files);
    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "convolab_audio=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
