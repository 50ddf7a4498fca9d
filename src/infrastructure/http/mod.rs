pub mod request_id;

pub use request_id::{request_id_middleware, RequestId};

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::controllers::{course::CourseController, health};
use crate::infrastructure::config::Config;
use crate::infrastructure::repositories::PipelineRepository;

/// Build the application router.
///
/// `local_files` serves the local storage directory under `/files` when
/// audio is stored on disk.
pub fn build_router(
    pipeline_repo: Arc<dyn PipelineRepository>,
    course_controller: Arc<CourseController>,
    local_files: Option<PathBuf>,
) -> Router {
    let course_routes = Router::new()
        .route("/api/courses", post(CourseController::create_course))
        .route("/api/courses/:courseId", get(CourseController::get_course))
        .route(
            "/api/courses/:courseId/exchanges",
            put(CourseController::update_exchanges),
        )
        .route(
            "/api/courses/:courseId/script",
            put(CourseController::update_script),
        )
        .route(
            "/api/courses/:courseId/generate",
            post(CourseController::generate),
        )
        .route("/api/jobs/:jobId", get(CourseController::get_job))
        .with_state(course_controller);

    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pipeline_repo)
        .merge(course_routes);

    if let Some(dir) = local_files {
        app = app.nest_service("/files", ServeDir::new(dir));
    }

    app.layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
