use convolab_audio::controllers::course::CourseController;
use convolab_audio::domain::audio::AudioAssembler;
use convolab_audio::domain::pipeline::{PipelineRunner, PipelineService, PipelineServiceApi};
use convolab_audio::domain::script::{DrillScriptGenerator, ScriptGenerator};
use convolab_audio::domain::tts::TtsService;
use convolab_audio::infrastructure::http::build_router;
use convolab_audio::infrastructure::jobs::{JobQueue, RetryPolicy};
use convolab_audio::infrastructure::repositories::{
    InMemoryPipelineRepository, PipelineRepository,
};
use hyper::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;

pub mod api_client;
pub mod fakes;

use api_client::{ApiResponse, TestClient};
use fakes::{FakeMedia, FakeTts, MemoryStorage};

pub const NARRATOR_VOICE: &str = "en-US-Neural2-D";
pub const SPEAKER_VOICE: &str = "ja-JP-Neural2-B";

pub struct TestContext {
    pub client: TestClient,
    pub tts: Arc<FakeTts>,
    pub storage: Arc<MemoryStorage>,
    #[allow(dead_code)]
    pub repo: Arc<InMemoryPipelineRepository>,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let repo = Arc::new(InMemoryPipelineRepository::new());
            let tts = Arc::new(FakeTts::default());
            let storage = Arc::new(MemoryStorage::default());

            let app = create_app(repo.clone(), tts.clone(), storage.clone());

            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            // Wait for server to be ready
            tokio::time::sleep(Duration::from_millis(50)).await;

            Self {
                client: TestClient::new(&base_url),
                tts,
                storage,
                repo,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }
}

fn create_app(
    repo: Arc<InMemoryPipelineRepository>,
    tts: Arc<FakeTts>,
    storage: Arc<MemoryStorage>,
) -> axum::Router {
    let pipeline_repo: Arc<dyn PipelineRepository> = repo;
    let service = build_service(pipeline_repo.clone(), tts, storage);
    let controller = Arc::new(CourseController::new(service));

    build_router(pipeline_repo, controller, None)
}

/// Pipeline service over `repo` with fake providers, media and storage.
pub fn build_service(
    repo: Arc<dyn PipelineRepository>,
    tts: Arc<FakeTts>,
    storage: Arc<MemoryStorage>,
) -> Arc<dyn PipelineServiceApi> {
    // One fake serves both providers
    let tts_service = Arc::new(TtsService::new(tts.clone(), tts));
    let assembler = Arc::new(AudioAssembler::new(
        tts_service,
        Arc::new(FakeMedia),
        storage,
    ));
    let generator: Arc<dyn ScriptGenerator> = Arc::new(DrillScriptGenerator::new());
    let runner = Arc::new(PipelineRunner::new(repo, generator, assembler));

    let queue = JobQueue::start(2, RetryPolicy::new(2, Duration::from_millis(10)));
    Arc::new(PipelineService::new(runner, queue))
}

pub fn exchange(order: u32, text: &str, translation: &str) -> Value {
    json!({
        "order": order,
        "speakerName": "Yuki",
        "speakerVoiceId": SPEAKER_VOICE,
        "text": text,
        "translation": translation
    })
}

pub fn course_request(title: &str, exchanges: Vec<Value>) -> Value {
    json!({
        "title": title,
        "nativeLanguage": "en",
        "targetLanguage": "ja",
        "narratorVoiceId": NARRATOR_VOICE,
        "exchanges": exchanges
    })
}

/// Create a two-line course and return its id.
pub async fn create_course(client: &TestClient) -> String {
    let request = course_request(
        "At the station",
        vec![
            exchange(0, "駅はどこですか", "Where is the station?"),
            exchange(1, "あそこです", "It is over there."),
        ],
    );
    let response = client.post("/api/courses", &request).await.unwrap();
    response.assert_status(StatusCode::CREATED);
    response.body_field("id").as_str().unwrap().to_string()
}

/// Poll a job until it reaches a terminal state.
pub async fn wait_for_job(client: &TestClient, job_id: &str) -> ApiResponse {
    for _ in 0..200 {
        let response = client.get(&format!("/api/jobs/{}", job_id)).await.unwrap();
        response.assert_status(StatusCode::OK);
        let state = response.body_field("state").as_str().unwrap_or_default().to_string();
        if state == "completed" || state == "failed" {
            return response;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Job {} did not finish in time", job_id);
}
