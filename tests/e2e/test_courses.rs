use crate::e2e::helpers;

use async_trait::async_trait;
use convolab_audio::domain::pipeline::{
    CourseRecord, CourseStatus, PipelineServiceApi, PipelineServiceError, UpdateExchangesRequest,
    UpdateScriptRequest, INTERRUPTED_RUN_MESSAGE,
};
use convolab_audio::error::AppResult;
use convolab_audio::infrastructure::repositories::{
    InMemoryPipelineRepository, PipelineRepository,
};
use helpers::fakes::{FakeTts, MemoryStorage};
use helpers::{
    build_service, course_request, create_course, exchange, TestContext, NARRATOR_VOICE,
};
use std::sync::Arc;
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_context::test_context;
use uuid::Uuid;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_create_course_at_exchanges_stage(ctx: &TestContext) {
    let request = course_request(
        "Ordering coffee",
        vec![exchange(0, "コーヒーをください", "A coffee, please.")],
    );

    let response = ctx.client.post("/api/courses", &request).await.unwrap();

    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.body_field("title"), "Ordering coffee");
    assert_eq!(response.body_field("stage"), "exchanges");
    assert_eq!(response.body_field("status"), "draft");
    assert_eq!(response.body_field("narratorVoiceId"), NARRATOR_VOICE);
    assert_eq!(response.body_field("exchanges").as_array().unwrap().len(), 1);
    assert!(response.body_field("scriptUnits").is_null());
    assert!(response.body_field("audioUrl").is_null());
    assert!(Uuid::parse_str(response.body_field("id").as_str().unwrap()).is_ok());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fetch_created_course(ctx: &TestContext) {
    let id = create_course(&ctx.client).await;

    let response = ctx.client.get(&format!("/api/courses/{}", id)).await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body_field("id"), id.as_str());
    assert_eq!(response.body_field("nativeLanguage"), "en");
    assert_eq!(response.body_field("targetLanguage"), "ja");
    assert_eq!(response.body_field("exchanges").as_array().unwrap().len(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_course_without_title(ctx: &TestContext) {
    let request = course_request("   ", vec![]);

    let response = ctx.client.post("/api/courses", &request).await.unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("title must not be empty");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_non_positive_target_duration(ctx: &TestContext) {
    let mut request = course_request("Timed", vec![]);
    request["targetDurationSeconds"] = json!(0);

    let response = ctx.client.post("/api/courses", &request).await.unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("targetDurationSeconds must be positive");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_json(ctx: &TestContext) {
    let response = ctx.client.post_raw("/api/courses", "{not json").await.unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_for_unknown_course(ctx: &TestContext) {
    let response = ctx
        .client
        .get(&format!("/api/courses/{}", Uuid::new_v4()))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_message("Course not found");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_invalid_course_id(ctx: &TestContext) {
    let response = ctx.client.get("/api/courses/not-a-uuid").await.unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_store_edited_script_and_skip_unknown_units(ctx: &TestContext) {
    let id = create_course(&ctx.client).await;
    let body = json!({
        "scriptUnits": [
            { "type": "marker", "label": "intro" },
            { "type": "narration", "text": "Listen.", "voiceId": NARRATOR_VOICE },
            { "type": "jingle", "file": "intro.wav" },
            { "type": "target", "text": "はい", "voiceId": "ja-JP-Neural2-B" },
            { "type": "pause", "seconds": 1.5 }
        ]
    });

    let response = ctx
        .client
        .put(&format!("/api/courses/{}/script", id), &body)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body_field("stage"), "script");
    assert_eq!(response.body_field("status"), "draft");
    let units = response.body_field("scriptUnits").as_array().unwrap();
    assert_eq!(units.len(), 4);
    assert_eq!(units[2]["type"], "target");
    assert_eq!(units[2]["speed"], 1.0);
    // Exchanges survive a script edit
    assert_eq!(response.body_field("exchanges").as_array().unwrap().len(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_discard_script_when_exchanges_change(ctx: &TestContext) {
    let id = create_course(&ctx.client).await;
    let script = json!({
        "scriptUnits": [{ "type": "narration", "text": "Hi", "voiceId": NARRATOR_VOICE }]
    });
    ctx.client
        .put(&format!("/api/courses/{}/script", id), &script)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);

    let exchanges = json!({ "exchanges": [exchange(0, "ありがとう", "Thank you.")] });
    let response = ctx
        .client
        .put(&format!("/api/courses/{}/exchanges", id), &exchanges)
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body_field("stage"), "exchanges");
    assert!(response.body_field("scriptUnits").is_null());
    assert_eq!(response.body_field("exchanges")[0]["text"], "ありがとう");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_edits_while_generating(ctx: &TestContext) {
    let id = create_course(&ctx.client).await;
    let course_id = Uuid::parse_str(&id).unwrap();
    assert!(ctx.repo.try_claim(course_id).await.unwrap().is_some());

    let exchanges = json!({ "exchanges": [exchange(0, "はい", "Yes.")] });
    let response = ctx
        .client
        .put(&format!("/api/courses/{}/exchanges", id), &exchanges)
        .await
        .unwrap();
    response
        .assert_status(StatusCode::CONFLICT)
        .assert_error_message("already generating");

    let script = json!({ "scriptUnits": [] });
    let response = ctx
        .client
        .put(&format!("/api/courses/{}/script", id), &script)
        .await
        .unwrap();
    response.assert_status(StatusCode::CONFLICT);
}

/// Course store where a generate request claims the course right after
/// every read, the worst interleaving for an edit.
struct ClaimAfterRead {
    inner: Arc<InMemoryPipelineRepository>,
}

#[async_trait]
impl PipelineRepository for ClaimAfterRead {
    async fn insert(&self, course: &CourseRecord) -> AppResult<()> {
        self.inner.insert(course).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CourseRecord>> {
        let course = self.inner.find_by_id(id).await?;
        self.inner.try_claim(id).await?;
        Ok(course)
    }

    async fn save(&self, course: &CourseRecord) -> AppResult<()> {
        self.inner.save(course).await
    }

    async fn save_if_idle(&self, course: &CourseRecord) -> AppResult<bool> {
        self.inner.save_if_idle(course).await
    }

    async fn try_claim(&self, id: Uuid) -> AppResult<Option<CourseRecord>> {
        self.inner.try_claim(id).await
    }

    async fn fail_interrupted(&self, message: &str) -> AppResult<u64> {
        self.inner.fail_interrupted(message).await
    }

    async fn ping(&self) -> AppResult<()> {
        self.inner.ping().await
    }
}

fn draft_course() -> CourseRecord {
    CourseRecord::new(
        "Claimed mid-edit".into(),
        "en".into(),
        "ja".into(),
        NARRATOR_VOICE.into(),
        None,
        vec![],
    )
}

#[tokio::test]
async fn it_should_not_let_an_edit_override_a_claim_taken_after_the_read() {
    let store = Arc::new(InMemoryPipelineRepository::new());
    let service = build_service(
        Arc::new(ClaimAfterRead {
            inner: store.clone(),
        }),
        Arc::new(FakeTts::default()),
        Arc::new(MemoryStorage::default()),
    );

    let script_course = draft_course();
    let exchanges_course = draft_course();
    store.insert(&script_course).await.unwrap();
    store.insert(&exchanges_course).await.unwrap();

    let script_edit = service
        .update_script(
            script_course.id,
            UpdateScriptRequest {
                script_units: vec![
                    json!({ "type": "narration", "text": "Hi", "voiceId": NARRATOR_VOICE }),
                ],
            },
        )
        .await;
    assert!(matches!(
        script_edit,
        Err(PipelineServiceError::AlreadyGenerating)
    ));

    let exchanges_edit = service
        .update_exchanges(
            exchanges_course.id,
            UpdateExchangesRequest { exchanges: vec![] },
        )
        .await;
    assert!(matches!(
        exchanges_edit,
        Err(PipelineServiceError::AlreadyGenerating)
    ));

    for id in [script_course.id, exchanges_course.id] {
        let stored = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.status(), CourseStatus::Generating);
        assert!(stored.state().script_units().is_none());
        // The claim still excludes a second run
        assert!(store.try_claim(id).await.unwrap().is_none());
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_release_courses_left_generating_by_a_previous_process(ctx: &TestContext) {
    let id = create_course(&ctx.client).await;
    let course_id = Uuid::parse_str(&id).unwrap();
    assert!(ctx.repo.try_claim(course_id).await.unwrap().is_some());

    let released = ctx.repo.fail_interrupted(INTERRUPTED_RUN_MESSAGE).await.unwrap();
    assert_eq!(released, 1);

    let course = ctx.client.get(&format!("/api/courses/{}", id)).await.unwrap();
    course.assert_status(StatusCode::OK);
    assert_eq!(course.body_field("status"), "error");
    assert_eq!(course.body_field("errorMessage"), INTERRUPTED_RUN_MESSAGE);

    // Editable again
    let exchanges = json!({ "exchanges": [exchange(0, "はい", "Yes.")] });
    ctx.client
        .put(&format!("/api/courses/{}/exchanges", id), &exchanges)
        .await
        .unwrap()
        .assert_status(StatusCode::OK);
}
