use crate::e2e::helpers;

use convolab_audio::domain::duration::{estimate_seconds, MAX_REVIEW_ROUNDS};
use convolab_audio::domain::script::ScriptUnit;
use convolab_audio::infrastructure::repositories::PipelineRepository;
use helpers::fakes::LINE_MS;
use helpers::{course_request, create_course, wait_for_job, TestContext, NARRATOR_VOICE};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_context::test_context;
use uuid::Uuid;

async fn generate_and_wait(ctx: &TestContext, id: &str) -> helpers::api_client::ApiResponse {
    let response = ctx
        .client
        .post_empty(&format!("/api/courses/{}/generate", id))
        .await
        .unwrap();
    response.assert_status(StatusCode::ACCEPTED);
    assert_eq!(response.body_field("alreadyReady"), false);
    assert_eq!(response.body_field("status"), "generating");

    let job_id = response.body_field("jobId").as_str().unwrap().to_string();
    wait_for_job(&ctx.client, &job_id).await
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_generate_course_audio(ctx: &TestContext) {
    let id = create_course(&ctx.client).await;

    let job = generate_and_wait(ctx, &id).await;

    assert_eq!(job.body_field("state"), "completed");
    assert_eq!(job.body_field("progress"), 100);
    assert_eq!(job.body_field("attempts"), 1);
    assert_eq!(
        job.body_field("name").as_str().unwrap(),
        format!("generate-course:{}", id)
    );

    let course = ctx.client.get(&format!("/api/courses/{}", id)).await.unwrap();
    course.assert_status(StatusCode::OK);
    assert_eq!(course.body_field("stage"), "audio-ready");
    assert_eq!(course.body_field("status"), "ready");

    let audio_url = course.body_field("audioUrl").as_str().unwrap();
    assert!(audio_url.starts_with(&format!("memory://courses/{}/", id)));
    assert!(audio_url.ends_with(".mp3"));
    assert_eq!(ctx.storage.upload_count(), 1);

    // Welcome, four drill lines per exchange and the outro; 9s of pauses
    let segments = course.body_field("segments").as_array().unwrap();
    assert_eq!(segments.len(), 10);
    assert_eq!(course.body_field("approxDurationSeconds"), 14.0);

    let mut last_end = 0;
    let mut last_index = None;
    for segment in segments {
        let start = segment["startTimeMs"].as_u64().unwrap();
        let end = segment["endTimeMs"].as_u64().unwrap();
        let index = segment["unitIndex"].as_u64().unwrap();
        assert_eq!(end - start, LINE_MS);
        assert!(start >= last_end, "segments overlap at unit {}", index);
        assert!(last_index.map_or(true, |last| index > last));
        last_end = end;
        last_index = Some(index);
    }

    let units = course.body_field("scriptUnits").as_array().unwrap();
    assert_eq!(units[0], json!({ "type": "marker", "label": "intro" }));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_resynthesize_ready_course(ctx: &TestContext) {
    let id = create_course(&ctx.client).await;
    generate_and_wait(ctx, &id).await;
    let calls = ctx.tts.calls();
    let before = ctx.client.get(&format!("/api/courses/{}", id)).await.unwrap();

    let response = ctx
        .client
        .post_empty(&format!("/api/courses/{}/generate", id))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body_field("alreadyReady"), true);
    assert_eq!(response.body_field("status"), "ready");
    assert!(response.body_field("jobId").is_null());
    assert_eq!(ctx.tts.calls(), calls);
    assert_eq!(ctx.storage.upload_count(), 1);

    let after = ctx.client.get(&format!("/api/courses/{}", id)).await.unwrap();
    assert_eq!(after.body_field("audioUrl"), before.body_field("audioUrl"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_regenerate_after_script_edit(ctx: &TestContext) {
    let id = create_course(&ctx.client).await;
    generate_and_wait(ctx, &id).await;
    let calls = ctx.tts.calls();

    let script = json!({
        "scriptUnits": [
            { "type": "narration", "text": "One more time.", "voiceId": NARRATOR_VOICE },
            { "type": "pause", "seconds": 2 },
            { "type": "target", "text": "はい", "voiceId": "ja-JP-Neural2-B" }
        ]
    });
    let edited = ctx
        .client
        .put(&format!("/api/courses/{}/script", id), &script)
        .await
        .unwrap();
    edited.assert_status(StatusCode::OK);
    assert_eq!(edited.body_field("stage"), "script");
    assert!(edited.body_field("audioUrl").is_null());

    let job = generate_and_wait(ctx, &id).await;
    assert_eq!(job.body_field("state"), "completed");
    assert!(ctx.tts.calls() > calls);

    let course = ctx.client.get(&format!("/api/courses/{}", id)).await.unwrap();
    let segments = course.body_field("segments").as_array().unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[1]["unitIndex"], 2);
    assert_eq!(segments[1]["startTimeMs"], 2500);
    assert_eq!(course.body_field("approxDurationSeconds"), 3.0);
    assert_eq!(ctx.storage.upload_count(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_mark_course_failed_when_provider_fails(ctx: &TestContext) {
    let id = create_course(&ctx.client).await;
    ctx.tts.set_failing(true);

    let job = generate_and_wait(ctx, &id).await;

    assert_eq!(job.body_field("state"), "failed");
    assert_eq!(job.body_field("attempts"), 2);
    assert!(job
        .body_field("error")
        .as_str()
        .unwrap()
        .contains("quota exceeded"));

    let course = ctx.client.get(&format!("/api/courses/{}", id)).await.unwrap();
    assert_eq!(course.body_field("status"), "error");
    assert_eq!(course.body_field("stage"), "error");
    assert!(course
        .body_field("errorMessage")
        .as_str()
        .unwrap()
        .contains("quota exceeded"));
    // The generated script is kept for the next run
    assert!(course.body_field("scriptUnits").is_array());
    assert!(course.body_field("audioUrl").is_null());
    assert_eq!(ctx.storage.upload_count(), 0);

    ctx.tts.set_failing(false);
    let job = generate_and_wait(ctx, &id).await;
    assert_eq!(job.body_field("state"), "completed");

    let course = ctx.client.get(&format!("/api/courses/{}", id)).await.unwrap();
    assert_eq!(course.body_field("status"), "ready");
    assert!(course.body_field("errorMessage").is_null());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_pad_course_towards_target_duration(ctx: &TestContext) {
    let mut request = course_request(
        "Padded",
        vec![
            helpers::exchange(0, "駅はどこですか", "Where is the station?"),
            helpers::exchange(1, "あそこです", "It is over there."),
        ],
    );
    request["targetDurationSeconds"] = json!(120);
    let created = ctx.client.post("/api/courses", &request).await.unwrap();
    created.assert_status(StatusCode::CREATED);
    let id = created.body_field("id").as_str().unwrap().to_string();

    let job = generate_and_wait(ctx, &id).await;
    assert_eq!(job.body_field("state"), "completed");

    let course = ctx.client.get(&format!("/api/courses/{}", id)).await.unwrap();
    let units: Vec<ScriptUnit> =
        serde_json::from_value(course.body_field("scriptUnits").clone()).unwrap();

    let round_labels: Vec<String> = units
        .iter()
        .filter_map(|unit| match unit {
            ScriptUnit::Marker { label } if label.starts_with("review-round-") => {
                Some(label.clone())
            }
            _ => None,
        })
        .collect();
    let rounds = round_labels.len();
    assert!((1..=MAX_REVIEW_ROUNDS).contains(&rounds));
    let expected: Vec<String> = (1..=rounds).map(|n| format!("review-round-{}", n)).collect();
    assert_eq!(round_labels, expected);

    // Lands in [0.9, 1.05] x target unless the round cap stopped it short
    let estimate = estimate_seconds(&units);
    assert!(
        (108.0..=126.0).contains(&estimate) || rounds == MAX_REVIEW_ROUNDS,
        "estimate {} with {} rounds",
        estimate,
        rounds
    );

    let approx = course.body_field("approxDurationSeconds").as_f64().unwrap();
    assert!(approx > 0.0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_generation_without_content(ctx: &TestContext) {
    let request = course_request("Empty", vec![]);
    let created = ctx.client.post("/api/courses", &request).await.unwrap();
    let id = created.body_field("id").as_str().unwrap().to_string();

    let response = ctx
        .client
        .post_empty(&format!("/api/courses/{}/generate", id))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("no exchanges or script");
    assert_eq!(ctx.tts.calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_generation_while_generating(ctx: &TestContext) {
    let id = create_course(&ctx.client).await;
    let course_id = Uuid::parse_str(&id).unwrap();
    assert!(ctx.repo.try_claim(course_id).await.unwrap().is_some());

    let response = ctx
        .client
        .post_empty(&format!("/api/courses/{}/generate", id))
        .await
        .unwrap();

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(ctx.tts.calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_for_unknown_targets(ctx: &TestContext) {
    let response = ctx
        .client
        .post_empty(&format!("/api/courses/{}/generate", Uuid::new_v4()))
        .await
        .unwrap();
    response.assert_status(StatusCode::NOT_FOUND);

    let response = ctx
        .client
        .get(&format!("/api/jobs/{}", Uuid::new_v4()))
        .await
        .unwrap();
    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_message("Job not found");
}
