use crate::e2e::helpers;

use helpers::TestContext;
use hyper::StatusCode;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_ok_for_health_check(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);

    // Liveness returns plain text
    let body = String::from_utf8(response.body_bytes.clone()).unwrap();
    assert_eq!(body, "OK");
    assert!(response.body.is_none());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_ready_when_store_is_reachable(ctx: &TestContext) {
    let response = ctx.client.get("/health/ready").await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body_field("status"), "ready");
    assert_eq!(response.body_field("database"), "connected");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_responses(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();
    response.assert_header_exists("x-request-id");

    let response = ctx.client.get("/api/courses/00000000-0000-0000-0000-000000000000").await.unwrap();
    response.assert_header_exists("x-request-id");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_handle_concurrent_health_checks(ctx: &TestContext) {
    let checks = (0..10).map(|_| {
        let client = ctx.client.clone();
        async move { client.get("/health").await }
    });

    for result in futures::future::join_all(checks).await {
        result.unwrap().assert_status(StatusCode::OK);
    }
}
