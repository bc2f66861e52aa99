use crate::helpers;

use chatquota_backend::domain::usage::{UsageIdentity, UsageTier};
use helpers::api_client::As;
use helpers::assertions::{assert_usage_response, split_usage_frame};
use helpers::mock_upstream::{FAIL_PROMPT, REPLY_TOKENS};
use helpers::{generate_test_jwt, TestContext};
use hyper::StatusCode;
use serde_json::{json, Value};
use test_context::test_context;

const GUEST_IP: &str = "192.0.2.44";

fn chat_body(prompt: &str) -> Value {
    json!({
        "messages": [
            { "role": "system", "content": "You are terse." },
            { "role": "user", "content": prompt }
        ]
    })
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_stream_reply_then_usage_update(ctx: &TestContext) {
    let response = ctx
        .client
        .post_as("/api/chat", &chat_body("Say hello"), As::ip(GUEST_IP))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("cache-control", "no-cache");
    assert!(response
        .header("content-type")
        .is_some_and(|v| v.starts_with("text/plain")));

    let body = response.text();
    let (text, usage) = split_usage_frame(&body);

    assert_eq!(text, REPLY_TOKENS.concat());
    assert_usage_response(&usage.expect("Missing usage frame"), 1, 10, "guest");

    let identity = UsageIdentity::Ip(GUEST_IP.to_string());
    assert_eq!(ctx.fixtures.usage_today(&identity).await.unwrap(), Some(1));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_charge_signed_in_user_not_address(ctx: &TestContext) {
    let user_id = ctx.fixtures.create_premium_user().await.unwrap();
    let token = generate_test_jwt(&user_id, &ctx.config.jwt_secret);

    let response = ctx
        .client
        .post_as(
            "/api/chat",
            &chat_body("Say hello"),
            As {
                ip: Some(GUEST_IP),
                token: Some(&token),
            },
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.text();
    let (_, usage) = split_usage_frame(&body);
    assert_usage_response(&usage.unwrap(), 1, 50, "premium");

    assert_eq!(
        ctx.fixtures
            .usage_today(&UsageIdentity::User(user_id))
            .await
            .unwrap(),
        Some(1)
    );
    assert_eq!(
        ctx.fixtures
            .usage_today(&UsageIdentity::Ip(GUEST_IP.to_string()))
            .await
            .unwrap(),
        None
    );
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_treat_invalid_token_as_guest(ctx: &TestContext) {
    let response = ctx
        .client
        .post_as(
            "/api/chat",
            &chat_body("Say hello"),
            As {
                ip: Some(GUEST_IP),
                token: Some("not-a-jwt"),
            },
        )
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.text();
    let (_, usage) = split_usage_frame(&body);
    assert_usage_response(&usage.unwrap(), 1, 10, "guest");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refuse_when_daily_limit_reached(ctx: &TestContext) {
    let identity = UsageIdentity::Ip(GUEST_IP.to_string());
    ctx.fixtures
        .add_usage_today(&identity, 10, UsageTier::Guest)
        .await
        .unwrap();

    let response = ctx
        .client
        .post_as("/api/chat", &chat_body("One more?"), As::ip(GUEST_IP))
        .await
        .unwrap();

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(ctx.upstream.calls(), 0);
    assert_eq!(ctx.fixtures.usage_today(&identity).await.unwrap(), Some(10));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_allow_exactly_ten_guest_chats(ctx: &TestContext) {
    for _ in 0..10 {
        ctx.client
            .post_as("/api/chat", &chat_body("Again"), As::ip(GUEST_IP))
            .await
            .unwrap()
            .assert_status(StatusCode::OK);
    }

    let response = ctx
        .client
        .post_as("/api/chat", &chat_body("Again"), As::ip(GUEST_IP))
        .await
        .unwrap();
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);

    let usage = ctx
        .client
        .get_as("/api/usage", As::ip(GUEST_IP))
        .await
        .unwrap();
    assert_usage_response(usage.body.as_ref().unwrap(), 10, 10, "guest");
    assert_eq!(ctx.upstream.calls(), 10);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_empty_conversation(ctx: &TestContext) {
    let response = ctx
        .client
        .post_as("/api/chat", &json!({ "messages": [] }), As::ip(GUEST_IP))
        .await
        .unwrap();

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(ctx.upstream.calls(), 0);
    assert_eq!(ctx.fixtures.usage_row_count().await.unwrap(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_charge_when_provider_fails(ctx: &TestContext) {
    let response = ctx
        .client
        .post_as("/api/chat", &chat_body(FAIL_PROMPT), As::ip(GUEST_IP))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_error_message("model overloaded");
    assert_eq!(ctx.upstream.calls(), 1);
    assert_eq!(ctx.fixtures.usage_row_count().await.unwrap(), 0);
}
