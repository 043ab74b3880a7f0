//! REST integration tests
//!
//! Run the typed services through the exclusion handler against a scripted transport.

use std::time::Duration;

use chat_core::Snowflake;
use chat_rest::json::MemberModifyRequest;
use chat_rest::{RestClient, RestError, AUDIT_LOG_REASON};
use integration_tests::{
    current_user, guild, json_response, rate_limited, rest_handler, MockHttp, TEST_TOKEN,
};
use serde_json::json;

#[tokio::test(start_paused = true)]
async fn test_rate_limited_request_is_retried_after_retry_after() {
    let http = MockHttp::new();
    http.script(
        "/guilds/1",
        [rate_limited(2), json_response(200, &guild(1, "first"))],
    );
    let rest = RestClient::new(rest_handler(http.clone()));

    let fetched = rest.guild().get_guild(Snowflake::new(1)).await.unwrap();
    assert_eq!(fetched.name, "first");

    let calls = http.calls("/guilds/1");
    assert_eq!(calls.len(), 2);
    assert!(calls[1] - calls[0] >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_client_error_is_not_retried() {
    let http = MockHttp::new();
    let rest = RestClient::new(rest_handler(http.clone()));

    let err = rest.guild().get_guild(Snowflake::new(404)).await.unwrap_err();
    assert!(matches!(err, RestError::RequestRejected { status: 404, .. }));
    assert!(err.is_not_found());
    assert_eq!(http.calls("/guilds/404").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_server_errors_are_retried_then_reported() {
    let http = MockHttp::new();
    http.respond("/users/@me", json_response(502, &json!({"message": "bad gateway"})));
    let rest = RestClient::new(rest_handler(http.clone()));

    let err = rest.user().get_current_user().await.unwrap_err();
    assert!(matches!(err, RestError::RemoteServiceError { status: Some(502), .. }));
    // First attempt plus three retries
    assert_eq!(http.calls("/users/@me").len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_server_error_recovers() {
    let http = MockHttp::new();
    http.script(
        "/users/@me",
        [
            json_response(500, &json!({"message": "oops"})),
            json_response(200, &current_user()),
        ],
    );
    let rest = RestClient::new(rest_handler(http.clone()));

    let user = rest.user().get_current_user().await.unwrap();
    assert_eq!(user.id, Snowflake::new(1));
    assert_eq!(http.calls("/users/@me").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_does_not_block_other_buckets() {
    let http = MockHttp::new();
    http.script(
        "/guilds/1",
        [rate_limited(5), json_response(200, &guild(1, "slow"))],
    );
    http.respond("/guilds/2", json_response(200, &guild(2, "fast")));
    let rest = RestClient::new(rest_handler(http.clone()));

    let guilds = rest.guild();
    let (slow, fast) = tokio::join!(
        guilds.get_guild(Snowflake::new(1)),
        guilds.get_guild(Snowflake::new(2)),
    );
    assert_eq!(slow.unwrap().name, "slow");
    assert_eq!(fast.unwrap().name, "fast");

    let slow_calls = http.calls("/guilds/1");
    let fast_calls = http.calls("/guilds/2");
    assert_eq!(fast_calls.len(), 1);
    assert!(fast_calls[0] < slow_calls[1]);
    assert!(slow_calls[1] - slow_calls[0] >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_audit_reason_and_authorization_headers() {
    let http = MockHttp::new();
    http.respond(
        "/guilds/1/members/2",
        json_response(200, &json!({"user": {"id": "2", "username": "u"}, "nick": "renamed"})),
    );
    let rest = RestClient::new(rest_handler(http.clone()));

    let member = rest
        .guild()
        .modify_guild_member(
            Snowflake::new(1),
            Snowflake::new(2),
            &MemberModifyRequest {
                nick: Some("renamed".to_string()),
                ..MemberModifyRequest::default()
            },
            Some("cleanup"),
        )
        .await
        .unwrap();
    assert_eq!(member.nick.as_deref(), Some("renamed"));

    let requests = http.requests();
    let request = &requests[0];
    assert!(request
        .headers
        .contains(&("Authorization".to_string(), format!("Bot {TEST_TOKEN}"))));
    assert!(request
        .headers
        .contains(&(AUDIT_LOG_REASON.to_string(), "cleanup".to_string())));
    assert_eq!(request.body.as_deref(), Some(r#"{"nick":"renamed"}"#));
}
