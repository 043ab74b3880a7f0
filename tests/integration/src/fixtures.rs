//! Test fixtures and data generators
//!
//! Provides gateway payloads, REST bodies and configurations shared by the integration tests.

use std::sync::atomic::{AtomicU64, Ordering};

use chat_common::ClientConfig;
use chat_core::Snowflake;
use chat_rest::HttpResponse;
use serde_json::{json, Value};

use crate::helpers::{TEST_API_BASE, TEST_GATEWAY_URL, TEST_TOKEN};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A snowflake no other test uses
pub fn unique_id() -> Snowflake {
    Snowflake::new(1_000_000 + i64::try_from(unique_suffix()).unwrap_or_default())
}

// ============================================================================
// REST bodies
// ============================================================================

/// Body of `GET /users/@me`
pub fn current_user() -> Value {
    json!({"id": "1", "username": "test-bot", "discriminator": "0000", "bot": true})
}

/// Body of `GET /gateway/bot`
pub fn gateway_bot(shards: u32) -> Value {
    json!({
        "url": TEST_GATEWAY_URL,
        "shards": shards,
        "session_start_limit": {
            "total": 1000,
            "remaining": 1000,
            "reset_after": 0,
            "max_concurrency": 1
        }
    })
}

pub fn guild(id: u64, name: &str) -> Value {
    json!({"id": id.to_string(), "name": name, "owner_id": "1"})
}

/// A response carrying `body` as JSON
pub fn json_response(status: u16, body: &Value) -> HttpResponse {
    HttpResponse::new(status, body.to_string()).with_header("content-type", "application/json")
}

/// A 429 asking to wait `secs` seconds
pub fn rate_limited(secs: u64) -> HttpResponse {
    json_response(
        429,
        &json!({"message": "You are being rate limited.", "retry_after": secs, "global": false}),
    )
    .with_header("retry-after", secs)
}

// ============================================================================
// Gateway dispatches
// ============================================================================

/// Data of READY for `shard`
pub fn ready(session_id: &str, shard: [u32; 2]) -> Value {
    json!({
        "v": 10,
        "session_id": session_id,
        "resume_gateway_url": TEST_GATEWAY_URL,
        "user": current_user(),
        "guilds": [],
        "shard": shard
    })
}

/// Data of GUILD_CREATE with one member per user id
pub fn guild_create(guild_id: u64, user_ids: &[u64]) -> Value {
    let members: Vec<Value> = user_ids
        .iter()
        .map(|id| {
            json!({
                "user": {"id": id.to_string(), "username": format!("user-{id}")},
                "nick": null,
                "roles": []
            })
        })
        .collect();
    let mut guild = guild(guild_id, &format!("guild-{guild_id}"));
    guild["members"] = Value::Array(members);
    guild["channels"] = json!([]);
    guild["roles"] = json!([{"id": guild_id.to_string(), "name": "@everyone"}]);
    guild
}

/// Data of GUILD_MEMBER_UPDATE setting a nickname
pub fn member_update(guild_id: u64, user_id: u64, nick: &str) -> Value {
    json!({
        "guild_id": guild_id.to_string(),
        "user": {"id": user_id.to_string(), "username": format!("user-{user_id}")},
        "nick": nick,
        "roles": []
    })
}

// ============================================================================
// Configuration
// ============================================================================

/// Client configuration against the scripted services, with fast reconnects
pub fn test_client_config() -> ClientConfig {
    let mut config = ClientConfig::new(TEST_TOKEN);
    config.api_base_url = TEST_API_BASE.to_string();
    config.retry_base_ms = 100;
    config.retry_max_ms = 1_000;
    config.retry_max_attempts = 5;
    config.rest_max_server_retries = 2;
    config.identify_window_ms = 100;
    config
}
