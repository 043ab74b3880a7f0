//! Cache integration tests
//!
//! Per-kind backing routing, and the Redis backing when `CHAT_REDIS_URL` is set.
//!
//! Run with: `CHAT_REDIS_URL=redis://127.0.0.1:6379 cargo test -p integration-tests`

use chat_cache::{BackingKind, CacheConfig, CacheKey, DataCache, EntityKind, RedisPoolConfig};
use chat_core::{MemberData, Snowflake};
use integration_tests::{check_test_env, redis_url, unique_id};
use serde_json::json;

#[tokio::test]
async fn test_noop_kind_reads_as_absent() {
    let cache = DataCache::from_config(&CacheConfig::default()).unwrap();
    let message = CacheKey::message(Snowflake::new(5));

    cache
        .put(message, json!({"id": "5", "channel_id": "1", "content": "hi"}))
        .await
        .unwrap();
    assert!(!cache.is_cached(EntityKind::Message));
    assert!(cache.get(&message).await.unwrap().is_none());

    let guild = CacheKey::guild(Snowflake::new(1));
    cache.put(guild, json!({"id": "1", "name": "g"})).await.unwrap();
    assert!(cache.get(&guild).await.unwrap().is_some());
}

#[tokio::test]
async fn test_redis_backing_round_trip() {
    if !check_test_env().await {
        return;
    }
    let Some(url) = redis_url() else {
        return;
    };

    let config = CacheConfig {
        default_backing: BackingKind::Redis,
        redis: Some(RedisPoolConfig::from_url(url)),
        ..CacheConfig::default()
    }
    .with_backing(EntityKind::Message, BackingKind::Redis);
    let cache = DataCache::from_config(&config).unwrap();

    let guild_id = unique_id();
    let user_id = unique_id();
    let key = CacheKey::member(guild_id, user_id);
    let member = json!({
        "guild_id": guild_id,
        "user_id": user_id,
        "nick": "first",
        "roles": []
    });

    assert!(cache.put(key, member).await.unwrap().is_none());
    let (old, merged) = cache.merge(key, json!({"nick": "second"})).await.unwrap();
    assert_eq!(old.unwrap()["nick"], "first");
    assert_eq!(merged["nick"], "second");

    let members: Vec<MemberData> = cache.members(guild_id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].nick.as_deref(), Some("second"));

    assert_eq!(cache.remove_guild_entries(guild_id).await.unwrap(), 1);
    assert!(cache.get(&key).await.unwrap().is_none());
}
