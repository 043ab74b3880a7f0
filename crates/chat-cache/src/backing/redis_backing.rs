//! Redis backing
//!
//! Each entry is stored as JSON under its storage key; a set per kind indexes the keys.

use async_trait::async_trait;
use serde_json::Value;

use super::CacheBacking;
use crate::error::CacheResult;
use crate::key::{CacheKey, EntityKind};
use crate::pool::SharedRedisPool;

#[derive(Debug, Clone)]
pub struct RedisBacking {
    pool: SharedRedisPool,
}

impl RedisBacking {
    pub fn new(pool: SharedRedisPool) -> Self {
        Self { pool }
    }
}

fn decode(raw: Option<String>) -> CacheResult<Option<Value>> {
    raw.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(Into::into)
}

#[async_trait]
impl CacheBacking for RedisBacking {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let mut conn = self.pool.get().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(key.storage_key())
            .query_async(&mut conn)
            .await?;
        decode(raw)
    }

    async fn put(&self, key: CacheKey, value: Value) -> CacheResult<Option<Value>> {
        let mut conn = self.pool.get().await?;
        let storage_key = key.storage_key();
        let serialized = serde_json::to_string(&value)?;

        let (previous,): (Option<String>,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&storage_key)
            .arg(serialized)
            .arg("GET")
            .cmd("SADD")
            .arg(CacheKey::index_key(key.kind))
            .arg(&storage_key)
            .ignore()
            .query_async(&mut conn)
            .await?;
        decode(previous)
    }

    async fn remove(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let mut conn = self.pool.get().await?;
        let storage_key = key.storage_key();

        let (previous,): (Option<String>,) = redis::pipe()
            .atomic()
            .cmd("GETDEL")
            .arg(&storage_key)
            .cmd("SREM")
            .arg(CacheKey::index_key(key.kind))
            .arg(&storage_key)
            .ignore()
            .query_async(&mut conn)
            .await?;
        decode(previous)
    }

    async fn keys(&self, kind: EntityKind) -> CacheResult<Vec<CacheKey>> {
        let mut conn = self.pool.get().await?;
        let members: Vec<String> = redis::cmd("SMEMBERS")
            .arg(CacheKey::index_key(kind))
            .query_async(&mut conn)
            .await?;

        let mut keys = Vec::with_capacity(members.len());
        for member in members {
            match CacheKey::parse(&member) {
                Ok(key) => keys.push(key),
                Err(e) => tracing::warn!(key = %member, error = %e, "Skipping malformed index entry"),
            }
        }
        Ok(keys)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
