//! Discarding backing for high-churn kinds

use async_trait::async_trait;
use serde_json::Value;

use super::CacheBacking;
use crate::error::CacheResult;
use crate::key::{CacheKey, EntityKind};

/// Stores nothing; every read reports absent
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpBacking;

#[async_trait]
impl CacheBacking for NoOpBacking {
    async fn get(&self, _key: &CacheKey) -> CacheResult<Option<Value>> {
        Ok(None)
    }

    async fn put(&self, _key: CacheKey, _value: Value) -> CacheResult<Option<Value>> {
        Ok(None)
    }

    async fn remove(&self, _key: &CacheKey) -> CacheResult<Option<Value>> {
        Ok(None)
    }

    async fn keys(&self, _kind: EntityKind) -> CacheResult<Vec<CacheKey>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "noop"
    }

    fn stores(&self) -> bool {
        false
    }
}
