//! Storage backings for the data cache

mod map;
mod noop;
mod redis_backing;

pub use map::MapBacking;
pub use noop::NoOpBacking;
pub use redis_backing::RedisBacking;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CacheResult;
use crate::key::{CacheKey, EntityKind};

/// Key-value storage for one or more entity kinds
#[async_trait]
pub trait CacheBacking: Send + Sync + std::fmt::Debug {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>>;

    /// Store `value`, returning the value it replaced
    async fn put(&self, key: CacheKey, value: Value) -> CacheResult<Option<Value>>;

    /// Evict `key`, returning the evicted value
    async fn remove(&self, key: &CacheKey) -> CacheResult<Option<Value>>;

    /// Every key of `kind` currently stored
    async fn keys(&self, kind: EntityKind) -> CacheResult<Vec<CacheKey>>;

    /// Short name for logs
    fn name(&self) -> &'static str;

    /// False for backings that discard everything
    fn stores(&self) -> bool {
        true
    }
}
