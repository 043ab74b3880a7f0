//! In-memory backing

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::CacheBacking;
use crate::error::CacheResult;
use crate::key::{CacheKey, EntityKind};

/// Concurrent hash map backing
#[derive(Debug, Default)]
pub struct MapBacking {
    entries: DashMap<CacheKey, Value>,
}

impl MapBacking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBacking for MapBacking {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: CacheKey, value: Value) -> CacheResult<Option<Value>> {
        Ok(self.entries.insert(key, value))
    }

    async fn remove(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        Ok(self.entries.remove(key).map(|(_, v)| v))
    }

    async fn keys(&self, kind: EntityKind) -> CacheResult<Vec<CacheKey>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.key().kind == kind)
            .map(|entry| *entry.key())
            .collect())
    }

    fn name(&self) -> &'static str {
        "map"
    }
}
