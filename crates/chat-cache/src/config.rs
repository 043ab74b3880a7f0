//! Cache configuration

use std::collections::HashMap;

use chat_common::ClientConfig;

use crate::key::EntityKind;
use crate::pool::RedisPoolConfig;

/// Storage used for a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingKind {
    /// In-process concurrent map
    Map,
    /// Discard; reads of the kind always report absent
    NoOp,
    /// Shared Redis instance
    Redis,
}

/// Which backing each entity kind uses
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Backing for kinds without an override
    pub default_backing: BackingKind,
    /// Per-kind overrides
    pub overrides: HashMap<EntityKind, BackingKind>,
    /// Required when any kind uses [`BackingKind::Redis`]
    pub redis: Option<RedisPoolConfig>,
}

impl Default for CacheConfig {
    /// Everything in memory except messages, which are discarded
    fn default() -> Self {
        Self {
            default_backing: BackingKind::Map,
            overrides: HashMap::from([(EntityKind::Message, BackingKind::NoOp)]),
            redis: None,
        }
    }
}

impl CacheConfig {
    /// Backing used for `kind`
    pub fn backing_for(&self, kind: EntityKind) -> BackingKind {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or(self.default_backing)
    }

    pub fn with_backing(mut self, kind: EntityKind, backing: BackingKind) -> Self {
        self.overrides.insert(kind, backing);
        self
    }
}

impl From<&ClientConfig> for CacheConfig {
    fn from(config: &ClientConfig) -> Self {
        let mut cache = Self::default();
        if let Some(url) = &config.redis_url {
            cache.default_backing = BackingKind::Redis;
            cache.redis = Some(RedisPoolConfig::from_url(url.clone()));
        }
        if config.cache_messages {
            cache.overrides.remove(&EntityKind::Message);
        }
        cache
    }
}
