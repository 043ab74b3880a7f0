//! The data cache
//!
//! A key-value view over the backings configured per entity kind. The event interceptor is the
//! only writer during normal operation; reads may interleave freely.

use std::collections::HashMap;
use std::sync::Arc;

use chat_core::{MemberData, Snowflake};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backing::{CacheBacking, MapBacking, NoOpBacking, RedisBacking};
use crate::config::{BackingKind, CacheConfig};
use crate::error::{CacheError, CacheResult};
use crate::key::{CacheKey, EntityKind};
use crate::pool::create_shared_pool;

/// Entity cache with pluggable per-kind backings
#[derive(Clone)]
pub struct DataCache {
    default: Arc<dyn CacheBacking>,
    overrides: HashMap<EntityKind, Arc<dyn CacheBacking>>,
}

impl std::fmt::Debug for DataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for kind in EntityKind::ALL {
            map.entry(&kind.as_str(), &self.backing(kind).name());
        }
        map.finish()
    }
}

impl Default for DataCache {
    fn default() -> Self {
        Self::new(Arc::new(MapBacking::new()))
    }
}

impl DataCache {
    /// Cache storing every kind in `default`
    pub fn new(default: Arc<dyn CacheBacking>) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Route `kind` to `backing`
    pub fn with_backing(mut self, kind: EntityKind, backing: Arc<dyn CacheBacking>) -> Self {
        self.overrides.insert(kind, backing);
        self
    }

    /// Build the backings described by `config`. A Redis pool is created only when some kind
    /// uses it.
    pub fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        let map: Arc<dyn CacheBacking> = Arc::new(MapBacking::new());
        let noop: Arc<dyn CacheBacking> = Arc::new(NoOpBacking);
        let mut redis: Option<Arc<dyn CacheBacking>> = None;

        let mut resolve = |kind: BackingKind| -> CacheResult<Arc<dyn CacheBacking>> {
            Ok(match kind {
                BackingKind::Map => Arc::clone(&map),
                BackingKind::NoOp => Arc::clone(&noop),
                BackingKind::Redis => {
                    if let Some(backing) = &redis {
                        return Ok(Arc::clone(backing));
                    }
                    let pool_config = config.redis.as_ref().ok_or(CacheError::RedisNotConfigured)?;
                    let backing: Arc<dyn CacheBacking> =
                        Arc::new(RedisBacking::new(create_shared_pool(pool_config)?));
                    redis = Some(Arc::clone(&backing));
                    backing
                }
            })
        };

        let mut cache = Self::new(resolve(config.default_backing)?);
        for (kind, backing) in &config.overrides {
            cache.overrides.insert(*kind, resolve(*backing)?);
        }

        tracing::debug!(cache = ?cache, "Data cache configured");
        Ok(cache)
    }

    fn backing(&self, kind: EntityKind) -> &Arc<dyn CacheBacking> {
        self.overrides.get(&kind).unwrap_or(&self.default)
    }

    /// Whether entries of `kind` are retained at all
    pub fn is_cached(&self, kind: EntityKind) -> bool {
        self.backing(kind).stores()
    }

    pub async fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        self.backing(key.kind).get(key).await
    }

    /// Read and deserialize an entry
    pub async fn get_as<T: DeserializeOwned>(&self, key: &CacheKey) -> CacheResult<Option<T>> {
        self.get(key)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(Into::into)
    }

    /// Store `value`, returning the previous entry
    pub async fn put(&self, key: CacheKey, value: Value) -> CacheResult<Option<Value>> {
        self.backing(key.kind).put(key, value).await
    }

    /// Evict `key`, returning the evicted entry
    pub async fn remove(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        self.backing(key.kind).remove(key).await
    }

    /// Apply a partial snapshot on top of the current entry.
    ///
    /// Returns the previous entry and the merged value that was stored. Fields absent from
    /// `partial` keep their cached values.
    pub async fn merge(&self, key: CacheKey, partial: Value) -> CacheResult<(Option<Value>, Value)> {
        let backing = self.backing(key.kind);
        let current = backing.get(&key).await?;
        let merged = match &current {
            Some(existing) => merge_json(existing.clone(), partial),
            None => partial,
        };
        let old = backing.put(key, merged.clone()).await?;
        Ok((old.or(current), merged))
    }

    /// Every entry of `kind`
    pub async fn values(&self, kind: EntityKind) -> CacheResult<Vec<(CacheKey, Value)>> {
        let backing = self.backing(kind);
        let mut out = Vec::new();
        for key in backing.keys(kind).await? {
            if let Some(value) = backing.get(&key).await? {
                out.push((key, value));
            }
        }
        Ok(out)
    }

    /// Cached members of one guild
    pub async fn members(&self, guild_id: Snowflake) -> CacheResult<Vec<MemberData>> {
        let mut members = Vec::new();
        for (key, value) in self.values(EntityKind::Member).await? {
            if key.scope == Some(guild_id) {
                members.push(serde_json::from_value(value)?);
            }
        }
        members.sort_by_key(|m: &MemberData| m.user_id);
        Ok(members)
    }

    /// Evict everything belonging to a guild: its members, presences, channels and roles.
    /// The guild entry itself is left to the caller.
    pub async fn remove_guild_entries(&self, guild_id: Snowflake) -> CacheResult<usize> {
        let guild_field = Value::String(guild_id.to_string());
        let mut removed = 0;

        for kind in [
            EntityKind::Member,
            EntityKind::Presence,
            EntityKind::Channel,
            EntityKind::Role,
        ] {
            for (key, value) in self.values(kind).await? {
                let belongs = if kind.is_guild_scoped() {
                    key.scope == Some(guild_id)
                } else {
                    value.get("guild_id") == Some(&guild_field)
                };
                if belongs && self.remove(&key).await?.is_some() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

/// Recursively merge `patch` into `base`. Objects merge field by field; anything else is
/// replaced, including explicit nulls.
pub fn merge_json(base: Value, patch: Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base), Value::Object(patch)) => {
            for (field, value) in patch {
                let merged = match base.remove(&field) {
                    Some(existing) => merge_json(existing, value),
                    None => value,
                };
                base.insert(field, merged);
            }
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}
