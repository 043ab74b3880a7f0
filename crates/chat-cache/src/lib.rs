//! # chat-cache
//!
//! Entity cache for the client runtime.
//!
//! ## Features
//!
//! - **DataCache**: JSON entries keyed by `(kind, scope, id)` with partial-update merging
//! - **Backings**: in-memory map, no-op (discard), and Redis through a deadpool pool
//! - **Per-kind routing**: any kind can be sent to its own backing
//!
//! ## Example
//!
//! ```ignore
//! use chat_cache::{CacheConfig, CacheKey, DataCache};
//!
//! let cache = DataCache::from_config(&CacheConfig::default())?;
//! cache.put(CacheKey::guild(guild_id), guild_json).await?;
//! let guild: Option<GuildData> = cache.get_as(&CacheKey::guild(guild_id)).await?;
//! ```

pub mod backing;
pub mod config;
pub mod data_cache;
pub mod error;
pub mod key;
pub mod pool;

pub use backing::{CacheBacking, MapBacking, NoOpBacking, RedisBacking};
pub use config::{BackingKind, CacheConfig};
pub use data_cache::{merge_json, DataCache};
pub use error::{CacheError, CacheResult};
pub use key::{CacheKey, EntityKind, KEY_PREFIX};
pub use pool::{
    create_shared_pool, RedisPool, RedisPoolConfig, RedisPoolError, RedisResult, SharedRedisPool,
};
