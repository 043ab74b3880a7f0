//! Cache errors

use crate::pool::RedisPoolError;

/// Error type for cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisPoolError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Redis backing requested but no Redis URL is configured")]
    RedisNotConfigured,
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        Self::Redis(RedisPoolError::Command(e))
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
