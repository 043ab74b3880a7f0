//! Client errors

use chat_cache::CacheError;
use chat_common::ConfigError;
use chat_gateway::GatewayError;
use chat_rest::RestError;

/// Error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("REST error: {0}")]
    Rest(#[from] RestError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Client is already connected")]
    AlreadyConnected,

    #[error("Client is closed")]
    Closed,
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
