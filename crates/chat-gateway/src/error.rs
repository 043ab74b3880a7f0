//! Gateway errors

use crate::protocol::CloseCode;

/// Error type for gateway operations
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transport-level failure; the shard reconnects per its retry policy
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    /// The server invalidated the session; resumed or re-identified per `resumable`
    #[error("Session invalidated (resumable: {resumable})")]
    SessionInvalidated { resumable: bool },

    /// The shard gave up reconnecting
    #[error("Shard {shard} exhausted {attempts} reconnect attempts")]
    RetryExhausted { shard: u32, attempts: u32 },

    /// The gateway closed the connection with a code that reconnecting cannot fix
    #[error("Shard {shard} closed by gateway: {code}")]
    FatalClose { shard: u32, code: CloseCode },

    /// Outbound command for a shard that is not connected or not run by this process
    #[error("Shard {shard} is not connected")]
    ShardNotConnected { shard: u32 },

    #[error("Event stream already taken for this start")]
    EventsAlreadyTaken,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Whether this error ends the shard for good
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. } | Self::FatalClose { .. })
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GatewayError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::ConnectionFailure(e.to_string())
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
