//! # chat-gateway
//!
//! Client side of the real-time gateway: protocol types, the per-shard connection state
//! machine with heartbeat, resume and reconnect, and the sharded manager.

pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod protocol;

pub use config::{GatewayConfig, DEFAULT_GATEWAY_URL, GATEWAY_VERSION};
pub use connection::{
    ConnectionStatus, Connector, MemoryConnector, MemoryPeer, MemoryServer, ShardedGatewayManager,
    WebSocketConnector,
};
pub use error::{GatewayError, GatewayResult};
pub use events::{GatewayEventType, ShardEvent};
pub use protocol::{GatewayCommand, GatewayMessage, Intents, OpCode};
