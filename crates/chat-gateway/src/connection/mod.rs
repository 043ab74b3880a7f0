//! Shard connections
//!
//! The per-shard state machine, the transports it runs over, and the manager that owns
//! every local shard.

mod connection;
mod manager;
mod memory;
mod session;
mod transport;
mod websocket;

pub use connection::{command_key, ShardCommand, ShardConnection, IDENTIFY_KEY};
pub use manager::ShardedGatewayManager;
pub use memory::{MemoryConnector, MemoryPeer, MemoryServer};
pub use session::{ConnectionStatus, Session};
pub use transport::{Connector, Outbound, Socket, SocketEvent};
pub use websocket::WebSocketConnector;
