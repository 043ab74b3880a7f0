//! Transport seam between a shard and its socket

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::GatewayMessage;

/// Frame written to the socket
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message(GatewayMessage),
    /// Close the socket with this code
    Close(u16),
}

/// Something read from the socket
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Frame(GatewayMessage),
    /// The socket closed, with the close code if the peer sent one
    Closed(Option<u16>),
}

/// An open gateway socket, as a pair of channels
///
/// Dropping the socket closes the underlying connection.
#[derive(Debug)]
pub struct Socket {
    outbound: mpsc::Sender<Outbound>,
    inbound: mpsc::Receiver<SocketEvent>,
}

impl Socket {
    pub fn new(outbound: mpsc::Sender<Outbound>, inbound: mpsc::Receiver<SocketEvent>) -> Self {
        Self { outbound, inbound }
    }

    pub async fn send(&self, message: GatewayMessage) -> GatewayResult<()> {
        self.outbound
            .send(Outbound::Message(message))
            .await
            .map_err(|_| GatewayError::ConnectionFailure("socket writer closed".to_string()))
    }

    /// Ask the writer to close the connection; errors are ignored since the socket is
    /// abandoned either way
    pub async fn close(&self, code: u16) {
        let _ = self.outbound.send(Outbound::Close(code)).await;
    }

    /// Next inbound item; a vanished reader reads as a close without code
    pub async fn recv(&mut self) -> SocketEvent {
        self.inbound.recv().await.unwrap_or(SocketEvent::Closed(None))
    }
}

/// Opens gateway sockets
#[async_trait]
pub trait Connector: Send + Sync + std::fmt::Debug {
    /// Open a socket to `url` (already carrying version and encoding)
    async fn connect(&self, url: &str) -> GatewayResult<Socket>;
}
