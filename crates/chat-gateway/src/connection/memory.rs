//! In-process transport
//!
//! Each `connect` hands the far end of a channel pair to whoever holds the
//! [`MemoryServer`], which can then play the gateway side of the protocol.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::transport::{Connector, Outbound, Socket, SocketEvent};
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::GatewayMessage;

const CHANNEL_CAPACITY: usize = 64;

/// Connector whose sockets are in-memory channels
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    accepted: mpsc::UnboundedSender<MemoryPeer>,
}

/// Receives the peers of every socket opened through the paired connector
#[derive(Debug)]
pub struct MemoryServer {
    accepted: mpsc::UnboundedReceiver<MemoryPeer>,
}

/// Gateway side of one in-memory socket
#[derive(Debug)]
pub struct MemoryPeer {
    /// URL the client asked for
    pub url: String,
    from_client: mpsc::Receiver<Outbound>,
    to_client: mpsc::Sender<SocketEvent>,
}

impl MemoryConnector {
    pub fn pair() -> (Self, MemoryServer) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { accepted: tx }, MemoryServer { accepted: rx })
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> GatewayResult<Socket> {
        let (out_tx, out_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let peer = MemoryPeer {
            url: url.to_string(),
            from_client: out_rx,
            to_client: in_tx,
        };
        self.accepted
            .send(peer)
            .map_err(|_| GatewayError::ConnectionFailure("connection refused".to_string()))?;
        Ok(Socket::new(out_tx, in_rx))
    }
}

impl MemoryServer {
    /// Wait for the next socket to be opened
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.accepted.recv().await
    }
}

impl MemoryPeer {
    pub async fn send(&self, message: GatewayMessage) -> bool {
        self.to_client.send(SocketEvent::Frame(message)).await.is_ok()
    }

    /// Close from the gateway side with `code`
    pub async fn close(self, code: Option<u16>) {
        let _ = self.to_client.send(SocketEvent::Closed(code)).await;
    }

    /// Next frame from the client; `None` once the client closed or dropped the socket
    pub async fn recv(&mut self) -> Option<GatewayMessage> {
        match self.from_client.recv().await? {
            Outbound::Message(message) => Some(message),
            Outbound::Close(_) => None,
        }
    }

    /// Next frame from the client, giving up after `timeout`
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<GatewayMessage> {
        tokio::time::timeout(timeout, self.recv()).await.ok().flatten()
    }

    /// Next raw outbound item, including close requests
    pub async fn recv_outbound(&mut self) -> Option<Outbound> {
        self.from_client.recv().await
    }
}
