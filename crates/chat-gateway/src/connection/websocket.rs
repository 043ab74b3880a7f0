//! WebSocket transport over tokio-tungstenite

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use super::transport::{Connector, Outbound, Socket, SocketEvent};
use crate::error::GatewayResult;
use crate::protocol::GatewayMessage;

const CHANNEL_CAPACITY: usize = 256;

/// Connector that opens real WebSocket connections
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> GatewayResult<Socket> {
        let (stream, _response) = connect_async(url).await?;
        tracing::debug!(url = %url, "WebSocket connected");

        let (mut sink, mut stream) = stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<Outbound>(CHANNEL_CAPACITY);
        let (in_tx, in_rx) = mpsc::channel::<SocketEvent>(CHANNEL_CAPACITY);

        // Writer: forward outbound frames until the shard drops its sender or asks to close
        tokio::spawn(async move {
            while let Some(outbound) = out_rx.recv().await {
                let result = match outbound {
                    Outbound::Message(message) => match message.to_json() {
                        Ok(json) => sink.send(Message::Text(json.into())).await,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to serialize gateway frame");
                            continue;
                        }
                    },
                    Outbound::Close(code) => {
                        let frame = CloseFrame {
                            code: WsCloseCode::from(code),
                            reason: "".into(),
                        };
                        let _ = sink.send(Message::Close(Some(frame))).await;
                        break;
                    }
                };
                if let Err(e) = result {
                    tracing::debug!(error = %e, "WebSocket write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Reader: decode text frames, report the close code once
        tokio::spawn(async move {
            let mut close_code = None;
            while let Some(next) = stream.next().await {
                match next {
                    Ok(Message::Text(text)) => match GatewayMessage::from_json(&text) {
                        Ok(message) => {
                            if in_tx.send(SocketEvent::Frame(message)).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "Undecodable gateway frame"),
                    },
                    Ok(Message::Close(frame)) => {
                        close_code = frame.map(|f| u16::from(f.code));
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(error = %e, "WebSocket read failed");
                        break;
                    }
                }
            }
            let _ = in_tx.send(SocketEvent::Closed(close_code)).await;
        });

        Ok(Socket::new(out_tx, in_rx))
    }
}
