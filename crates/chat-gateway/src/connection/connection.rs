//! One shard's connection to the gateway
//!
//! A [`ShardConnection`] is a single task that owns the socket, the session and the
//! heartbeat timer of its shard. It walks
//! `Disconnected -> Connecting -> Identifying | Resuming -> Connected` and back on every
//! reconnect, until it is shut down or hits a fatal condition (`Closed`).

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::error::Elapsed;
use tokio::time::{sleep, sleep_until, timeout, Instant};

use super::session::{ConnectionStatus, Session};
use super::transport::{Connector, Socket, SocketEvent};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::events::ShardEvent;
use crate::protocol::{
    CloseCode, GatewayMessage, IdentifyPayload, OpCode, ReadyPayload, ResumePayload,
};

/// Rate-limit key shared by the identifies of every shard
pub const IDENTIFY_KEY: &str = "gateway:identify";

/// Rate-limit key for outbound commands of one shard
pub fn command_key(shard: u32) -> String {
    format!("gateway:commands:{shard}")
}

/// Outbound command queued for a shard, with where its outcome is reported.
///
/// Commands only go out while the shard is `Connected`; whatever is still queued when the
/// socket is lost, or when a new session becomes ready, is rejected with
/// [`GatewayError::ShardNotConnected`].
#[derive(Debug)]
pub struct ShardCommand {
    pub message: GatewayMessage,
    pub sent: oneshot::Sender<GatewayResult<()>>,
}

impl ShardCommand {
    pub fn new(message: GatewayMessage) -> (Self, oneshot::Receiver<GatewayResult<()>>) {
        let (sent, outcome) = oneshot::channel();
        (Self { message, sent }, outcome)
    }
}

/// Normal closure; the gateway discards the session
const CLOSE_NORMAL: u16 = 1000;
/// Closure that keeps the session resumable
const CLOSE_RESUMABLE: u16 = 4000;

/// Why a connected socket was left without an error
enum Exit {
    Shutdown,
    /// Server asked for a reconnect; no backoff
    Reconnect,
}

/// State machine for a single shard
pub struct ShardConnection {
    shard: u32,
    config: Arc<GatewayConfig>,
    connector: Arc<dyn Connector>,
    limiter: chat_common::RateLimiter,
    status: watch::Sender<ConnectionStatus>,
    commands: mpsc::Receiver<ShardCommand>,
    events: mpsc::UnboundedSender<ShardEvent>,
    shutdown: watch::Receiver<bool>,
    session: Option<Session>,
    sequence: Option<u64>,
    attempt: u32,
}

impl ShardConnection {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        shard: u32,
        config: Arc<GatewayConfig>,
        connector: Arc<dyn Connector>,
        limiter: chat_common::RateLimiter,
        status: watch::Sender<ConnectionStatus>,
        commands: mpsc::Receiver<ShardCommand>,
        events: mpsc::UnboundedSender<ShardEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            shard,
            config,
            connector,
            limiter,
            status,
            commands,
            events,
            shutdown,
            session: None,
            sequence: None,
            attempt: 0,
        }
    }

    /// Drive the shard until shutdown or a fatal error.
    ///
    /// A fatal error is also reported on the event stream as [`ShardEvent::Fatal`].
    pub async fn run(mut self) -> GatewayResult<()> {
        let result = self.run_inner().await;
        self.status.send_replace(ConnectionStatus::Closed);

        match &result {
            Ok(()) => tracing::info!(shard = self.shard, "Shard stopped"),
            Err(e) => {
                tracing::error!(shard = self.shard, error = %e, "Shard terminated");
                let _ = self.events.send(ShardEvent::Fatal {
                    shard: self.shard,
                    reason: e.to_string(),
                });
            }
        }
        result
    }

    async fn run_inner(&mut self) -> GatewayResult<()> {
        loop {
            let outcome = self.connect_once().await;
            self.reject_pending();
            let delay = match outcome {
                Ok(Exit::Shutdown) => return Ok(()),
                Ok(Exit::Reconnect) => Duration::ZERO,
                Err(GatewayError::SessionInvalidated { resumable }) => {
                    tracing::info!(shard = self.shard, resumable, "Session invalidated");
                    self.next_delay()?;
                    Duration::from_millis(rand::thread_rng().gen_range(1_000..=5_000))
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let delay = self.next_delay()?;
                    tracing::warn!(
                        shard = self.shard,
                        error = %e,
                        attempt = self.attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Gateway connection lost, reconnecting"
                    );
                    delay
                }
            };

            self.set_status(ConnectionStatus::Disconnected);
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    () = wait_for_shutdown(&mut self.shutdown) => return Ok(()),
                    () = sleep(delay) => {}
                }
            }
        }
    }

    /// Open one socket and serve it until it ends
    async fn connect_once(&mut self) -> GatewayResult<Exit> {
        if *self.shutdown.borrow() {
            return Ok(Exit::Shutdown);
        }

        // Fresh sessions queue for an identify slot before the socket opens
        let permit = if self.session.is_none() {
            tokio::select! {
                biased;
                () = wait_for_shutdown(&mut self.shutdown) => return Ok(Exit::Shutdown),
                permit = self.limiter.acquire(IDENTIFY_KEY) => Some(permit),
            }
        } else {
            None
        };

        self.set_status(ConnectionStatus::Connecting);
        let base = self
            .session
            .as_ref()
            .and_then(|s| s.resume_url.clone())
            .unwrap_or_else(|| self.config.url.clone());
        let url = GatewayConfig::connect_url(&base);
        tracing::debug!(shard = self.shard, url = %url, "Opening gateway socket");
        let mut socket = self.connector.connect(&url).await?;

        let hello = tokio::select! {
            biased;
            () = wait_for_shutdown(&mut self.shutdown) => return Ok(Exit::Shutdown),
            hello = timeout(self.config.hello_timeout, socket.recv()) => hello,
        };
        let interval = self.on_hello(hello)?;
        self.handshake(&socket).await?;
        drop(permit);

        self.serve(socket, interval).await
    }

    fn on_hello(&mut self, hello: Result<SocketEvent, Elapsed>) -> GatewayResult<Duration> {
        let event = hello
            .map_err(|_| GatewayError::ConnectionFailure("no Hello from gateway".to_string()))?;

        match event {
            SocketEvent::Frame(message) if message.op == OpCode::Hello => message
                .as_hello()
                .map(|hello| Duration::from_millis(hello.heartbeat_interval))
                .ok_or_else(|| GatewayError::ConnectionFailure("malformed Hello".to_string())),
            SocketEvent::Frame(message) => Err(GatewayError::ConnectionFailure(format!(
                "expected Hello, got {}",
                message.op
            ))),
            SocketEvent::Closed(code) => Err(self.on_close(code)),
        }
    }

    async fn handshake(&mut self, socket: &Socket) -> GatewayResult<()> {
        if let Some(session) = &self.session {
            self.set_status(ConnectionStatus::Resuming);
            let payload = ResumePayload {
                token: self.config.token.clone(),
                session_id: session.id.clone(),
                seq: session.sequence,
            };
            tracing::info!(
                shard = self.shard,
                session_id = %session.id,
                seq = session.sequence,
                "Resuming session"
            );
            self.sequence = Some(session.sequence);
            socket.send(GatewayMessage::resume(&payload)).await
        } else {
            self.set_status(ConnectionStatus::Identifying);
            self.sequence = None;
            tracing::info!(shard = self.shard, total = self.config.shard_total, "Identifying");
            socket.send(GatewayMessage::identify(&self.identify_payload())).await
        }
    }

    fn identify_payload(&self) -> IdentifyPayload {
        IdentifyPayload {
            token: self.config.token.clone(),
            properties: self.config.properties.clone(),
            shard: [self.shard, self.config.shard_total],
            intents: self.config.intents,
            large_threshold: Some(self.config.large_threshold),
            presence: self.config.presence.clone(),
        }
    }

    async fn serve(&mut self, mut socket: Socket, interval: Duration) -> GatewayResult<Exit> {
        // First beat lands at a random point of the first interval
        let jitter: f64 = rand::random();
        let mut next_beat = Instant::now() + interval.mul_f64(jitter);
        let mut acked = true;

        loop {
            let connected = self.status.borrow().is_connected();
            tokio::select! {
                biased;
                () = wait_for_shutdown(&mut self.shutdown) => {
                    socket.close(CLOSE_NORMAL).await;
                    return Ok(Exit::Shutdown);
                }
                event = socket.recv() => {
                    if let Some(exit) = self.on_event(event, &socket, &mut acked).await? {
                        return Ok(exit);
                    }
                }
                () = sleep_until(next_beat) => {
                    if !acked {
                        socket.close(CLOSE_RESUMABLE).await;
                        return Err(GatewayError::ConnectionFailure(
                            "heartbeat not acknowledged".to_string(),
                        ));
                    }
                    socket.send(GatewayMessage::heartbeat(self.sequence)).await?;
                    acked = false;
                    next_beat += interval;
                }
                Some(command) = self.commands.recv(), if connected => {
                    match socket.send(command.message).await {
                        Ok(()) => {
                            let _ = command.sent.send(Ok(()));
                        }
                        Err(e) => {
                            let _ = command
                                .sent
                                .send(Err(GatewayError::ShardNotConnected { shard: self.shard }));
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    async fn on_event(
        &mut self,
        event: SocketEvent,
        socket: &Socket,
        acked: &mut bool,
    ) -> GatewayResult<Option<Exit>> {
        let message = match event {
            SocketEvent::Frame(message) => message,
            SocketEvent::Closed(code) => return Err(self.on_close(code)),
        };

        match message.op {
            OpCode::Dispatch => self.on_dispatch(message),
            OpCode::Heartbeat => socket.send(GatewayMessage::heartbeat(self.sequence)).await?,
            OpCode::HeartbeatAck => *acked = true,
            OpCode::Reconnect => {
                tracing::info!(shard = self.shard, "Gateway requested reconnect");
                socket.close(CLOSE_RESUMABLE).await;
                return Ok(Some(Exit::Reconnect));
            }
            OpCode::InvalidSession => {
                let resumable = message.as_invalid_session().unwrap_or(false);
                if !resumable {
                    self.session = None;
                }
                socket
                    .close(if resumable { CLOSE_RESUMABLE } else { CLOSE_NORMAL })
                    .await;
                return Err(GatewayError::SessionInvalidated { resumable });
            }
            op => tracing::debug!(shard = self.shard, op = %op, "Ignoring gateway frame"),
        }
        Ok(None)
    }

    fn on_dispatch(&mut self, message: GatewayMessage) {
        let GatewayMessage { t, s, d, .. } = message;
        if let Some(seq) = s {
            self.sequence = Some(self.sequence.map_or(seq, |current| current.max(seq)));
            if let Some(session) = &mut self.session {
                session.observe(seq);
            }
        }

        let event_type = t.unwrap_or_default();
        let data = d.unwrap_or(Value::Null);

        match event_type.as_str() {
            "READY" => match serde_json::from_value::<ReadyPayload>(data.clone()) {
                Ok(ready) => {
                    tracing::info!(
                        shard = self.shard,
                        session_id = %ready.session_id,
                        guilds = ready.guilds.len(),
                        "Shard ready"
                    );
                    self.session = Some(Session::new(
                        ready.session_id,
                        s.unwrap_or(0),
                        ready.resume_gateway_url,
                    ));
                    self.mark_connected();
                }
                Err(e) => tracing::warn!(shard = self.shard, error = %e, "Malformed READY"),
            },
            "RESUMED" => {
                tracing::info!(shard = self.shard, seq = ?self.sequence, "Session resumed");
                self.mark_connected();
            }
            _ => {}
        }

        // Nobody listening is not an error for the shard
        let _ = self.events.send(ShardEvent::Dispatch {
            shard: self.shard,
            event_type,
            sequence: s,
            data,
        });
    }

    fn on_close(&mut self, code: Option<u16>) -> GatewayError {
        match code.and_then(CloseCode::from_u16) {
            Some(code) if code.is_fatal() => GatewayError::FatalClose {
                shard: self.shard,
                code,
            },
            Some(code) => {
                if code.discards_session() {
                    self.session = None;
                }
                GatewayError::ConnectionFailure(format!("closed by gateway: {code}"))
            }
            None => GatewayError::ConnectionFailure(match code {
                Some(raw) => format!("closed with code {raw}"),
                None => "connection lost".to_string(),
            }),
        }
    }

    fn mark_connected(&mut self) {
        // Anything queued before this point was meant for a previous socket
        self.reject_pending();
        self.attempt = 0;
        self.set_status(ConnectionStatus::Connected);
    }

    fn reject_pending(&mut self) {
        let mut rejected = 0usize;
        while let Ok(command) = self.commands.try_recv() {
            let _ = command
                .sent
                .send(Err(GatewayError::ShardNotConnected { shard: self.shard }));
            rejected += 1;
        }
        if rejected > 0 {
            tracing::debug!(shard = self.shard, rejected, "Rejected commands from a previous socket");
        }
    }

    fn next_delay(&mut self) -> GatewayResult<Duration> {
        match self.config.retry.next_delay(self.attempt) {
            Ok(delay) => {
                self.attempt += 1;
                Ok(delay)
            }
            Err(_) => Err(GatewayError::RetryExhausted {
                shard: self.shard,
                attempts: self.attempt,
            }),
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            tracing::debug!(shard = self.shard, from = %previous, to = %status, "Shard status");
        }
    }
}

/// Resolves once shutdown is requested or the manager is gone
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
