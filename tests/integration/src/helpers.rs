//! Test helpers for integration tests
//!
//! Provides a scripted HTTP transport, a scripted gateway over in-memory sockets, and
//! environment checks for tests that need a real Redis.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chat_common::{LinearRetry, RateLimiter};
use chat_gateway::protocol::ResumePayload;
use chat_gateway::{GatewayMessage, MemoryPeer, MemoryServer, OpCode};
use chat_rest::{
    ExclusionRequestHandler, HttpRequest, HttpResponse, HttpTransport, RestConfig, TransportError,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::fixtures::ready;

/// Base URL the scripted HTTP transport answers for
pub const TEST_API_BASE: &str = "https://api.test/v10";
/// Gateway URL handed out by the scripted discovery endpoint
pub const TEST_GATEWAY_URL: &str = "ws://gateway.test";
pub const TEST_TOKEN: &str = "test-token";
pub const HEARTBEAT_INTERVAL_MS: u64 = 45_000;

// ============================================================================
// HTTP
// ============================================================================

/// HTTP transport answering from per-path scripts.
///
/// Scripted responses are used once, in order; after that a path falls back to its fixed
/// response, and unknown paths get a 404.
#[derive(Debug, Default)]
pub struct MockHttp {
    scripted: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    fixed: Mutex<HashMap<String, HttpResponse>>,
    seen: Mutex<Vec<(Instant, HttpRequest)>>,
}

impl MockHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every request for `path` with `response`
    pub fn respond(&self, path: &str, response: HttpResponse) {
        self.fixed.lock().insert(path.to_string(), response);
    }

    /// Answer the next requests for `path` with `responses`
    pub fn script(&self, path: &str, responses: impl IntoIterator<Item = HttpResponse>) {
        self.scripted
            .lock()
            .entry(path.to_string())
            .or_default()
            .extend(responses);
    }

    /// Arrival time of every request for `path`
    pub fn calls(&self, path: &str) -> Vec<Instant> {
        self.seen
            .lock()
            .iter()
            .filter(|(_, request)| path_of(&request.url) == path)
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().iter().map(|(_, request)| request.clone()).collect()
    }
}

fn path_of(url: &str) -> &str {
    let path = url.strip_prefix(TEST_API_BASE).unwrap_or(url);
    path.split('?').next().unwrap_or(path)
}

#[async_trait]
impl HttpTransport for MockHttp {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = path_of(&request.url).to_string();
        self.seen.lock().push((Instant::now(), request));

        let scripted = self
            .scripted
            .lock()
            .get_mut(&path)
            .and_then(VecDeque::pop_front);
        if let Some(response) = scripted {
            return Ok(response);
        }
        Ok(self.fixed.lock().get(&path).cloned().unwrap_or_else(|| {
            HttpResponse::new(404, json!({"message": "Unknown route", "code": 0}).to_string())
        }))
    }
}

/// REST config pointing at the scripted transport, with short server-error backoff
pub fn test_rest_config() -> RestConfig {
    RestConfig::new(TEST_TOKEN)
        .with_base_url(TEST_API_BASE)
        .with_retry(Arc::new(LinearRetry::new(
            Duration::from_millis(500),
            Duration::from_secs(2),
            3,
        )))
}

/// The real exclusion handler over `http`
pub fn rest_handler(http: Arc<MockHttp>) -> Arc<ExclusionRequestHandler> {
    Arc::new(ExclusionRequestHandler::new(
        test_rest_config(),
        http,
        RateLimiter::new(),
    ))
}

// ============================================================================
// Gateway
// ============================================================================

/// Gateway side of one shard's socket, after the handshake
#[derive(Debug)]
pub struct ShardPeer {
    pub shard: u32,
    pub peer: MemoryPeer,
    seq: u64,
}

impl ShardPeer {
    /// Send a dispatch with the next sequence number
    pub async fn dispatch(&mut self, event_type: &str, data: Value) -> Result<()> {
        self.seq += 1;
        let message = GatewayMessage::dispatch(event_type, self.seq, data);
        if !self.peer.send(message).await {
            bail!("shard {} socket is closed", self.shard);
        }
        Ok(())
    }

    /// Last sequence number sent
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Next client frame other than a heartbeat; heartbeats met on the way are acknowledged
    pub async fn next_command(&mut self) -> Result<GatewayMessage> {
        next_command(&mut self.peer).await
    }

    /// Close the socket from the gateway side
    pub async fn disconnect(self, code: Option<u16>) {
        self.peer.close(code).await;
    }
}

async fn next_command(peer: &mut MemoryPeer) -> Result<GatewayMessage> {
    loop {
        let frame = peer.recv().await.context("client closed the socket")?;
        if frame.op != OpCode::Heartbeat {
            return Ok(frame);
        }
        peer.send(GatewayMessage::heartbeat_ack()).await;
    }
}

/// Plays the gateway for every socket the paired connector opens
#[derive(Debug)]
pub struct TestGateway {
    server: MemoryServer,
}

impl TestGateway {
    pub fn new(server: MemoryServer) -> Self {
        Self { server }
    }

    /// Accept the next socket and say Hello
    pub async fn accept(&mut self) -> Result<MemoryPeer> {
        let peer = self.server.accept().await.context("connector dropped")?;
        peer.send(GatewayMessage::hello(HEARTBEAT_INTERVAL_MS)).await;
        Ok(peer)
    }

    /// Accept a socket, expect Identify, answer READY with session `session-{shard}`
    pub async fn identify(&mut self) -> Result<ShardPeer> {
        let mut peer = self.accept().await?;
        let frame = next_command(&mut peer).await?;
        let Some(identify) = frame.as_identify() else {
            bail!("expected Identify, got {:?}", frame.op);
        };

        let shard = identify.shard[0];
        let session_id = format!("session-{shard}");
        peer.send(GatewayMessage::dispatch("READY", 1, ready(&session_id, identify.shard)))
            .await;
        Ok(ShardPeer {
            shard,
            peer,
            seq: 1,
        })
    }

    /// Accept a socket, expect Resume, answer RESUMED
    pub async fn resume(&mut self) -> Result<(ShardPeer, ResumePayload)> {
        let mut peer = self.accept().await?;
        let frame = next_command(&mut peer).await?;
        let Some(resume) = frame.as_resume() else {
            bail!("expected Resume, got {:?}", frame.op);
        };

        let shard = resume
            .session_id
            .trim_start_matches("session-")
            .parse()
            .context("session id was not issued by this gateway")?;
        let seq = resume.seq + 1;
        peer.send(GatewayMessage::dispatch("RESUMED", seq, json!({})))
            .await;
        Ok((ShardPeer { shard, peer, seq }, resume))
    }
}

// ============================================================================
// Misc
// ============================================================================

/// Poll `check` every 10ms until it holds or `timeout` passes
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Check that the environment needed for Redis-backed tests is set up
pub async fn check_test_env() -> bool {
    if redis_url().is_none() {
        eprintln!("Skipping test: CHAT_REDIS_URL not set");
        return false;
    }
    true
}

/// Redis URL for cache tests, from the environment or a `.env` file
pub fn redis_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("CHAT_REDIS_URL").ok().filter(|url| !url.is_empty())
}
