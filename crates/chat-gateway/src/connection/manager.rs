//! Sharded gateway manager
//!
//! Runs one [`ShardConnection`] task per local shard, merges their output into a single
//! stream and routes outbound commands by `entity_id mod shard_total`.

use std::sync::Arc;
use std::time::Duration;

use chat_common::RateLimiter;
use chat_core::Snowflake;
use dashmap::DashMap;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::connection::{command_key, ShardCommand, ShardConnection, IDENTIFY_KEY};
use super::session::ConnectionStatus;
use super::transport::Connector;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::events::ShardEvent;
use crate::protocol::GatewayCommand;

const COMMAND_QUEUE: usize = 32;
const COMMAND_WINDOW: Duration = Duration::from_secs(60);

/// What the manager keeps of a running shard
struct ShardHandle {
    status: watch::Receiver<ConnectionStatus>,
    commands: mpsc::Sender<ShardCommand>,
}

struct Running {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<GatewayResult<()>>>,
}

/// Owns every local shard of one bot
pub struct ShardedGatewayManager {
    config: Arc<GatewayConfig>,
    connector: Arc<dyn Connector>,
    limiter: RateLimiter,
    shards: DashMap<u32, ShardHandle>,
    running: Mutex<Option<Running>>,
    events: Mutex<Option<mpsc::UnboundedReceiver<ShardEvent>>>,
}

impl ShardedGatewayManager {
    /// Create a manager; nothing connects until [`start`](Self::start)
    pub fn new(config: GatewayConfig, connector: Arc<dyn Connector>, limiter: RateLimiter) -> Self {
        limiter.configure(
            IDENTIFY_KEY,
            config.identify_concurrency.max(1),
            config.identify_window,
        );
        for shard in &config.shard_ids {
            limiter.configure(&command_key(*shard), config.commands_per_minute, COMMAND_WINDOW);
        }

        Self {
            config: Arc::new(config),
            connector,
            limiter,
            shards: DashMap::new(),
            running: Mutex::new(None),
            events: Mutex::new(None),
        }
    }

    pub fn shard_total(&self) -> u32 {
        self.config.shard_total
    }

    pub fn shard_ids(&self) -> &[u32] {
        &self.config.shard_ids
    }

    /// Spawn a task for every local shard.
    ///
    /// Each start creates a fresh event stream, to be claimed with [`events`](Self::events).
    /// Starting a running manager does nothing.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running.is_some() {
            tracing::warn!("Gateway manager already started");
            return;
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::with_capacity(self.config.shard_ids.len());

        for &shard in &self.config.shard_ids {
            let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
            let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);

            let connection = ShardConnection::new(
                shard,
                Arc::clone(&self.config),
                Arc::clone(&self.connector),
                self.limiter.clone(),
                status_tx,
                command_rx,
                event_tx.clone(),
                shutdown_rx.clone(),
            );
            tasks.push(tokio::spawn(connection.run()));
            self.shards.insert(
                shard,
                ShardHandle {
                    status: status_rx,
                    commands: command_tx,
                },
            );
        }

        tracing::info!(
            shards = ?self.config.shard_ids,
            total = self.config.shard_total,
            "Gateway manager started"
        );
        *self.events.lock() = Some(event_rx);
        *running = Some(Running { shutdown, tasks });
    }

    /// Merged output of all shards, in per-shard receipt order.
    ///
    /// The stream can be taken once per start and ends after [`close`](Self::close).
    pub fn events(&self) -> GatewayResult<BoxStream<'static, ShardEvent>> {
        let receiver = self
            .events
            .lock()
            .take()
            .ok_or(GatewayError::EventsAlreadyTaken)?;

        Ok(stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|event| (event, receiver))
        })
        .boxed())
    }

    /// Send a command on the shard that owns `entity_id`
    pub async fn send(&self, entity_id: Snowflake, command: GatewayCommand) -> GatewayResult<()> {
        let shard = entity_id.shard_index(self.config.shard_total);
        self.send_to_shard(shard, command).await
    }

    /// Send a command on a specific shard, waiting for its command budget if needed.
    ///
    /// Resolves once the frame is written. Fails with [`GatewayError::ShardNotConnected`]
    /// when the shard is not `Connected` before or after the wait, or loses its socket
    /// before the command goes out; commands are never carried over to a new socket.
    pub async fn send_to_shard(&self, shard: u32, command: GatewayCommand) -> GatewayResult<()> {
        let (mut status, commands) = self.connected_handle(shard)?;

        let _permit = self.limiter.acquire(&command_key(shard)).await;
        if !status.borrow_and_update().is_connected() {
            return Err(GatewayError::ShardNotConnected { shard });
        }

        tracing::debug!(shard, op = %command.op(), "Sending gateway command");
        let (queued, outcome) = ShardCommand::new(command.to_message());
        commands
            .send(queued)
            .await
            .map_err(|_| GatewayError::ShardNotConnected { shard })?;
        outcome
            .await
            .unwrap_or(Err(GatewayError::ShardNotConnected { shard }))
    }

    fn connected_handle(
        &self,
        shard: u32,
    ) -> GatewayResult<(watch::Receiver<ConnectionStatus>, mpsc::Sender<ShardCommand>)> {
        let handle = self
            .shards
            .get(&shard)
            .ok_or(GatewayError::ShardNotConnected { shard })?;
        if !handle.status.borrow().is_connected() {
            return Err(GatewayError::ShardNotConnected { shard });
        }
        Ok((handle.status.clone(), handle.commands.clone()))
    }

    /// Current status of a local shard
    pub fn status(&self, shard: u32) -> Option<ConnectionStatus> {
        self.shards.get(&shard).map(|handle| *handle.status.borrow())
    }

    /// Status of every local shard, ordered by shard id
    pub fn statuses(&self) -> Vec<(u32, ConnectionStatus)> {
        let mut statuses: Vec<_> = self
            .shards
            .iter()
            .map(|entry| (*entry.key(), *entry.status.borrow()))
            .collect();
        statuses.sort_unstable_by_key(|(shard, _)| *shard);
        statuses
    }

    /// Wait until `shard` reaches `status`, or the shard is closed
    pub async fn wait_for(&self, shard: u32, status: ConnectionStatus) -> GatewayResult<()> {
        let mut receiver = self
            .shards
            .get(&shard)
            .map(|handle| handle.status.clone())
            .ok_or(GatewayError::ShardNotConnected { shard })?;

        let reached = receiver
            .wait_for(|current| *current == status || *current == ConnectionStatus::Closed)
            .await
            .map(|current| *current == status)
            .unwrap_or(false);
        if reached {
            Ok(())
        } else {
            Err(GatewayError::ShardNotConnected { shard })
        }
    }

    /// Stop every shard and wait for their tasks. Closing twice is a no-op.
    pub async fn close(&self) {
        let running = self.running.lock().take();
        let Some(Running { shutdown, tasks }) = running else {
            return;
        };

        shutdown.send_replace(true);
        for task in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(error = %e, "Shard had already terminated"),
                Err(e) => tracing::warn!(error = %e, "Shard task panicked"),
            }
        }
        tracing::info!("Gateway manager closed");
    }
}

impl std::fmt::Debug for ShardedGatewayManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedGatewayManager")
            .field("shard_total", &self.config.shard_total)
            .field("shard_ids", &self.config.shard_ids)
            .field("statuses", &self.statuses())
            .finish()
    }
}
