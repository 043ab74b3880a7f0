//! Client facade
//!
//! [`ChatClient`] ties the pieces together: it discovers the gateway over REST, resolves the
//! per-crate configurations once, then runs the shard manager with an interceptor task feeding
//! the cache and the event bus.

use std::sync::Arc;

use chat_cache::{CacheConfig, CacheKey, DataCache};
use chat_common::{ClientConfig, RateLimiter};
use chat_core::{Snowflake, UserData};
use chat_gateway::{
    ConnectionStatus, Connector, GatewayCommand, GatewayConfig, ShardedGatewayManager,
    WebSocketConnector,
};
use chat_rest::{GatewayBotResponse, RequestHandler, RestClient, RestConfig};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::bus::{EventBus, Subscription};
use crate::error::{ClientError, ClientResult};
use crate::interceptor::EventInterceptor;

/// Builds a [`ChatClient`].
///
/// Everything defaults to what [`ClientConfig`] describes; tests and embedders may swap in a
/// gateway connector, a REST request handler or a prepared cache.
#[derive(Debug)]
pub struct ClientBuilder {
    config: ClientConfig,
    connector: Option<Arc<dyn Connector>>,
    handler: Option<Arc<dyn RequestHandler>>,
    cache: Option<DataCache>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            connector: None,
            handler: None,
            cache: None,
        }
    }

    /// Gateway transport. Default: WebSocket
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// REST request handler. Default: the exclusion handler over reqwest
    pub fn request_handler(mut self, handler: Arc<dyn RequestHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Cache. Default: built from [`CacheConfig::from`] the client config
    pub fn cache(mut self, cache: DataCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Discover the gateway, look up the current user and prepare the shards.
    ///
    /// Nothing connects until [`ChatClient::connect`].
    pub async fn build(self) -> ClientResult<ChatClient> {
        let Self {
            config,
            connector,
            handler,
            cache,
        } = self;
        let limiter = RateLimiter::new();

        let rest = match handler {
            Some(handler) => RestClient::new(handler),
            None => RestClient::from_config(RestConfig::from(&config), limiter.clone())?,
        };

        let gateway_bot = rest.gateway().get_gateway_bot().await?;
        let gateway_config = resolve_gateway(&config, &gateway_bot);
        tracing::info!(
            url = %gateway_config.url,
            shard_total = gateway_config.shard_total,
            shards = ?gateway_config.shard_ids,
            max_concurrency = gateway_config.identify_concurrency,
            "Gateway discovered"
        );

        let user = rest.user().get_current_user().await?;
        let cache = match cache {
            Some(cache) => cache,
            None => DataCache::from_config(&CacheConfig::from(&config))?,
        };
        cache
            .put(CacheKey::user(user.id), serde_json::to_value(&user)?)
            .await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Logged in");

        let connector = connector.unwrap_or_else(|| Arc::new(WebSocketConnector));
        let gateway = ShardedGatewayManager::new(gateway_config, connector, limiter);

        Ok(ChatClient {
            rest,
            cache,
            gateway,
            bus: Arc::new(EventBus::new()),
            user,
            interceptor: Mutex::new(None),
        })
    }
}

/// Configuration overrides win over what discovery recommends
fn resolve_gateway(config: &ClientConfig, gateway_bot: &GatewayBotResponse) -> GatewayConfig {
    let mut resolved = config.clone();
    if resolved.gateway_url.is_none() {
        resolved.gateway_url = Some(gateway_bot.url.clone());
    }
    if resolved.shard_total.is_none() {
        resolved.shard_total = Some(gateway_bot.shards.max(1));
    }
    if resolved.identify_concurrency.is_none() {
        resolved.identify_concurrency = Some(gateway_bot.session_start_limit.max_concurrency.max(1));
    }
    GatewayConfig::from(&resolved)
}

/// A connected bot: REST services, the entity cache, and the event stream
#[derive(Debug)]
pub struct ChatClient {
    rest: RestClient,
    cache: DataCache,
    gateway: ShardedGatewayManager,
    bus: Arc<EventBus>,
    user: UserData,
    interceptor: Mutex<Option<JoinHandle<()>>>,
}

impl ChatClient {
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// Build with every default from `config`
    pub async fn new(config: ClientConfig) -> ClientResult<Self> {
        ClientBuilder::new(config).build().await
    }

    /// Start every shard and the interceptor. Readiness shows up as events.
    pub fn connect(&self) -> ClientResult<()> {
        if self.bus.is_closed() {
            return Err(ClientError::Closed);
        }
        let mut interceptor = self.interceptor.lock();
        if interceptor.is_some() {
            return Err(ClientError::AlreadyConnected);
        }

        self.gateway.start();
        let events = self.gateway.events()?;
        let task = EventInterceptor::new(self.cache.clone(), Arc::clone(&self.bus));
        *interceptor = Some(tokio::spawn(task.run(events)));
        Ok(())
    }

    /// A fresh event subscription. Slow subscribers only see the latest event.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn gateway(&self) -> &ShardedGatewayManager {
        &self.gateway
    }

    /// The user the token belongs to
    pub fn user(&self) -> &UserData {
        &self.user
    }

    /// Send a gateway command on the shard owning `entity_id`
    pub async fn send(&self, entity_id: Snowflake, command: GatewayCommand) -> ClientResult<()> {
        Ok(self.gateway.send(entity_id, command).await?)
    }

    pub fn status(&self, shard: u32) -> Option<ConnectionStatus> {
        self.gateway.status(shard)
    }

    /// Close every shard, let the interceptor drain what they delivered, then end all
    /// subscriptions. The client cannot be connected again afterwards.
    pub async fn close(&self) {
        self.gateway.close().await;

        let task = self.interceptor.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Event interceptor panicked");
            }
        }
        self.bus.close();
        tracing::info!("Client closed");
    }
}
