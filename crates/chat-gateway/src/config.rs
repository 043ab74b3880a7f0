//! Gateway configuration

use std::sync::Arc;
use std::time::Duration;

use chat_common::{ClientConfig, LinearRetry, RetryPolicy};

use crate::protocol::{IdentifyProperties, Intents, PresenceUpdatePayload};

/// Public gateway endpoint, used when neither configuration nor discovery supplies one
pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg";

/// Gateway protocol version
pub const GATEWAY_VERSION: u8 = 10;

/// Settings shared by every shard of a manager
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub token: String,
    /// Base gateway URL, without query string
    pub url: String,
    /// Total shard count N used for routing
    pub shard_total: u32,
    /// Shards run by this process
    pub shard_ids: Vec<u32>,
    pub intents: Intents,
    pub large_threshold: u32,
    pub properties: IdentifyProperties,
    /// Presence sent with identify
    pub presence: Option<PresenceUpdatePayload>,
    /// Backoff for reconnect attempts
    pub retry: Arc<dyn RetryPolicy>,
    /// Identifies allowed per `identify_window`, across all shards
    pub identify_concurrency: u32,
    pub identify_window: Duration,
    /// Outbound commands per shard per minute
    pub commands_per_minute: u32,
    /// How long to wait for Hello after the socket opens
    pub hello_timeout: Duration,
}

impl GatewayConfig {
    /// Single-shard configuration with defaults
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            url: DEFAULT_GATEWAY_URL.to_string(),
            shard_total: 1,
            shard_ids: vec![0],
            intents: Intents::default(),
            large_threshold: 250,
            properties: IdentifyProperties::default(),
            presence: None,
            retry: Arc::new(LinearRetry::default()),
            identify_concurrency: 1,
            identify_window: Duration::from_secs(5),
            commands_per_minute: 120,
            hello_timeout: Duration::from_secs(30),
        }
    }

    /// Run shards `ids` out of `total`
    pub fn with_shards(mut self, total: u32, ids: impl IntoIterator<Item = u32>) -> Self {
        self.shard_total = total.max(1);
        self.shard_ids = ids.into_iter().filter(|id| *id < self.shard_total).collect();
        self
    }

    /// Run every shard of `total`
    pub fn with_shard_total(self, total: u32) -> Self {
        self.with_shards(total, 0..total.max(1))
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_retry(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    /// URL to open for `base`, with version and encoding
    pub fn connect_url(base: &str) -> String {
        let base = base.trim_end_matches('/');
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{base}{separator}v={GATEWAY_VERSION}&encoding=json")
    }
}

impl From<&ClientConfig> for GatewayConfig {
    fn from(config: &ClientConfig) -> Self {
        let mut gateway = Self::new(config.token.clone());
        if let Some(url) = &config.gateway_url {
            gateway.url.clone_from(url);
        }
        let total = config.shard_total.unwrap_or(1);
        gateway = match &config.shard_ids {
            Some(ids) => gateway.with_shards(total, ids.iter().copied()),
            None => gateway.with_shard_total(total),
        };
        gateway.intents = Intents::from_bits_retain(config.intents);
        gateway.large_threshold = config.large_threshold;
        gateway.retry = Arc::new(config.retry_policy());
        if let Some(concurrency) = config.identify_concurrency {
            gateway.identify_concurrency = concurrency.max(1);
        }
        gateway.identify_window = Duration::from_millis(config.identify_window_ms);
        gateway.commands_per_minute = config.gateway_commands_per_minute;
        gateway
    }
}
