//! Client configuration
//!
//! Resolved once from environment variables (and an optional `.env` file) before any task
//! starts; each crate converts it into its own config type.

use std::env;
use std::time::Duration;

use crate::retry::LinearRetry;

/// Main client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub env: Environment,
    /// Bot token for REST `Authorization` and gateway identify. Required.
    pub token: String,
    /// REST base URL. Default: `https://discord.com/api/v10`
    pub api_base_url: String,
    /// Overrides the gateway URL discovered through `GET /gateway/bot`
    pub gateway_url: Option<String>,
    /// Total shard count. Default: the recommended count from `GET /gateway/bot`
    pub shard_total: Option<u32>,
    /// Shard ids run by this process. Default: all of `0..shard_total`
    pub shard_ids: Option<Vec<u32>>,
    /// Raw gateway intents bitset. Default: guilds, guild members, guild messages
    pub intents: u64,
    /// Member count above which a guild is sent without offline members. Default: 250
    pub large_threshold: u32,
    /// First reconnect/5xx retry delay in milliseconds. Default: 2000
    pub retry_base_ms: u64,
    /// Upper bound on the retry delay in milliseconds. Default: 60000
    pub retry_max_ms: u64,
    /// Attempts before a shard is given up. Default: 10
    pub retry_max_attempts: u32,
    /// Identifies allowed per window. Default: `max_concurrency` from `GET /gateway/bot`, else 1
    pub identify_concurrency: Option<u32>,
    /// Identify window length in milliseconds. Default: 5000
    pub identify_window_ms: u64,
    /// Outbound gateway commands per shard per minute. Default: 120
    pub gateway_commands_per_minute: u32,
    /// 429 re-queues before a REST call fails. Default: 5
    pub rest_max_rate_limit_retries: u32,
    /// 5xx/timeout retries before a REST call fails. Default: 3
    pub rest_max_server_retries: u32,
    /// REST transport timeout in milliseconds. Default: 15000
    pub rest_timeout_ms: u64,
    /// Global REST requests per second. Default: 50
    pub rest_global_per_second: u32,
    /// Cache message entities. Default: false (messages go to the no-op backing)
    pub cache_messages: bool,
    /// Redis URL for the default cache backing. Default: none (in-memory)
    pub redis_url: Option<String>,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

// Default value functions
fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_intents() -> u64 {
    // GUILDS | GUILD_MEMBERS | GUILD_MESSAGES
    (1 << 0) | (1 << 1) | (1 << 9)
}

fn default_large_threshold() -> u32 {
    250
}

fn default_retry_base_ms() -> u64 {
    2_000
}

fn default_retry_max_ms() -> u64 {
    60_000
}

fn default_retry_max_attempts() -> u32 {
    10
}

fn default_identify_window_ms() -> u64 {
    5_000
}

fn default_gateway_commands_per_minute() -> u32 {
    120
}

fn default_rest_max_rate_limit_retries() -> u32 {
    5
}

fn default_rest_max_server_retries() -> u32 {
    3
}

fn default_rest_timeout_ms() -> u64 {
    15_000
}

fn default_rest_global_per_second() -> u32 {
    50
}

impl ClientConfig {
    /// Config with every default and the given token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            env: Environment::default(),
            token: token.into(),
            api_base_url: default_api_base_url(),
            gateway_url: None,
            shard_total: None,
            shard_ids: None,
            intents: default_intents(),
            large_threshold: default_large_threshold(),
            retry_base_ms: default_retry_base_ms(),
            retry_max_ms: default_retry_max_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            identify_concurrency: None,
            identify_window_ms: default_identify_window_ms(),
            gateway_commands_per_minute: default_gateway_commands_per_minute(),
            rest_max_rate_limit_retries: default_rest_max_rate_limit_retries(),
            rest_max_server_retries: default_rest_max_server_retries(),
            rest_timeout_ms: default_rest_timeout_ms(),
            rest_global_per_second: default_rest_global_per_second(),
            cache_messages: false,
            redis_url: None,
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `CHAT_TOKEN` is missing or a variable fails to parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("CHAT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingVar("CHAT_TOKEN"))?;
        let mut config = Self::new(token);

        if let Some(v) = lookup("CHAT_ENV") {
            config.env = Environment::parse(&v)
                .ok_or_else(|| ConfigError::InvalidValue("CHAT_ENV", v.clone()))?;
        }
        if let Some(v) = lookup("CHAT_API_BASE_URL") {
            config.api_base_url = v.trim_end_matches('/').to_string();
        }
        config.gateway_url = lookup("CHAT_GATEWAY_URL");
        config.shard_total = parse_opt(&lookup, "CHAT_SHARD_TOTAL")?;
        config.identify_concurrency = parse_opt(&lookup, "CHAT_IDENTIFY_CONCURRENCY")?;
        config.shard_ids = lookup("CHAT_SHARD_IDS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(|p| {
                        p.parse::<u32>()
                            .map_err(|_| ConfigError::InvalidValue("CHAT_SHARD_IDS", s.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        if let (Some(total), Some(ids)) = (config.shard_total, &config.shard_ids) {
            if let Some(bad) = ids.iter().find(|&&id| id >= total) {
                return Err(ConfigError::InvalidValue(
                    "CHAT_SHARD_IDS",
                    format!("shard {bad} is outside 0..{total}"),
                ));
            }
        }

        macro_rules! override_with {
            ($field:ident, $key:literal) => {
                if let Some(v) = parse_opt(&lookup, $key)? {
                    config.$field = v;
                }
            };
        }
        override_with!(intents, "CHAT_INTENTS");
        override_with!(large_threshold, "CHAT_LARGE_THRESHOLD");
        override_with!(retry_base_ms, "CHAT_RETRY_BASE_MS");
        override_with!(retry_max_ms, "CHAT_RETRY_MAX_MS");
        override_with!(retry_max_attempts, "CHAT_RETRY_MAX_ATTEMPTS");
        override_with!(identify_window_ms, "CHAT_IDENTIFY_WINDOW_MS");
        override_with!(gateway_commands_per_minute, "CHAT_GATEWAY_COMMANDS_PER_MINUTE");
        override_with!(rest_max_rate_limit_retries, "CHAT_REST_MAX_RATE_LIMIT_RETRIES");
        override_with!(rest_max_server_retries, "CHAT_REST_MAX_SERVER_RETRIES");
        override_with!(rest_timeout_ms, "CHAT_REST_TIMEOUT_MS");
        override_with!(rest_global_per_second, "CHAT_REST_GLOBAL_PER_SECOND");
        override_with!(cache_messages, "CHAT_CACHE_MESSAGES");

        config.redis_url = lookup("CHAT_REDIS_URL").filter(|s| !s.is_empty());

        Ok(config)
    }
}

impl ClientConfig {
    /// Reconnect and 5xx retry policy described by this config
    pub fn retry_policy(&self) -> LinearRetry {
        LinearRetry::new(
            Duration::from_millis(self.retry_base_ms),
            Duration::from_millis(self.retry_max_ms),
            self.retry_max_attempts,
        )
    }
}

fn parse_opt<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue(key, v.clone()))
        })
        .transpose()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
