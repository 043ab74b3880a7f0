//! REST configuration

use std::sync::Arc;
use std::time::Duration;

use chat_common::{ClientConfig, LinearRetry, RetryPolicy};

/// Settings of the REST pipeline
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub token: String,
    pub base_url: String,
    /// 429 re-queues before `RateLimitExceeded`
    pub max_rate_limit_retries: u32,
    /// 5xx or timeout retries before `RemoteServiceError`
    pub max_server_retries: u32,
    /// Delay between server-error retries
    pub retry: Arc<dyn RetryPolicy>,
    pub timeout: Duration,
    /// Requests per second across all routes
    pub global_per_second: u32,
    pub user_agent: String,
}

impl RestConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: "https://discord.com/api/v10".to_string(),
            max_rate_limit_retries: 5,
            max_server_retries: 3,
            retry: Arc::new(LinearRetry::default()),
            timeout: Duration::from_secs(15),
            global_per_second: 50,
            user_agent: format!(
                "DiscordBot ({}, {})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }
}

impl From<&ClientConfig> for RestConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            max_rate_limit_retries: config.rest_max_rate_limit_retries,
            max_server_retries: config.rest_max_server_retries,
            retry: Arc::new(config.retry_policy()),
            timeout: Duration::from_millis(config.rest_timeout_ms),
            global_per_second: config.rest_global_per_second,
            ..Self::new(config.token.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_client_config() {
        let mut client = ClientConfig::new("abc");
        client.rest_max_server_retries = 1;
        let config = RestConfig::from(&client);
        assert_eq!(config.authorization(), "Bot abc");
        assert_eq!(config.max_server_retries, 1);
        assert_eq!(config.max_rate_limit_retries, 5);
        assert_eq!(config.timeout, Duration::from_millis(15_000));
        assert_eq!(config.global_per_second, 50);
    }
}
