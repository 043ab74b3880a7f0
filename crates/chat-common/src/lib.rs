//! # chat-common
//!
//! Shared utilities: configuration, telemetry, retry policies and the rate limiter used by
//! both the gateway and the REST pipeline.

pub mod config;
pub mod ratelimit;
pub mod retry;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{ClientConfig, ConfigError, Environment};
pub use ratelimit::{BucketSnapshot, Permit, RateLimiter};
pub use retry::{LinearRetry, RetryError, RetryPolicy};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
