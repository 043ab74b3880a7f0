//! Request handlers
//!
//! [`ExclusionRequestHandler`] serializes requests that share a rate-limit bucket and lets
//! requests on different buckets run concurrently. Every attempt passes the global bucket
//! and then its route bucket in the shared [`RateLimiter`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chat_common::RateLimiter;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::RestConfig;
use crate::error::{RestError, RestResult};
use crate::request::{Request, AUDIT_LOG_REASON};
use crate::response::{HttpResponse, RateLimitInfo};
use crate::transport::{HttpRequest, HttpTransport, TransportError};

/// Rate-limit key of the bucket every REST call passes
pub const GLOBAL_KEY: &str = "rest:global";

/// Used when a 429 carries no retry-after at all
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Executes logical requests against the REST API
#[async_trait]
pub trait RequestHandler: Send + Sync + std::fmt::Debug {
    async fn handle(&self, request: Request) -> RestResult<HttpResponse>;
}

/// Handler allowing at most one in-flight request per bucket
#[derive(Debug)]
pub struct ExclusionRequestHandler {
    config: RestConfig,
    transport: Arc<dyn HttpTransport>,
    limiter: RateLimiter,
    exclusion: DashMap<String, Arc<Mutex<()>>>,
}

impl ExclusionRequestHandler {
    pub fn new(config: RestConfig, transport: Arc<dyn HttpTransport>, limiter: RateLimiter) -> Self {
        limiter.configure(
            GLOBAL_KEY,
            config.global_per_second,
            Duration::from_secs(1),
        );
        Self {
            config,
            transport,
            limiter,
            exclusion: DashMap::new(),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    fn http_request(&self, request: &Request) -> RestResult<HttpRequest> {
        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            request.path()?
        );
        let mut headers = vec![("Authorization".to_string(), self.config.authorization())];
        if let Some(reason) = &request.reason {
            headers.push((AUDIT_LOG_REASON.to_string(), reason.clone()));
        }
        let body = request.body.as_ref().map(serde_json::Value::to_string);

        Ok(HttpRequest {
            method: request.route.method.clone(),
            url,
            query: request.query.clone(),
            headers,
            body,
        })
    }

    fn exclusion_lock(&self, bucket: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.exclusion.entry(bucket.to_string()).or_default().value())
    }

    /// Delay before server-error retry number `attempt`, or the final error
    fn server_retry(
        &self,
        attempt: u32,
        status: Option<u16>,
        body: String,
    ) -> Result<Duration, RestError> {
        if attempt >= self.config.max_server_retries {
            return Err(RestError::RemoteServiceError { status, body });
        }
        self.config
            .retry
            .next_delay(attempt)
            .map_err(|_| RestError::RemoteServiceError { status, body })
    }
}

#[async_trait]
impl RequestHandler for ExclusionRequestHandler {
    async fn handle(&self, request: Request) -> RestResult<HttpResponse> {
        let bucket = request.bucket_key();
        let http_request = self.http_request(&request)?;

        let lock = self.exclusion_lock(&bucket);
        let _exclusive = lock.lock().await;

        let mut rate_limited = 0u32;
        let mut server_errors = 0u32;

        loop {
            let global = self.limiter.acquire(GLOBAL_KEY).await;
            let permit = self.limiter.acquire(&bucket).await;
            drop(global);

            tracing::debug!(bucket = %bucket, url = %http_request.url, "REST request");
            let result = self.transport.execute(http_request.clone()).await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    drop(permit);
                    let body = e.to_string();
                    let delay = self.server_retry(server_errors, None, body)?;
                    server_errors += 1;
                    tracing::warn!(
                        bucket = %bucket,
                        error = %e,
                        attempt = server_errors,
                        timeout = matches!(e, TransportError::Timeout),
                        "REST transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            let info = RateLimitInfo::from_response(&response);
            if let (Some(remaining), Some(reset_in)) = (info.remaining, info.reset_in()) {
                self.limiter
                    .update_from_response(&bucket, remaining, Instant::now() + reset_in);
            }
            drop(permit);

            match response.status {
                200..=299 => return Ok(response),
                429 => {
                    rate_limited += 1;
                    let retry_after = info.retry_after.unwrap_or(DEFAULT_RETRY_AFTER);
                    let key = if info.global { GLOBAL_KEY } else { bucket.as_str() };
                    self.limiter.apply_retry_after(key, retry_after);

                    if rate_limited > self.config.max_rate_limit_retries {
                        return Err(RestError::RateLimitExceeded {
                            bucket,
                            attempts: rate_limited,
                        });
                    }
                    tracing::warn!(
                        bucket = %bucket,
                        global = info.global,
                        retry_after_ms = retry_after.as_millis() as u64,
                        "Rate limited, re-queueing request"
                    );
                }
                status @ 500..=599 => {
                    let delay = self.server_retry(server_errors, Some(status), response.body)?;
                    server_errors += 1;
                    tracing::warn!(
                        bucket = %bucket,
                        status,
                        attempt = server_errors,
                        "Server error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                status => {
                    tracing::debug!(bucket = %bucket, status, "Request rejected");
                    return Err(RestError::RequestRejected {
                        status,
                        body: response.body,
                    });
                }
            }
        }
    }
}
