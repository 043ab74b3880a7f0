//! HTTP responses and the rate-limit information they carry

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::RestResult;

/// A response as returned by the transport
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-case
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl ToString) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body; an empty body decodes as JSON `null`
    pub fn json<T: DeserializeOwned>(&self) -> RestResult<T> {
        let body = if self.body.trim().is_empty() { "null" } else { &self.body };
        Ok(serde_json::from_str(body)?)
    }
}

/// Rate-limit state reported by one response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RateLimitInfo {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    /// Epoch seconds at which the bucket resets
    pub reset: Option<f64>,
    /// Seconds until the bucket resets
    pub reset_after: Option<f64>,
    /// Server-side bucket hash
    pub bucket: Option<String>,
    /// The 429 applies to every route
    pub global: bool,
    pub retry_after: Option<Duration>,
}

/// Body of a 429 response
#[derive(Debug, Deserialize)]
struct TooManyRequestsBody {
    retry_after: Option<f64>,
    #[serde(default)]
    global: bool,
}

impl RateLimitInfo {
    pub fn from_response(response: &HttpResponse) -> Self {
        let parse_u32 = |name: &str| response.header(name).and_then(|v| v.trim().parse().ok());
        let parse_f64 = |name: &str| response.header(name).and_then(|v| v.trim().parse().ok());

        let mut info = Self {
            limit: parse_u32("x-ratelimit-limit"),
            remaining: parse_u32("x-ratelimit-remaining"),
            reset: parse_f64("x-ratelimit-reset"),
            reset_after: parse_f64("x-ratelimit-reset-after"),
            bucket: response.header("x-ratelimit-bucket").map(str::to_string),
            global: response
                .header("x-ratelimit-global")
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            retry_after: parse_f64("retry-after").and_then(seconds),
        };

        if response.status == 429 {
            if let Ok(body) = serde_json::from_str::<TooManyRequestsBody>(&response.body) {
                if let Some(retry_after) = body.retry_after.and_then(seconds) {
                    info.retry_after = Some(retry_after);
                }
                info.global |= body.global;
            }
        }
        info
    }

    /// Time until the bucket resets, preferring the relative header
    pub fn reset_in(&self) -> Option<Duration> {
        if let Some(after) = self.reset_after {
            return seconds(after);
        }
        let reset = self.reset?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs_f64();
        seconds((reset - now).max(0.0))
    }
}

/// Longest wait taken from a server-supplied value
pub const MAX_SERVER_WAIT: Duration = Duration::from_secs(3_600);

/// Server-supplied seconds as a wait, capped at [`MAX_SERVER_WAIT`]
fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value)
        .ok()
        .map(|wait| wait.min(MAX_SERVER_WAIT))
}
