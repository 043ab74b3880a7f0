//! REST errors

/// Error type for REST calls
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// Still rate limited after the configured number of re-queues
    #[error("Rate limit exceeded on {bucket} after {attempts} attempts")]
    RateLimitExceeded { bucket: String, attempts: u32 },

    /// 5xx or transport failure that outlasted the retry budget
    #[error("Remote service error ({}): {body}", describe_status(.status))]
    RemoteServiceError { status: Option<u16>, body: String },

    /// 4xx other than 429; never retried
    #[error("Request rejected ({status}): {body}")]
    RequestRejected { status: u16, body: String },

    #[error("Missing path parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RestError {
    /// HTTP status the error carries, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteServiceError { status, .. } => *status,
            Self::RequestRejected { status, .. } => Some(*status),
            Self::RateLimitExceeded { .. } => Some(429),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

fn describe_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "no response".to_string(), |s| s.to_string())
}

/// Result type for REST calls
pub type RestResult<T> = Result<T, RestError>;
