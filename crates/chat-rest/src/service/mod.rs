//! Typed services over a [`RequestHandler`]

mod gateway;
mod guild;
mod user;

pub use gateway::GatewayService;
pub use guild::GuildService;
pub use user::UserService;

use std::sync::Arc;

use chat_common::RateLimiter;
use serde::de::DeserializeOwned;

use crate::config::RestConfig;
use crate::error::RestResult;
use crate::handler::{ExclusionRequestHandler, RequestHandler};
use crate::request::Request;
use crate::transport::ReqwestTransport;

/// Entry point to every REST service
#[derive(Debug, Clone)]
pub struct RestClient {
    handler: Arc<dyn RequestHandler>,
}

impl RestClient {
    pub fn new(handler: Arc<dyn RequestHandler>) -> Self {
        Self { handler }
    }

    /// Client with an exclusion handler over reqwest
    pub fn from_config(config: RestConfig, limiter: RateLimiter) -> RestResult<Self> {
        let transport = ReqwestTransport::new(config.timeout, &config.user_agent)?;
        let handler = ExclusionRequestHandler::new(config, Arc::new(transport), limiter);
        Ok(Self::new(Arc::new(handler)))
    }

    pub fn handler(&self) -> &Arc<dyn RequestHandler> {
        &self.handler
    }

    pub fn guild(&self) -> GuildService {
        GuildService::new(Arc::clone(&self.handler))
    }

    pub fn user(&self) -> UserService {
        UserService::new(Arc::clone(&self.handler))
    }

    pub fn gateway(&self) -> GatewayService {
        GatewayService::new(Arc::clone(&self.handler))
    }
}

/// Execute and decode the body
async fn call<T: DeserializeOwned>(handler: &dyn RequestHandler, request: Request) -> RestResult<T> {
    handler.handle(request).await?.json()
}

/// Execute and discard the body
async fn call_empty(handler: &dyn RequestHandler, request: Request) -> RestResult<()> {
    handler.handle(request).await.map(|_| ())
}
