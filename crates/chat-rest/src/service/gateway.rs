//! Gateway discovery

use std::sync::Arc;

use super::call;
use crate::error::RestResult;
use crate::handler::RequestHandler;
use crate::json::GatewayBotResponse;
use crate::request::Request;
use crate::route::Route;

#[derive(Debug, Clone)]
pub struct GatewayService {
    handler: Arc<dyn RequestHandler>,
}

impl GatewayService {
    pub fn new(handler: Arc<dyn RequestHandler>) -> Self {
        Self { handler }
    }

    /// Gateway URL, recommended shard count and session-start limits
    pub async fn get_gateway_bot(&self) -> RestResult<GatewayBotResponse> {
        call(self.handler.as_ref(), Request::new(Route::GATEWAY_BOT_GET)).await
    }
}
