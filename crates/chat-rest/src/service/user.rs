//! User endpoints

use std::sync::Arc;

use chat_core::{Snowflake, UserData};

use super::call;
use crate::error::RestResult;
use crate::handler::RequestHandler;
use crate::request::Request;
use crate::route::Route;

#[derive(Debug, Clone)]
pub struct UserService {
    handler: Arc<dyn RequestHandler>,
}

impl UserService {
    pub fn new(handler: Arc<dyn RequestHandler>) -> Self {
        Self { handler }
    }

    /// The user the token belongs to
    pub async fn get_current_user(&self) -> RestResult<UserData> {
        call(self.handler.as_ref(), Request::new(Route::CURRENT_USER_GET)).await
    }

    pub async fn get_user(&self, user_id: Snowflake) -> RestResult<UserData> {
        let request = Request::new(Route::USER_GET).param("user_id", user_id);
        call(self.handler.as_ref(), request).await
    }
}
