//! Message data - content posted in a channel

use serde::{Deserialize, Serialize};

use super::user::UserData;
use crate::value_objects::Snowflake;

/// Message data as dispatched by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageData {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub author: Option<UserData>,
    pub content: String,
    pub timestamp: Option<String>,
    pub edited_timestamp: Option<String>,
    pub pinned: bool,
}

impl MessageData {
    /// Check if message has been edited
    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited_timestamp.is_some()
    }

    /// Check if the author is a bot account
    pub fn is_from_bot(&self) -> bool {
        self.author.as_ref().is_some_and(|a| a.bot)
    }
}
