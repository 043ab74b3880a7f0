//! Presence data - a member's online status within a guild

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Cached presence data, keyed by guild and user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceData {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    /// `online`, `idle`, `dnd` or `offline`
    pub status: String,
    pub activities: Vec<serde_json::Value>,
}

impl PresenceData {
    pub fn is_online(&self) -> bool {
        !self.status.is_empty() && self.status != "offline"
    }
}
