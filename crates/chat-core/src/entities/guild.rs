//! Guild data - a server/community

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Cached guild data.
///
/// Nested collections (`members`, `channels`, `roles`) are split into their own cache entries
/// when a guild is received, so they are usually empty on a cached guild.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildData {
    pub id: Snowflake,
    pub name: String,
    pub icon: Option<String>,
    pub owner_id: Snowflake,
    pub member_count: Option<u64>,
    pub unavailable: bool,
}

impl GuildData {
    /// Check if user is the guild owner
    #[inline]
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == user_id
    }

    /// Get icon path if set
    pub fn icon_url(&self) -> Option<String> {
        self.icon
            .as_ref()
            .map(|hash| format!("/icons/{}/{}.png", self.id, hash))
    }
}
