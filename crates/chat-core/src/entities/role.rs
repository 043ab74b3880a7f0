//! Role data - a named permission set within a guild

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Cached role data.
///
/// `guild_id` is not part of the platform's role object; it is filled in from the
/// surrounding dispatch before caching.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleData {
    pub id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub position: i32,
    /// Permission bitset, a decimal string on the wire
    pub permissions: String,
    pub managed: bool,
    pub mentionable: bool,
}

impl RoleData {
    /// Check if this is the @everyone role (its id equals the guild id)
    #[inline]
    pub fn is_everyone(&self) -> bool {
        self.guild_id == Some(self.id)
    }

    /// Role color as a `#rrggbb` string, `None` for the default color
    pub fn color_hex(&self) -> Option<String> {
        (self.color != 0).then(|| format!("#{:06x}", self.color))
    }

    /// Parsed permission bitset
    pub fn permission_bits(&self) -> u64 {
        self.permissions.parse().unwrap_or(0)
    }
}
