//! Request and response bodies

use chat_core::{MemberData, Snowflake, UserData};
use serde::{Deserialize, Serialize};

// === Requests ===

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuildCreateRequest {
    pub name: String,
    /// `data:` URI, see [`Image::data_uri`](crate::Image::data_uri)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuildModifyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `data:` URI, see [`Image::data_uri`](crate::Image::data_uri)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Snowflake>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelCreateRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberModifyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Snowflake>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deaf: Option<bool>,
    /// Voice channel to move the member to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BanAddRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_message_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleCreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    pub hoist: bool,
    pub mentionable: bool,
}

/// Only the fields that are set are changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleModifyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentionable: Option<bool>,
}

/// New position of one role or channel; a reorder sends a list of these
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionModifyRequest {
    pub id: Snowflake,
    pub position: i32,
}

// === Responses ===

/// `GET /gateway/bot`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayBotResponse {
    pub url: String,
    /// Recommended shard count
    pub shards: u32,
    pub session_start_limit: SessionStartLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SessionStartLimit {
    pub total: u32,
    pub remaining: u32,
    pub reset_after: u64,
    /// Identifies allowed per 5 seconds
    pub max_concurrency: u32,
}

/// Guild member as the REST API returns it, with the user nested
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberResponse {
    pub user: UserData,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default)]
    pub joined_at: Option<String>,
    #[serde(default)]
    pub pending: bool,
}

impl MemberResponse {
    /// Split into cached member data and the nested user
    pub fn into_parts(self, guild_id: Snowflake) -> (MemberData, UserData) {
        let member = MemberData {
            guild_id,
            user_id: self.user.id,
            nick: self.nick,
            roles: self.roles,
            joined_at: self.joined_at,
            pending: self.pending,
        };
        (member, self.user)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BanResponse {
    #[serde(default)]
    pub reason: Option<String>,
    pub user: UserData,
}
