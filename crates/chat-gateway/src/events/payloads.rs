//! Dispatch payloads that are not plain entity snapshots

use chat_core::{MemberData, RoleData, Snowflake, UserData};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// GUILD_ROLE_CREATE / GUILD_ROLE_UPDATE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildRolePayload {
    pub guild_id: Snowflake,
    pub role: RoleData,
}

/// GUILD_ROLE_DELETE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildRoleDeletePayload {
    pub guild_id: Snowflake,
    pub role_id: Snowflake,
}

/// GUILD_MEMBER_REMOVE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildMemberRemovePayload {
    pub guild_id: Snowflake,
    pub user: UserData,
}

/// GUILD_MEMBERS_CHUNK
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildMembersChunkPayload {
    pub guild_id: Snowflake,
    /// Raw member objects, each with a nested `user`
    pub members: Vec<Value>,
    #[serde(default)]
    pub chunk_index: u32,
    #[serde(default)]
    pub chunk_count: u32,
    #[serde(default)]
    pub nonce: Option<String>,
}

/// GUILD_DELETE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildDeletePayload {
    pub id: Snowflake,
    /// Present and true when the guild is in an outage rather than left
    #[serde(default)]
    pub unavailable: bool,
}

/// MESSAGE_DELETE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDeletePayload {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
}

/// MESSAGE_REACTION_ADD / MESSAGE_REACTION_REMOVE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReactionPayload {
    pub user_id: Snowflake,
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub member: Option<MemberData>,
    #[serde(default)]
    pub emoji: Value,
}

/// TYPING_START
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingStartPayload {
    pub channel_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub user_id: Snowflake,
    #[serde(default)]
    pub timestamp: u64,
}
