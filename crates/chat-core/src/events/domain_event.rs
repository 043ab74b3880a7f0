//! Domain events - what application code observes after the cache has been updated
//!
//! Every variant carries the shard it arrived on and the new state. Variants that replace or
//! evict a cached entry also carry the `old` snapshot that was in the cache before the update,
//! which is `None` when the entry was unknown or its kind is not cached.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{
    ChannelData, GuildData, MemberData, MessageData, PresenceData, RoleData, UserData,
};
use crate::value_objects::Snowflake;

/// All possible domain events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    // =========================================================================
    // Session Events
    // =========================================================================
    Ready(ReadyEvent),
    Resumed(ResumedEvent),
    /// A shard gave up reconnecting or was closed by a fatal close code
    ShardDown(ShardDownEvent),

    // =========================================================================
    // Guild Events
    // =========================================================================
    GuildCreate(GuildCreateEvent),
    GuildUpdate(GuildUpdateEvent),
    GuildDelete(GuildDeleteEvent),

    // =========================================================================
    // Channel Events
    // =========================================================================
    ChannelCreate(ChannelEvent),
    ChannelUpdate(ChannelUpdateEvent),
    ChannelDelete(ChannelDeleteEvent),

    // =========================================================================
    // Role Events
    // =========================================================================
    RoleCreate(RoleEvent),
    RoleUpdate(RoleUpdateEvent),
    RoleDelete(RoleDeleteEvent),

    // =========================================================================
    // Member Events
    // =========================================================================
    MemberAdd(MemberAddEvent),
    MemberUpdate(MemberUpdateEvent),
    MemberRemove(MemberRemoveEvent),

    // =========================================================================
    // Message Events
    // =========================================================================
    MessageCreate(MessageCreateEvent),
    MessageUpdate(MessageUpdateEvent),
    MessageDelete(MessageDeleteEvent),
    ReactionAdd(ReactionEvent),
    ReactionRemove(ReactionEvent),

    // =========================================================================
    // Presence Events
    // =========================================================================
    PresenceUpdate(PresenceUpdateEvent),
    TypingStart(TypingStartEvent),
    UserUpdate(UserUpdateEvent),

    /// Dispatch kinds this client does not model, passed through untouched
    Unknown(UnknownEvent),
}

impl DomainEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &str {
        match self {
            Self::Ready(_) => "READY",
            Self::Resumed(_) => "RESUMED",
            Self::ShardDown(_) => "SHARD_DOWN",
            Self::GuildCreate(_) => "GUILD_CREATE",
            Self::GuildUpdate(_) => "GUILD_UPDATE",
            Self::GuildDelete(_) => "GUILD_DELETE",
            Self::ChannelCreate(_) => "CHANNEL_CREATE",
            Self::ChannelUpdate(_) => "CHANNEL_UPDATE",
            Self::ChannelDelete(_) => "CHANNEL_DELETE",
            Self::RoleCreate(_) => "GUILD_ROLE_CREATE",
            Self::RoleUpdate(_) => "GUILD_ROLE_UPDATE",
            Self::RoleDelete(_) => "GUILD_ROLE_DELETE",
            Self::MemberAdd(_) => "GUILD_MEMBER_ADD",
            Self::MemberUpdate(_) => "GUILD_MEMBER_UPDATE",
            Self::MemberRemove(_) => "GUILD_MEMBER_REMOVE",
            Self::MessageCreate(_) => "MESSAGE_CREATE",
            Self::MessageUpdate(_) => "MESSAGE_UPDATE",
            Self::MessageDelete(_) => "MESSAGE_DELETE",
            Self::ReactionAdd(_) => "MESSAGE_REACTION_ADD",
            Self::ReactionRemove(_) => "MESSAGE_REACTION_REMOVE",
            Self::PresenceUpdate(_) => "PRESENCE_UPDATE",
            Self::TypingStart(_) => "TYPING_START",
            Self::UserUpdate(_) => "USER_UPDATE",
            Self::Unknown(e) => &e.event_type,
        }
    }

    /// Get the shard the event arrived on
    pub fn shard(&self) -> u32 {
        match self {
            Self::Ready(e) => e.shard,
            Self::Resumed(e) => e.shard,
            Self::ShardDown(e) => e.shard,
            Self::GuildCreate(e) => e.shard,
            Self::GuildUpdate(e) => e.shard,
            Self::GuildDelete(e) => e.shard,
            Self::ChannelCreate(e) => e.shard,
            Self::ChannelUpdate(e) => e.shard,
            Self::ChannelDelete(e) => e.shard,
            Self::RoleCreate(e) => e.shard,
            Self::RoleUpdate(e) => e.shard,
            Self::RoleDelete(e) => e.shard,
            Self::MemberAdd(e) => e.shard,
            Self::MemberUpdate(e) => e.shard,
            Self::MemberRemove(e) => e.shard,
            Self::MessageCreate(e) => e.shard,
            Self::MessageUpdate(e) => e.shard,
            Self::MessageDelete(e) => e.shard,
            Self::ReactionAdd(e) | Self::ReactionRemove(e) => e.shard,
            Self::PresenceUpdate(e) => e.shard,
            Self::TypingStart(e) => e.shard,
            Self::UserUpdate(e) => e.shard,
            Self::Unknown(e) => e.shard,
        }
    }

    /// Guild the event is about, if any
    pub fn guild_id(&self) -> Option<Snowflake> {
        match self {
            Self::GuildCreate(e) => Some(e.guild.id),
            Self::GuildUpdate(e) => Some(e.guild.id),
            Self::GuildDelete(e) => Some(e.guild_id),
            Self::ChannelCreate(e) => e.channel.guild_id,
            Self::ChannelUpdate(e) => e.channel.guild_id,
            Self::ChannelDelete(e) => e.channel.guild_id,
            Self::RoleCreate(e) => e.role.guild_id,
            Self::RoleUpdate(e) => e.role.guild_id,
            Self::RoleDelete(e) => Some(e.guild_id),
            Self::MemberAdd(e) => Some(e.member.guild_id),
            Self::MemberUpdate(e) => Some(e.member.guild_id),
            Self::MemberRemove(e) => Some(e.guild_id),
            Self::MessageCreate(e) => e.message.guild_id,
            Self::MessageUpdate(e) => e.message.guild_id,
            Self::MessageDelete(e) => e.guild_id,
            Self::ReactionAdd(e) | Self::ReactionRemove(e) => e.guild_id,
            Self::PresenceUpdate(e) => Some(e.presence.guild_id),
            Self::TypingStart(e) => e.guild_id,
            Self::Ready(_)
            | Self::Resumed(_)
            | Self::ShardDown(_)
            | Self::UserUpdate(_)
            | Self::Unknown(_) => None,
        }
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyEvent {
    pub shard: u32,
    pub session_id: String,
    pub user: UserData,
    /// Guilds this shard will receive, initially unavailable
    pub guild_ids: Vec<Snowflake>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumedEvent {
    pub shard: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardDownEvent {
    pub shard: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildCreateEvent {
    pub shard: u32,
    pub guild: GuildData,
    pub old: Option<GuildData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildUpdateEvent {
    pub shard: u32,
    pub guild: GuildData,
    pub old: Option<GuildData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildDeleteEvent {
    pub shard: u32,
    pub guild_id: Snowflake,
    /// True when the guild became unavailable (outage) rather than the user leaving it
    pub unavailable: bool,
    pub old: Option<GuildData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEvent {
    pub shard: u32,
    pub channel: ChannelData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelUpdateEvent {
    pub shard: u32,
    pub channel: ChannelData,
    pub old: Option<ChannelData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDeleteEvent {
    pub shard: u32,
    pub channel: ChannelData,
    pub old: Option<ChannelData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleEvent {
    pub shard: u32,
    pub role: RoleData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleUpdateEvent {
    pub shard: u32,
    pub role: RoleData,
    pub old: Option<RoleData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDeleteEvent {
    pub shard: u32,
    pub guild_id: Snowflake,
    pub role_id: Snowflake,
    pub old: Option<RoleData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAddEvent {
    pub shard: u32,
    pub member: MemberData,
    pub user: Option<UserData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberUpdateEvent {
    pub shard: u32,
    pub member: MemberData,
    pub old: Option<MemberData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRemoveEvent {
    pub shard: u32,
    pub guild_id: Snowflake,
    pub user: UserData,
    pub old: Option<MemberData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCreateEvent {
    pub shard: u32,
    pub message: MessageData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageUpdateEvent {
    pub shard: u32,
    /// The cached message merged with the update, or just the update when nothing was cached
    pub message: MessageData,
    pub old: Option<MessageData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDeleteEvent {
    pub shard: u32,
    pub message_id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub old: Option<MessageData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub shard: u32,
    pub user_id: Snowflake,
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub emoji: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceUpdateEvent {
    pub shard: u32,
    pub presence: PresenceData,
    pub old: Option<PresenceData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingStartEvent {
    pub shard: u32,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub user_id: Snowflake,
    /// Unix time in seconds
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserUpdateEvent {
    pub shard: u32,
    pub user: UserData,
    pub old: Option<UserData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownEvent {
    pub shard: u32,
    pub event_type: String,
    pub data: Value,
}
