//! # chat-core
//!
//! Domain layer shared by every client crate: snowflake ids, the cached data shapes of
//! platform entities, and the [`DomainEvent`] union published to application code.
//! This crate has zero dependencies on transport, cache, or runtime crates.

pub mod entities;
pub mod events;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ChannelData, GuildData, MemberData, MessageData, PresenceData, RoleData, UserData,
};
pub use events::{
    ChannelDeleteEvent, ChannelEvent, ChannelUpdateEvent, DomainEvent, GuildCreateEvent,
    GuildDeleteEvent, GuildUpdateEvent, MemberAddEvent, MemberRemoveEvent, MemberUpdateEvent,
    MessageCreateEvent, MessageDeleteEvent, MessageUpdateEvent, PresenceUpdateEvent,
    ReactionEvent, ReadyEvent, ResumedEvent, RoleDeleteEvent, RoleEvent, RoleUpdateEvent,
    ShardDownEvent, TypingStartEvent, UnknownEvent, UserUpdateEvent,
};
pub use value_objects::{Snowflake, SnowflakeParseError};
