//! Gateway events
//!
//! Dispatch event names, dispatch payload shapes, and the per-shard output type.

mod event_types;
mod payloads;
mod shard_event;

pub use event_types::GatewayEventType;
pub use payloads::{
    GuildDeletePayload, GuildMemberRemovePayload, GuildMembersChunkPayload,
    GuildRoleDeletePayload, GuildRolePayload, MessageDeletePayload, MessageReactionPayload,
    TypingStartPayload,
};
pub use shard_event::ShardEvent;
