//! Application-level gateway commands

use super::{
    GatewayMessage, OpCode, PresenceUpdatePayload, RequestGuildMembersPayload,
    VoiceStateUpdatePayload,
};

/// Outbound command routed to the shard owning an entity
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCommand {
    PresenceUpdate(PresenceUpdatePayload),
    RequestGuildMembers(RequestGuildMembersPayload),
    VoiceStateUpdate(VoiceStateUpdatePayload),
}

impl GatewayCommand {
    pub fn op(&self) -> OpCode {
        match self {
            Self::PresenceUpdate(_) => OpCode::PresenceUpdate,
            Self::RequestGuildMembers(_) => OpCode::RequestGuildMembers,
            Self::VoiceStateUpdate(_) => OpCode::VoiceStateUpdate,
        }
    }

    pub fn to_message(&self) -> GatewayMessage {
        match self {
            Self::PresenceUpdate(p) => GatewayMessage::presence_update(p),
            Self::RequestGuildMembers(p) => GatewayMessage::request_guild_members(p),
            Self::VoiceStateUpdate(p) => GatewayMessage::voice_state_update(p),
        }
    }
}
