//! Gateway protocol definitions
//!
//! Op codes, the message envelope, payloads, intents and close codes.

mod close_codes;
mod commands;
mod intents;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use commands::GatewayCommand;
pub use intents::Intents;
pub use messages::GatewayMessage;
pub use opcodes::OpCode;
pub use payloads::{
    HelloPayload, IdentifyPayload, IdentifyProperties, PresenceUpdatePayload, ReadyPayload,
    RequestGuildMembersPayload, ResumePayload, UnavailableGuild, VoiceStateUpdatePayload,
};
