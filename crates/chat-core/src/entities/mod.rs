//! Cached entity data - the platform's JSON shapes as they appear in dispatches and REST bodies
//!
//! Every field not needed to identify an entity is lenient (`#[serde(default)]`), so partial
//! snapshots still deserialize.

mod channel;
mod guild;
mod member;
mod message;
mod presence;
mod role;
mod user;

pub use channel::{ChannelData, ChannelType};
pub use guild::GuildData;
pub use member::MemberData;
pub use message::MessageData;
pub use presence::PresenceData;
pub use role::RoleData;
pub use user::UserData;
