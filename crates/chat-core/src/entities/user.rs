//! User data - a platform account

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Cached user data
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserData {
    pub id: Snowflake,
    pub username: String,
    pub discriminator: String,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    pub bot: bool,
}

impl UserData {
    /// Get the full tag: username#discriminator, or just the username for migrated accounts
    pub fn tag(&self) -> String {
        if self.discriminator.is_empty() || self.discriminator == "0" {
            self.username.clone()
        } else {
            format!("{}#{}", self.username, self.discriminator)
        }
    }

    /// Name shown in clients: global display name if set, otherwise the username
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    /// Get avatar path or default avatar path
    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(hash) => format!("/avatars/{}/{}.png", self.id, hash),
            None => format!("/embed/avatars/{}.png", self.default_avatar_index()),
        }
    }

    fn default_avatar_index(&self) -> u8 {
        match self.discriminator.parse::<u16>() {
            Ok(d) if d != 0 => (d % 5) as u8,
            _ => ((self.id.into_inner() >> 22) % 6) as u8,
        }
    }
}
