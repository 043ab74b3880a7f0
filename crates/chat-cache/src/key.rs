//! Cache keys
//!
//! An entry is addressed by its entity kind, an optional scope and its id. Guild-scoped kinds
//! (members, presences) use the guild id as scope, because the same user id appears once per
//! guild. Every other kind is addressed by `(kind, id)` alone.

use std::fmt;

use chat_core::Snowflake;

use crate::error::CacheError;

/// Prefix of every storage key
pub const KEY_PREFIX: &str = "chat";

/// Kind of cached entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Guild,
    Channel,
    Role,
    Member,
    Message,
    Presence,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        Self::User,
        Self::Guild,
        Self::Channel,
        Self::Role,
        Self::Member,
        Self::Message,
        Self::Presence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Guild => "guild",
            Self::Channel => "channel",
            Self::Role => "role",
            Self::Member => "member",
            Self::Message => "message",
            Self::Presence => "presence",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Whether entries of this kind are scoped to a guild
    pub fn is_guild_scoped(&self) -> bool {
        matches!(self, Self::Member | Self::Presence)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: EntityKind,
    pub scope: Option<Snowflake>,
    pub id: Snowflake,
}

impl CacheKey {
    pub fn new(kind: EntityKind, id: Snowflake) -> Self {
        Self {
            kind,
            scope: None,
            id,
        }
    }

    pub fn scoped(kind: EntityKind, scope: Snowflake, id: Snowflake) -> Self {
        Self {
            kind,
            scope: Some(scope),
            id,
        }
    }

    pub fn user(id: Snowflake) -> Self {
        Self::new(EntityKind::User, id)
    }

    pub fn guild(id: Snowflake) -> Self {
        Self::new(EntityKind::Guild, id)
    }

    pub fn channel(id: Snowflake) -> Self {
        Self::new(EntityKind::Channel, id)
    }

    pub fn role(id: Snowflake) -> Self {
        Self::new(EntityKind::Role, id)
    }

    pub fn message(id: Snowflake) -> Self {
        Self::new(EntityKind::Message, id)
    }

    pub fn member(guild_id: Snowflake, user_id: Snowflake) -> Self {
        Self::scoped(EntityKind::Member, guild_id, user_id)
    }

    pub fn presence(guild_id: Snowflake, user_id: Snowflake) -> Self {
        Self::scoped(EntityKind::Presence, guild_id, user_id)
    }

    /// Storage key: `chat:{kind}:{id}` or `chat:{kind}:{scope}:{id}`
    pub fn storage_key(&self) -> String {
        self.to_string()
    }

    /// Name of the set indexing every key of `kind`
    pub fn index_key(kind: EntityKind) -> String {
        format!("{KEY_PREFIX}:{kind}:index")
    }

    /// Parse a storage key back into a cache key
    pub fn parse(s: &str) -> Result<Self, CacheError> {
        let invalid = || CacheError::InvalidKey(s.to_string());
        let mut parts = s.split(':');
        if parts.next() != Some(KEY_PREFIX) {
            return Err(invalid());
        }
        let kind = parts
            .next()
            .and_then(EntityKind::from_str)
            .ok_or_else(invalid)?;
        let rest: Vec<&str> = parts.collect();
        let parse_id = |p: &str| Snowflake::parse(p).map_err(|_| invalid());
        match rest.as_slice() {
            [id] if !kind.is_guild_scoped() => Ok(Self::new(kind, parse_id(id)?)),
            [scope, id] if kind.is_guild_scoped() => {
                Ok(Self::scoped(kind, parse_id(scope)?, parse_id(id)?))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            Some(scope) => write!(f, "{KEY_PREFIX}:{}:{scope}:{}", self.kind, self.id),
            None => write!(f, "{KEY_PREFIX}:{}:{}", self.kind, self.id),
        }
    }
}
