//! Snowflake ids
//!
//! Every entity the gateway and REST API hand out is identified by a 64-bit snowflake:
//!
//! ```text
//!  63                      22 21    17 16    12 11          0
//! +-------------------------+--------+--------+-------------+
//! | ms since platform epoch | worker | process|  increment  |
//! +-------------------------+--------+--------+-------------+
//! ```
//!
//! On the wire ids are JSON strings (they overflow a double), but some payloads and tests use
//! plain numbers, so both are accepted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(i64);

impl Snowflake {
    /// 2015-01-01T00:00:00Z in Unix milliseconds
    pub const EPOCH: i64 = 1_420_070_400_000;

    const TIMESTAMP_SHIFT: u32 = 22;

    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Unix milliseconds at which the id was minted
    #[inline]
    pub fn timestamp(&self) -> i64 {
        (self.0 >> Self::TIMESTAMP_SHIFT) + Self::EPOCH
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp()).unwrap_or_default()
    }

    /// Shard that receives events for this id when it is a guild id: `id mod shard_count`.
    ///
    /// A zero shard count maps everything to shard 0.
    pub fn shard_index(&self, shard_count: u32) -> u32 {
        match u64::from(shard_count) {
            0 => 0,
            n => u32::try_from(self.0.unsigned_abs() % n).unwrap_or_default(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, SnowflakeParseError> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| SnowflakeParseError::InvalidFormat(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("invalid snowflake: {0:?}")]
    InvalidFormat(String),
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for Snowflake {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<Snowflake> for i64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

/// Shapes an id may take in a payload
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match WireId::deserialize(deserializer)? {
            WireId::Number(id) => Ok(Self(id)),
            WireId::Text(text) => Self::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}
