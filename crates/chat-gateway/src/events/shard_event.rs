//! Output of one shard, as merged by the manager

use serde_json::Value;

/// Item of the merged shard stream
#[derive(Debug, Clone, PartialEq)]
pub enum ShardEvent {
    /// A dispatch frame, forwarded once and in receipt order
    Dispatch {
        shard: u32,
        event_type: String,
        sequence: Option<u64>,
        data: Value,
    },
    /// The shard stopped for good: reconnects were exhausted or a fatal close code arrived
    Fatal { shard: u32, reason: String },
}

impl ShardEvent {
    pub fn shard(&self) -> u32 {
        match self {
            Self::Dispatch { shard, .. } | Self::Fatal { shard, .. } => *shard,
        }
    }
}
