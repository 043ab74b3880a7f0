//! Resumable session state of one shard

/// Session established by READY, kept across reconnects until invalidated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// Last dispatch sequence seen on this session
    pub sequence: u64,
    /// Where to reconnect for a resume
    pub resume_url: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>, sequence: u64, resume_url: Option<String>) -> Self {
        Self {
            id: id.into(),
            sequence,
            resume_url,
        }
    }

    /// Record a dispatch sequence; sequences never move backwards
    pub fn observe(&mut self, sequence: u64) {
        self.sequence = self.sequence.max(sequence);
    }
}

/// Lifecycle state of a shard connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Identifying,
    Resuming,
    Connected,
    /// Terminal; the shard will not reconnect
    Closed,
}

impl ConnectionStatus {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Identifying => "identifying",
            Self::Resuming => "resuming",
            Self::Connected => "connected",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
