use super::ids::{DedupKey, ProjectName, SessionId};
use chrono::{DateTime, SecondsFormat, Utc};

/// Token counts for one event, split by the four billed categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenCounts {
    pub input: u64,
    pub output: u64,
    pub cache_creation: u64,
    pub cache_read: u64,
}

impl TokenCounts {
    pub fn total(&self) -> u64 {
        self.input + self.output + self.cache_creation + self.cache_read
    }
}

impl std::ops::AddAssign for TokenCounts {
    fn add_assign(&mut self, other: Self) {
        self.input += other.input;
        self.output += other.output;
        self.cache_creation += other.cache_creation;
        self.cache_read += other.cache_read;
    }
}

/// One recorded unit of assistant interaction, validated at the parse
/// boundary and immutable once admitted to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEvent {
    pub session: SessionId,
    pub project: Option<ProjectName>,
    pub model: String,
    pub timestamp: DateTime<Utc>,
    pub tokens: TokenCounts,
}

impl UsageEvent {
    /// Identity used for load-time deduplication.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::from(format!(
            "{}:{}:{}:{}:{}:{}",
            self.session,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.tokens.input,
            self.tokens.output,
            self.tokens.cache_creation,
            self.tokens.cache_read,
        ))
    }
}
