/// Successful completions allowed per process before chat is refused.
pub const QUOTA_LIMIT: u32 = 50;

/// One user query paired with the assistant's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user: String,
    pub ai: String,
}

/// Conversation context and quota counter for the lifetime of the process.
#[derive(Debug, Default)]
pub struct Session {
    exchanges: Vec<Exchange>,
    completions: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn recent(&self, count: usize) -> &[Exchange] {
        let start = self.exchanges.len().saturating_sub(count);
        &self.exchanges[start..]
    }

    /// Store a finished exchange and count it against the quota.
    pub fn record_completion(&mut self, user: String, ai: String) {
        self.exchanges.push(Exchange { user, ai });
        self.completions += 1;
    }

    /// Drops the conversation context. The quota counter is kept.
    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    pub fn completions(&self) -> u32 {
        self.completions
    }

    pub fn quota_exhausted(&self) -> bool {
        self.completions >= QUOTA_LIMIT
    }
}
