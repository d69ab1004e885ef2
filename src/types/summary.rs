use super::event::TokenCounts;
use std::collections::HashMap;

/// Aggregate view over a set of events. Produced by `summarize`; has no
/// identity or lifecycle beyond the query that built it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub event_count: usize,
    pub tokens: TokenCounts,
    pub total_cost: f64,
    pub cache_savings: f64,
    /// Events whose model had no pricing entry; their tokens are counted
    /// above but contribute nothing to `total_cost`.
    pub unpriced_count: usize,
    pub session_count: usize,
    pub project_count: usize,
    /// Keyed by normalized model name. Iteration order is the caller's
    /// concern.
    pub by_model: HashMap<String, ModelUsage>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.event_count == 0
    }
}

/// Per-model slice of a `Summary`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelUsage {
    pub requests: usize,
    pub tokens: TokenCounts,
    pub cost: f64,
}
