//! Index configuration.

/// Configuration for a [`PrefixIndex`](crate::PrefixIndex).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IndexConfig {
    /// Initial capacity hint for the number of trie nodes
    pub initial_capacity: usize,
    /// Result count used by `query_default` and `search_default`
    pub default_limit: usize,
}

impl IndexConfig {
    /// Default number of results returned by a type-ahead lookup.
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            initial_capacity: crate::trie::DEFAULT_CAPACITY,
            default_limit: Self::DEFAULT_LIMIT,
        }
    }
}
