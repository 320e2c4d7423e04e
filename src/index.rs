//! Thread-safe prefix index.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::config::IndexConfig;
use crate::error::Result;
use crate::trie::Trie;

/// A prefix index shared between request handlers.
///
/// One reader-writer lock guards the whole trie. Insert and delete hold the
/// write lock for the full operation, pruning included; queries hold the
/// read lock for the full traversal, so a query never sees a half-updated
/// node. A single lock also means there is no lock ordering to get wrong
/// between root-to-leaf inserts and leaf-to-root pruning.
pub struct PrefixIndex<I> {
    inner: RwLock<Trie<I>>,
    /// Number of entries, readable without taking the lock
    len: AtomicUsize,
    config: IndexConfig,
}

impl<I> PrefixIndex<I>
where
    I: Ord + Clone,
{
    /// Create an empty index with default configuration.
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    /// Create an empty index with the given configuration.
    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            inner: RwLock::new(Trie::with_capacity(config.initial_capacity)),
            len: AtomicUsize::new(0),
            config,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Record `id` under `key`.
    pub fn insert(&self, key: &str, id: I) -> Result<()> {
        let mut inner = self.inner.write();
        inner.insert(key, id)?;
        self.len.store(inner.len(), Ordering::Relaxed);
        Ok(())
    }

    /// Remove `id` from `key`, pruning dead nodes before the lock is released.
    pub fn delete(&self, key: &str, id: &I) -> Result<()> {
        let mut inner = self.inner.write();
        inner.delete(key, id)?;
        self.len.store(inner.len(), Ordering::Relaxed);
        Ok(())
    }

    /// Up to `limit` identifiers under keys starting with `prefix`.
    pub fn query(&self, prefix: &str, limit: usize) -> Result<Vec<I>> {
        self.inner.read().query(prefix, limit)
    }

    /// [`query`](Self::query) with the configured default limit.
    pub fn query_default(&self, prefix: &str) -> Result<Vec<I>> {
        self.query(prefix, self.config.default_limit)
    }

    /// Whether `id` is stored under exactly `key`.
    pub fn contains(&self, key: &str, id: &I) -> bool {
        self.inner.read().contains(key, id)
    }

    /// Every `(key, id)` entry below `prefix`, in query order.
    pub fn entries(&self, prefix: &str) -> Result<Vec<(String, I)>> {
        let inner = self.inner.read();
        let entries = inner
            .iter_prefix(prefix)?
            .map(|(key, id)| (key, id.clone()))
            .collect();
        Ok(entries)
    }

    /// Replace the whole index with `entries`.
    ///
    /// The new trie is built without holding the lock and swapped in at the
    /// end, so readers see either the old contents or the new ones. On error
    /// the current contents are kept.
    pub fn rebuild<K, It>(&self, entries: It) -> Result<usize>
    where
        K: AsRef<str>,
        It: IntoIterator<Item = (K, I)>,
    {
        let mut fresh = Trie::with_capacity(self.config.initial_capacity);
        for (key, id) in entries {
            fresh.insert(key.as_ref(), id)?;
        }
        let count = fresh.len();
        let nodes = fresh.node_count();

        let mut inner = self.inner.write();
        *inner = fresh;
        self.len.store(count, Ordering::Relaxed);
        drop(inner);

        debug!(entries = count, nodes, "rebuilt prefix index");
        Ok(count)
    }

    /// Get the number of entries in the index.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live trie nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.inner.read().node_count()
    }

    /// Approximate heap bytes used by the trie.
    pub fn memory_usage(&self) -> usize {
        self.inner.read().memory_usage()
    }

    pub fn shrink_to_fit(&self) {
        self.inner.write().shrink_to_fit();
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.clear();
        self.len.store(0, Ordering::Relaxed);
    }
}

impl<I: Ord + Clone> Default for PrefixIndex<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: std::fmt::Debug> std::fmt::Debug for PrefixIndex<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixIndex")
            .field("len", &self.len.load(Ordering::Relaxed))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
