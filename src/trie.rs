//! Single-threaded prefix trie mapping text keys to sets of identifiers.
//!
//! Every operation walks the tree with an explicit loop or stack, so deep
//! keys never grow the call stack.

use tracing::trace;

use crate::arena::{NodeArena, NodeId};
use crate::error::{IndexError, Result};
use crate::node::Node;

/// Default arena pre-allocation, in nodes.
pub(crate) const DEFAULT_CAPACITY: usize = 1024;

/// Prefix trie whose entries are `(key, identifier)` pairs.
///
/// - The same identifier may be stored under any number of distinct keys.
/// - Each exact key holds a given identifier at most once.
/// - Nodes that no longer lead to any entry are pruned on delete.
///
/// Keys are taken as-is; case folding and trimming are up to the caller.
#[derive(Clone, Debug)]
pub struct Trie<I> {
    nodes: NodeArena<I>,
    entries: usize,
}

impl<I> Trie<I> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty trie with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: NodeArena::with_capacity(capacity),
            entries: 0,
        }
    }

    /// Number of `(key, identifier)` entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Number of live nodes, including the root.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.live()
    }

    pub fn memory_usage(&self) -> usize {
        self.nodes.memory_usage()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Remove every entry, keeping only the root.
    pub fn clear(&mut self) {
        let capacity = self.nodes.capacity();
        self.nodes = NodeArena::with_capacity(capacity);
        self.entries = 0;
    }

    pub(crate) fn arena(&self) -> &NodeArena<I> {
        &self.nodes
    }

    /// Follow `key` from `from` without creating anything.
    fn descend(&self, from: NodeId, key: &str) -> Result<NodeId> {
        key.chars().try_fold(from, |current, ch| {
            self.nodes[current].child(ch).ok_or(IndexError::KeyNotFound)
        })
    }

    /// Follow `key` from `from`, creating missing nodes along the way.
    ///
    /// Returns the terminal node and the number of nodes created.
    fn descend_or_create(&mut self, from: NodeId, key: &str) -> (NodeId, usize) {
        let mut current = from;
        let mut created = 0usize;
        for ch in key.chars() {
            current = match self.nodes[current].child(ch) {
                Some(next) => next,
                None => {
                    let next = self.nodes.alloc(Node::new(ch, current));
                    self.nodes[current].attach_child(ch, next);
                    created += 1;
                    next
                }
            };
        }
        (current, created)
    }

    /// Remove dead nodes from `start` upward. Returns how many were removed.
    ///
    /// Stops at the first node that still holds identifiers or children, and
    /// always at the root.
    fn prune(&mut self, start: NodeId) -> usize {
        let mut current = start;
        let mut pruned = 0usize;
        while current != NodeId::ROOT && self.nodes[current].is_dead() {
            let Some(node) = self.nodes.free(current) else {
                break;
            };
            let (Some(parent), Some(ch)) = (node.parent(), node.character()) else {
                break;
            };
            self.nodes[parent].detach_child(ch);
            pruned += 1;
            current = parent;
        }
        pruned
    }

    /// Iterate over every entry whose key starts with `prefix`.
    ///
    /// Entries come out in the same order [`Trie::query`] uses: a node's own
    /// identifiers first, then its children by ascending character.
    pub fn iter_prefix(&self, prefix: &str) -> Result<Entries<'_, I>> {
        let start = self.descend(NodeId::ROOT, prefix)?;
        Ok(Entries {
            nodes: &self.nodes,
            stack: vec![(start, prefix.to_owned())],
            pending: None,
        })
    }
}

impl<I: Ord + Clone> Trie<I> {
    /// Record `id` under `key`.
    ///
    /// Fails with [`IndexError::DuplicateValue`] if `id` is already stored
    /// under exactly this key, leaving the trie unchanged.
    pub fn insert(&mut self, key: &str, id: I) -> Result<()> {
        if key.is_empty() {
            return Err(IndexError::EmptyKey);
        }

        // A rejected insert must not create nodes.
        if let Ok(terminal) = self.descend(NodeId::ROOT, key) {
            if self.nodes[terminal].contains(&id) {
                return Err(IndexError::DuplicateValue);
            }
        }

        let (terminal, created) = self.descend_or_create(NodeId::ROOT, key);
        if !self.nodes[terminal].add_identifier(id) {
            return Err(IndexError::DuplicateValue);
        }
        self.entries += 1;
        trace!(key_len = key.len(), created, "inserted entry");
        Ok(())
    }

    /// Remove `id` from `key`, pruning nodes that no longer lead anywhere.
    pub fn delete(&mut self, key: &str, id: &I) -> Result<()> {
        if key.is_empty() {
            return Err(IndexError::EmptyKey);
        }

        let terminal = self.descend(NodeId::ROOT, key)?;
        if !self.nodes[terminal].remove_identifier(id) {
            return Err(IndexError::ValueNotFound);
        }
        self.entries -= 1;

        let pruned = self.prune(terminal);
        trace!(key_len = key.len(), pruned, "deleted entry");
        Ok(())
    }

    /// Up to `limit` identifiers stored under keys starting with `prefix`.
    ///
    /// An empty prefix matches everything. Identifiers on the node matching
    /// `prefix` come first in canonical order, then each child subtree in
    /// ascending character order, depth first. Fails with
    /// [`IndexError::KeyNotFound`] if no key starts with `prefix`.
    pub fn query(&self, prefix: &str, limit: usize) -> Result<Vec<I>> {
        let start = self.descend(NodeId::ROOT, prefix)?;
        let mut out = Vec::with_capacity(limit.min(self.entries));

        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let remaining = limit - out.len();
            if remaining == 0 {
                break;
            }
            let node = &self.nodes[id];
            out.extend(node.identifiers().iter().take(remaining).cloned());
            stack.extend(node.children().iter().rev().map(|&(_, child)| child));
        }

        Ok(out)
    }

    /// Whether `id` is stored under exactly `key`.
    pub fn contains(&self, key: &str, id: &I) -> bool {
        self.descend(NodeId::ROOT, key)
            .map(|terminal| self.nodes[terminal].contains(id))
            .unwrap_or(false)
    }
}

impl<I> Default for Trie<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(key, identifier)` entries below a prefix.
pub struct Entries<'a, I> {
    nodes: &'a NodeArena<I>,
    stack: Vec<(NodeId, String)>,
    pending: Option<(String, std::slice::Iter<'a, I>)>,
}

impl<'a, I> Iterator for Entries<'a, I> {
    type Item = (String, &'a I);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, ids)) = &mut self.pending {
                if let Some(id) = ids.next() {
                    return Some((key.clone(), id));
                }
                self.pending = None;
            }

            let (id, key) = self.stack.pop()?;
            let nodes = self.nodes;
            let node = &nodes[id];
            for &(ch, child) in node.children().iter().rev() {
                let mut child_key = String::with_capacity(key.len() + ch.len_utf8());
                child_key.push_str(&key);
                child_key.push(ch);
                self.stack.push((child, child_key));
            }
            self.pending = Some((key, node.identifiers().iter()));
        }
    }
}
