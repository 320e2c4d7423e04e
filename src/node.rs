//! Trie node model.
//!
//! Children and identifiers are kept in small sorted vectors. Most nodes in
//! a name/email index have a single child and at most one identifier, so the
//! inline capacity covers the common case without a heap allocation, and
//! sorted storage gives query traversal its deterministic order for free.

use smallvec::SmallVec;

use crate::arena::NodeId;

/// One character step along an indexed key.
#[derive(Clone, Debug)]
pub struct Node<I> {
    /// `None` only for the root.
    character: Option<char>,
    /// Non-owning back-reference; `None` only for the root.
    parent: Option<NodeId>,
    /// Sorted by character, keys unique.
    children: SmallVec<[(char, NodeId); 2]>,
    /// Sorted by canonical order, entries unique.
    identifiers: SmallVec<[I; 1]>,
}

impl<I> Node<I> {
    pub(crate) fn root() -> Self {
        Self {
            character: None,
            parent: None,
            children: SmallVec::new(),
            identifiers: SmallVec::new(),
        }
    }

    /// Create a node for `character` hanging off `parent`.
    pub fn new(character: char, parent: NodeId) -> Self {
        Self {
            character: Some(character),
            parent: Some(parent),
            children: SmallVec::new(),
            identifiers: SmallVec::new(),
        }
    }

    /// The character on the edge leading into this node.
    #[inline]
    pub fn character(&self) -> Option<char> {
        self.character
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child handles in ascending character order.
    #[inline]
    pub fn children(&self) -> &[(char, NodeId)] {
        &self.children
    }

    /// Identifiers ending exactly here, in canonical order.
    #[inline]
    pub fn identifiers(&self) -> &[I] {
        &self.identifiers
    }

    /// Look up the child for `ch`.
    #[inline]
    pub fn child(&self, ch: char) -> Option<NodeId> {
        self.children
            .binary_search_by_key(&ch, |&(c, _)| c)
            .ok()
            .map(|pos| self.children[pos].1)
    }

    /// Link a child under `ch`. An existing link for `ch` is replaced.
    pub fn attach_child(&mut self, ch: char, id: NodeId) {
        match self.children.binary_search_by_key(&ch, |&(c, _)| c) {
            Ok(pos) => self.children[pos].1 = id,
            Err(pos) => self.children.insert(pos, (ch, id)),
        }
    }

    /// Unlink the child under `ch`, returning its handle.
    pub fn detach_child(&mut self, ch: char) -> Option<NodeId> {
        let pos = self
            .children
            .binary_search_by_key(&ch, |&(c, _)| c)
            .ok()?;
        Some(self.children.remove(pos).1)
    }

    /// A node with neither identifiers nor children contributes nothing.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.identifiers.is_empty() && self.children.is_empty()
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        let children = if self.children.spilled() {
            self.children.capacity() * std::mem::size_of::<(char, NodeId)>()
        } else {
            0
        };
        let identifiers = if self.identifiers.spilled() {
            self.identifiers.capacity() * std::mem::size_of::<I>()
        } else {
            0
        };
        children + identifiers
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.children.shrink_to_fit();
        self.identifiers.shrink_to_fit();
    }
}

impl<I: Ord> Node<I> {
    #[inline]
    pub fn contains(&self, id: &I) -> bool {
        self.identifiers.binary_search(id).is_ok()
    }

    /// Record `id` here. Returns `false` if it was already present.
    pub fn add_identifier(&mut self, id: I) -> bool {
        match self.identifiers.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.identifiers.insert(pos, id);
                true
            }
        }
    }

    /// Forget `id`. Returns `false` if it was not present.
    pub fn remove_identifier(&mut self, id: &I) -> bool {
        match self.identifiers.binary_search(id) {
            Ok(pos) => {
                self.identifiers.remove(pos);
                true
            }
            Err(_) => false,
        }
    }
}
