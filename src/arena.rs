//! Slot arena holding trie nodes.
//!
//! Nodes reference each other through [`NodeId`] handles instead of
//! pointers. Ownership flows strictly from the arena; a parent handle stored
//! in a child is just an index and never keeps anything alive.
//!
//! Freed slots go on a free list and are reused by the next allocation, so
//! handles stay small and the backing vector does not grow under churn.

use std::ops::{Index, IndexMut};

use crate::node::Node;

/// A 32-bit handle into a [`NodeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Handle of the root node, which always occupies the first slot.
    pub const ROOT: NodeId = NodeId(0);

    /// Create a handle from a slot index.
    ///
    /// # Panics
    /// Panics if the index does not fit in 32 bits.
    pub fn from_usize(index: usize) -> Self {
        assert!(index < u32::MAX as usize, "node arena index too large");
        Self(index as u32)
    }

    /// Get the slot index.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Node arena with a free list of released slots.
#[derive(Clone, Debug)]
pub struct NodeArena<I> {
    slots: Vec<Option<Node<I>>>,
    free: Vec<NodeId>,
}

impl<I> NodeArena<I> {
    /// Create an arena with room for `capacity` nodes, holding only the root.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.push(Some(Node::root()));
        Self {
            slots,
            free: Vec::new(),
        }
    }

    /// Store a node and return its handle.
    pub fn alloc(&mut self, node: Node<I>) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id.as_usize()] = Some(node);
            return id;
        }
        let id = NodeId::from_usize(self.slots.len());
        self.slots.push(Some(node));
        id
    }

    /// Release a slot, returning the node that lived there.
    ///
    /// The root slot is never released; freeing it returns `None`.
    pub fn free(&mut self, id: NodeId) -> Option<Node<I>> {
        if id == NodeId::ROOT {
            return None;
        }
        let node = self.slots.get_mut(id.as_usize())?.take()?;
        self.free.push(id);
        Some(node)
    }

    /// Borrow a live node.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<I>> {
        self.slots.get(id.as_usize())?.as_ref()
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> &Node<I> {
        &self[NodeId::ROOT]
    }

    /// Number of live nodes, including the root.
    #[inline]
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of node slots the arena can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Approximate heap bytes held by the arena and its nodes.
    pub fn memory_usage(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<Option<Node<I>>>()
            + self.free.capacity() * std::mem::size_of::<NodeId>()
            + self
                .slots
                .iter()
                .flatten()
                .map(Node::heap_bytes)
                .sum::<usize>()
    }

    /// Drop trailing free slots and release spare capacity.
    pub fn shrink_to_fit(&mut self) {
        while self.slots.len() > 1 && matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let len = self.slots.len();
        self.free.retain(|id| id.as_usize() < len);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
        for node in self.slots.iter_mut().flatten() {
            node.shrink_to_fit();
        }
    }
}

impl<I> Index<NodeId> for NodeArena<I> {
    type Output = Node<I>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<I> {
        match self.slots[id.as_usize()] {
            Some(ref node) => node,
            None => panic!("stale node handle {id:?}"),
        }
    }
}

impl<I> IndexMut<NodeId> for NodeArena<I> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<I> {
        match self.slots[id.as_usize()] {
            Some(ref mut node) => node,
            None => panic!("stale node handle {id:?}"),
        }
    }
}

impl<I> Default for NodeArena<I> {
    fn default() -> Self {
        Self::with_capacity(1)
    }
}
