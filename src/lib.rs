//! # prefix-index
//!
//! A mutable, concurrently accessed prefix-search index for type-ahead
//! lookup of records by partial name, user name or email.
//!
//! The index maps text keys to opaque identifiers and answers "up to N
//! identifiers whose key starts with this prefix" in a deterministic order:
//! identifiers on the node matching the prefix first (in their `Ord` order),
//! then each child subtree by ascending character, depth first.
//!
//! ## Example
//!
//! ```rust
//! use prefix_index::PrefixIndex;
//!
//! let index: PrefixIndex<u64> = PrefixIndex::new();
//! index.insert("helloa", 1).unwrap();
//! index.insert("hellob", 2).unwrap();
//! index.insert("hello", 3).unwrap();
//!
//! assert_eq!(index.query("hello", 10).unwrap(), vec![3, 1, 2]);
//!
//! index.delete("hello", &3).unwrap();
//! assert_eq!(index.query("hello", 1).unwrap(), vec![1]);
//! ```
//!
//! ## Layout
//!
//! - [`Trie`]: the single-threaded tree with insert, delete with pruning, and
//!   bounded ranked queries.
//! - [`PrefixIndex`]: the trie behind one reader-writer lock, for sharing
//!   across request threads.
//! - [`records`]: normalization and record lifecycle glue that keeps an index
//!   in sync with a record store.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod arena;
pub mod config;
pub mod error;
pub mod index;
pub mod node;
pub mod records;
pub mod trie;

pub use config::IndexConfig;
pub use error::{IndexError, Result};
pub use index::PrefixIndex;
pub use records::{Account, AccountId, IndexedRecord, NameUpdate, RecordError, RecordIndex};
pub use trie::{Entries, Trie};

#[cfg(test)]
mod proptests;
