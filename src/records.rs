//! Keeping a [`PrefixIndex`] in sync with a record store.
//!
//! Records expose the raw text fields they should be found by. This module
//! owns the normalization the index itself never does (trim and lower-case),
//! turns each record into its set of distinct keys, and applies record
//! lifecycle events (load, create, update, remove) as index inserts and
//! deletes.

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::index::PrefixIndex;

/// Failure while applying a record event to the index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Index(#[from] IndexError),
    /// A record update carried an empty required field.
    #[error("{0} must not be empty")]
    InvalidUpdate(&'static str),
}

/// A record that can be found by prefix search.
pub trait IndexedRecord {
    /// Identifier stored in the index. Its `Ord` is the canonical result order.
    type Id: Ord + Clone;

    fn id(&self) -> Self::Id;

    /// Raw field values to index. Empty values are skipped.
    fn index_fields(&self) -> Vec<&str>;
}

/// Case-fold a key or query the same way for indexing and lookup.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Distinct, non-empty normalized keys for `record`.
///
/// A record whose user name equals its first name is indexed once under that
/// key, so removing one field later cannot strip the other's entry.
pub fn index_keys<R: IndexedRecord + ?Sized>(record: &R) -> BTreeSet<String> {
    record
        .index_fields()
        .into_iter()
        .map(normalize)
        .filter(|key| !key.is_empty())
        .collect()
}

/// Identifier of an [`Account`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A user account, searchable by email, user name, first and last name.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
}

/// Allowed profile changes for an [`Account`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NameUpdate {
    pub first_name: String,
    pub last_name: String,
}

impl Account {
    /// "First Last", or just whichever part is non-empty.
    pub fn full_name(&self) -> String {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return format!("{}{}", self.first_name, self.last_name);
        }
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Apply `update`, rejecting empty names. On error nothing changes.
    pub fn apply_update(&mut self, update: &NameUpdate) -> Result<(), RecordError> {
        if update.first_name.is_empty() {
            return Err(RecordError::InvalidUpdate("first name"));
        }
        if update.last_name.is_empty() {
            return Err(RecordError::InvalidUpdate("last name"));
        }
        self.first_name.clone_from(&update.first_name);
        self.last_name.clone_from(&update.last_name);
        Ok(())
    }
}

impl IndexedRecord for Account {
    type Id = AccountId;

    fn id(&self) -> AccountId {
        self.id
    }

    fn index_fields(&self) -> Vec<&str> {
        vec![
            self.email.as_str(),
            self.user_name.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
        ]
    }
}

/// A [`PrefixIndex`] fed from record lifecycle events.
pub struct RecordIndex<R: IndexedRecord> {
    index: PrefixIndex<R::Id>,
    _marker: PhantomData<fn(&R)>,
}

impl<R: IndexedRecord> RecordIndex<R> {
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            index: PrefixIndex::with_config(config),
            _marker: PhantomData,
        }
    }

    /// The underlying index.
    pub fn index(&self) -> &PrefixIndex<R::Id> {
        &self.index
    }

    /// Replace the index contents with every key of every record.
    ///
    /// Used at startup to replay the record store. Returns the number of
    /// records loaded. On error the previous contents are kept.
    pub fn load<'a, It>(&self, records: It) -> Result<usize, RecordError>
    where
        R: 'a,
        It: IntoIterator<Item = &'a R>,
    {
        let mut count = 0usize;
        let mut entries = Vec::new();
        for record in records {
            count += 1;
            let id = record.id();
            entries.extend(index_keys(record).into_iter().map(|key| (key, id.clone())));
        }
        let indexed = self.index.rebuild(entries)?;
        info!(records = count, entries = indexed, "loaded records into prefix index");
        Ok(count)
    }

    /// Index a newly created record.
    ///
    /// If any key fails, keys already added for this call are removed again.
    pub fn on_create(&self, record: &R) -> Result<(), RecordError> {
        let id = record.id();
        let keys = index_keys(record);
        let mut added: Vec<&str> = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Err(err) = self.index.insert(key, id.clone()) {
                self.undo(&added, &id, &[], &id);
                return Err(err.into());
            }
            added.push(key);
        }
        Ok(())
    }

    /// Move the index from `old`'s keys to `new`'s keys.
    ///
    /// Only keys that actually changed are touched, so a rename deletes the
    /// old name entries and inserts the new ones. If the id changed, every
    /// key moves. On error the deletes and inserts made so far are reversed
    /// and the index is left as it was.
    pub fn on_update(&self, old: &R, new: &R) -> Result<(), RecordError> {
        let (old_id, new_id) = (old.id(), new.id());
        let old_keys = index_keys(old);
        let new_keys = index_keys(new);

        let (removed, added): (Vec<&String>, Vec<&String>) = if old_id == new_id {
            (
                old_keys.difference(&new_keys).collect(),
                new_keys.difference(&old_keys).collect(),
            )
        } else {
            (old_keys.iter().collect(), new_keys.iter().collect())
        };

        let mut deleted: Vec<&str> = Vec::with_capacity(removed.len());
        for &key in &removed {
            if let Err(err) = self.index.delete(key, &old_id) {
                self.undo(&[], &new_id, &deleted, &old_id);
                return Err(err.into());
            }
            deleted.push(key.as_str());
        }
        let mut inserted: Vec<&str> = Vec::with_capacity(added.len());
        for &key in &added {
            if let Err(err) = self.index.insert(key, new_id.clone()) {
                self.undo(&inserted, &new_id, &deleted, &old_id);
                return Err(err.into());
            }
            inserted.push(key.as_str());
        }
        debug!(removed = removed.len(), added = added.len(), "reindexed record");
        Ok(())
    }

    /// Reverse a partially applied event: drop `inserted` keys for
    /// `new_id`, then put `deleted` keys back for `old_id`.
    fn undo(&self, inserted: &[&str], new_id: &R::Id, deleted: &[&str], old_id: &R::Id) {
        // Each entry was written by this call, so reversing it only fails if
        // another writer raced on the same record.
        for key in inserted {
            let undone = self.index.delete(key, new_id);
            debug_assert!(undone.is_ok(), "rollback delete failed: {undone:?}");
        }
        for key in deleted {
            let undone = self.index.insert(key, old_id.clone());
            debug_assert!(undone.is_ok(), "rollback insert failed: {undone:?}");
        }
    }

    /// Remove every key of a deleted record.
    pub fn on_remove(&self, record: &R) -> Result<(), RecordError> {
        let id = record.id();
        for key in index_keys(record) {
            self.index.delete(&key, &id)?;
        }
        Ok(())
    }

    /// Identifiers of up to `limit` records matching `query` as a prefix.
    ///
    /// The query is normalized first. An empty query or a prefix nothing
    /// starts with yields no results.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<R::Id>, RecordError> {
        let prefix = normalize(query);
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        match self.index.query(&prefix, limit) {
            Ok(ids) => Ok(ids),
            Err(IndexError::KeyNotFound) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// [`search`](Self::search) with the configured default limit.
    pub fn search_default(&self, query: &str) -> Result<Vec<R::Id>, RecordError> {
        self.search(query, self.index.config().default_limit)
    }
}

impl<R: IndexedRecord> Default for RecordIndex<R> {
    fn default() -> Self {
        Self::new()
    }
}
