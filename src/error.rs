//! Error types returned by the index.

use thiserror::Error;

/// Failure of a single index operation.
///
/// Every variant is local and recoverable: the tree is left exactly as it
/// was before the failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    /// No path in the tree corresponds to the requested key or prefix.
    #[error("key not found in index")]
    KeyNotFound,
    /// The key path exists but the identifier is not recorded there.
    #[error("value not found under key")]
    ValueNotFound,
    /// The identifier is already recorded under that exact key.
    #[error("value is already present under key")]
    DuplicateValue,
    /// Insert and delete require a non-empty key.
    #[error("key length is zero")]
    EmptyKey,
}

/// Result alias used throughout the crate.
pub type Result<T, E = IndexError> = std::result::Result<T, E>;
