//! Error types for trie mutation.

use thiserror::Error;

/// A segment or node allocation could not be satisfied.
///
/// The structure that requested it is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("allocation of {requested} bytes failed")]
pub struct AllocError {
    /// Number of bytes that were requested.
    pub requested: usize,
}

/// Errors reported by [`RadixTrie::insert`](crate::RadixTrie::insert).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrieError {
    /// Creating a leaf or splitting a node ran out of memory.
    #[error(transparent)]
    Alloc(#[from] AllocError),

    /// The key holds the terminator byte before its end and cannot be stored.
    #[error("key contains a terminator byte at offset {position}")]
    InteriorTerminator {
        /// Offset of the first terminator byte in the key.
        position: usize,
    },
}

/// Result alias for trie operations.
pub type Result<T> = std::result::Result<T, TrieError>;
