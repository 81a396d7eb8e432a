//! Tunables for a [`RadixTrie`](crate::RadixTrie).

/// Reconstruction buffer size used by [`RadixTrie::foreach`](crate::RadixTrie::foreach)
/// unless configured otherwise. Counts the terminator, so members longer than
/// `DEFAULT_BUFFER_CAPACITY - 1` bytes reach the visitor truncated.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Configuration for a [`RadixTrie`](crate::RadixTrie).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Reconstruction buffer size for `foreach`, terminator included. Zero
    /// makes `foreach` visit nothing.
    pub buffer_capacity: usize,
    /// Node slots to reserve up front.
    pub initial_nodes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            initial_nodes: 0,
        }
    }
}
