//! # radix-set
//!
//! A set of byte strings held in a compressed prefix tree (PATRICIA-style
//! radix trie).
//!
//! Chains of single-child edges are stored as one multi-byte segment per node.
//! Insertion splits a segment where a new key diverges from it; deletion fuses
//! a node with its sole remaining child again, so segments stay maximal.
//! Enumeration yields members in ascending byte order.
//!
//! ## Example
//!
//! ```rust
//! use radix_set::{RadixTrie, Removal};
//!
//! let mut trie = RadixTrie::new();
//! for word in ["cat", "car", "card", "dog"] {
//!     trie.insert(word.as_bytes()).unwrap();
//! }
//!
//! assert!(trie.lookup(b"car"));
//! assert!(!trie.lookup(b"ca"));
//! assert!(trie.matches_prefix(b"ca"));
//!
//! assert_eq!(trie.delete(b"car"), Removal::Removed);
//! let members: Vec<Vec<u8>> = trie.iter().collect();
//! assert_eq!(members, [b"card".to_vec(), b"cat".to_vec(), b"dog".to_vec()]);
//! ```
//!
//! ## Keys
//!
//! Every member is stored with a trailing terminator byte ([`TERMINATOR`],
//! zero). Keys therefore cannot contain that byte themselves; [`RadixTrie::insert`]
//! rejects them and the read-only operations treat them as absent.
//!
//! ## Allocation
//!
//! Segment storage comes from a [`SegmentAlloc`]. Insertion obtains everything
//! it needs before it relinks anything, so a failed insert leaves the trie
//! unchanged. A failed fusion during deletion is reported as
//! [`Removal::Fragmented`]: the key is gone and the trie stays valid, it just
//! keeps one node more than necessary.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod alloc;
mod config;
mod debug;
pub mod error;
mod iter;
mod node;

pub use alloc::{Budget, Heap, SegmentAlloc};
pub use config::{Config, DEFAULT_BUFFER_CAPACITY};
pub use error::{AllocError, Result, TrieError};
pub use iter::{Iter, Traversal};
pub use node::{Segment, TERMINATOR};

use std::fmt;
use std::ops::ControlFlow;

use smallvec::SmallVec;
use tracing::{debug, trace};

use node::{common_prefix, interior_terminator, key_byte, Link, Node, NodeArena, Ptr};

/// Outcome of [`RadixTrie::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Removal {
    /// The key was removed and the trie is fully compressed around it.
    Removed,
    /// The key was not a member. Nothing changed.
    NotFound,
    /// The key was removed, but merging its former parent with the remaining
    /// child could not allocate. The trie is valid and every query answers
    /// correctly; the extra node goes away on a later successful fusion or on
    /// [`RadixTrie::clear`].
    Fragmented,
}

impl Removal {
    /// Whether the key was a member before the call.
    pub fn was_removed(self) -> bool {
        !matches!(self, Removal::NotFound)
    }
}

// =============================================================================
// RadixTrie
// =============================================================================

/// A sorted set of byte strings stored as a compressed prefix tree.
///
/// Each node holds a byte segment, a link to its next sibling and a link to
/// the head of its child chain. Sibling chains are sorted by leading byte and
/// no two siblings share one. A node whose segment ends in [`TERMINATOR`]
/// closes a member and never has children.
#[derive(Clone)]
pub struct RadixTrie<A = Heap> {
    nodes: NodeArena,
    root: Ptr,
    len: usize,
    alloc: A,
    config: Config,
}

impl RadixTrie<Heap> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_config_in(config, Heap)
    }
}

impl Default for RadixTrie<Heap> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: SegmentAlloc> RadixTrie<A> {
    /// Empty trie drawing segment storage from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self::with_config_in(Config::default(), alloc)
    }

    pub fn with_config_in(config: Config, alloc: A) -> Self {
        Self {
            nodes: NodeArena::with_capacity(config.initial_nodes),
            root: Ptr::NULL,
            len: 0,
            alloc,
            config,
        }
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_null()
    }

    /// Number of nodes currently making up the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.live()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.alloc
    }

    /// Add `key`. Returns `true` if it was not already a member.
    ///
    /// On error the trie is exactly as it was before the call.
    pub fn insert(&mut self, key: &[u8]) -> Result<bool> {
        if let Some(position) = interior_terminator(key) {
            return Err(TrieError::InteriorTerminator { position });
        }

        let mut link = Link::Root;
        let mut rest = key;
        loop {
            let lead = key_byte(rest, 0);
            link = self.locate(link, lead);
            let ptr = self.link(link);
            if ptr.is_null() || self.nodes[ptr].lead() > lead {
                self.splice_leaf(link, rest).map_err(|err| {
                    debug!(%err, key_len = key.len(), "leaf allocation failed");
                    err
                })?;
                break;
            }

            let node = &self.nodes[ptr];
            let diff = common_prefix(&node.segment, rest);
            if diff == node.len() {
                link = Link::Child(ptr);
                rest = &rest[diff..];
                continue;
            }
            if node.segment[diff] == key_byte(rest, diff) {
                // Both sides reached a terminator at the same offset.
                return Ok(false);
            }
            self.split(link, diff, &rest[diff..]).map_err(|err| {
                debug!(%err, key_len = key.len(), "split allocation failed");
                err
            })?;
            break;
        }

        self.len += 1;
        Ok(true)
    }

    /// Insert every key from `keys`, stopping at the first error.
    ///
    /// Returns how many keys were newly added.
    pub fn try_extend<I, K>(&mut self, keys: I) -> Result<usize>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut added = 0;
        for key in keys {
            if self.insert(key.as_ref())? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Whether `key` is a member.
    pub fn lookup(&self, key: &[u8]) -> bool {
        if interior_terminator(key).is_some() {
            return false;
        }

        let mut ptr = self.root;
        let mut rest = key;
        loop {
            ptr = self.find(ptr, key_byte(rest, 0));
            if ptr.is_null() {
                return false;
            }
            let node = &self.nodes[ptr];
            let diff = common_prefix(&node.segment, rest);
            if diff < node.len() {
                return node.segment[diff] == key_byte(rest, diff);
            }
            ptr = node.child;
            rest = &rest[diff..];
        }
    }

    /// Alias for [`RadixTrie::lookup`].
    #[inline]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.lookup(key)
    }

    /// Whether at least one member starts with `prefix`.
    ///
    /// The empty prefix matches any non-empty trie.
    pub fn matches_prefix(&self, prefix: &[u8]) -> bool {
        if interior_terminator(prefix).is_some() {
            return false;
        }

        let mut ptr = self.root;
        let mut rest = prefix;
        loop {
            ptr = self.find(ptr, key_byte(rest, 0));
            if ptr.is_null() {
                return false;
            }
            let node = &self.nodes[ptr];
            let diff = common_prefix(&node.segment, rest);
            if diff < node.len() {
                return diff == rest.len();
            }
            rest = &rest[diff..];
            if rest.is_empty() {
                return true;
            }
            ptr = node.child;
        }
    }

    /// Remove `key`, merging its former parent with a sole remaining child.
    pub fn delete(&mut self, key: &[u8]) -> Removal {
        if interior_terminator(key).is_some() {
            return Removal::NotFound;
        }

        // `cut` is the link to unhook if the node at the current level goes,
        // `anchor` the node to fuse afterwards. A node that is the only member
        // of its parent's child chain takes the parent down with it, so those
        // two stay at the level above.
        let mut link = Link::Root;
        let mut parent = Ptr::NULL;
        let mut cut = Link::Root;
        let mut anchor = Ptr::NULL;
        let mut rest = key;
        loop {
            let lead = key_byte(rest, 0);
            link = self.locate(link, lead);
            let ptr = self.link(link);
            if ptr.is_null() {
                return Removal::NotFound;
            }

            let node = &self.nodes[ptr];
            let only_child =
                !parent.is_null() && self.nodes[parent].child == ptr && node.sibling.is_null();
            if !only_child {
                cut = link;
                anchor = parent;
            }

            let diff = common_prefix(&node.segment, rest);
            if diff == node.len() {
                parent = ptr;
                link = Link::Child(ptr);
                rest = &rest[diff..];
                continue;
            }
            if node.segment[diff] != key_byte(rest, diff) {
                return Removal::NotFound;
            }
            break;
        }

        let pruned = self.unhook(cut);
        self.len -= 1;
        if pruned > 1 {
            debug!(ancestors = pruned - 1, "pruned childless ancestors");
        }

        if anchor.is_null() {
            return Removal::Removed;
        }
        match self.fuse(anchor) {
            Ok(()) => Removal::Removed,
            Err(err) => {
                debug!(%err, "fusion failed, leaving fragmented node");
                Removal::Fragmented
            }
        }
    }

    /// Remove every member, releasing all node storage.
    pub fn clear(&mut self) {
        for segment in self.nodes.drain() {
            self.alloc.release(segment);
        }
        self.root = Ptr::NULL;
        self.len = 0;
    }

    /// Visit every member in ascending order until `visit` breaks.
    ///
    /// Members are rebuilt in a buffer of [`Config::buffer_capacity`] bytes;
    /// longer ones reach the visitor truncated.
    pub fn foreach<F>(&self, visit: F) -> Traversal
    where
        F: FnMut(&[u8]) -> ControlFlow<()>,
    {
        let mut buf: SmallVec<[u8; DEFAULT_BUFFER_CAPACITY]> =
            SmallVec::from_elem(0, self.config.buffer_capacity);
        iter::for_each_member(&self.nodes, self.root, &mut buf, visit)
    }

    /// Like [`RadixTrie::foreach`], rebuilding members in `buf`.
    ///
    /// `buf.len()` is the capacity, terminator included: a member longer than
    /// `buf.len() - 1` bytes is cut to that length, and an empty buffer visits
    /// nothing.
    pub fn foreach_in<F>(&self, buf: &mut [u8], visit: F) -> Traversal
    where
        F: FnMut(&[u8]) -> ControlFlow<()>,
    {
        iter::for_each_member(&self.nodes, self.root, buf, visit)
    }

    /// Iterate members in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.nodes, self.root, self.len)
    }
}

// =============================================================================
// Structural helpers
// =============================================================================

impl<A: SegmentAlloc> RadixTrie<A> {
    #[inline]
    fn link(&self, link: Link) -> Ptr {
        match link {
            Link::Root => self.root,
            Link::Child(ptr) => self.nodes[ptr].child,
            Link::Sibling(ptr) => self.nodes[ptr].sibling,
        }
    }

    #[inline]
    fn set_link(&mut self, link: Link, to: Ptr) {
        match link {
            Link::Root => self.root = to,
            Link::Child(ptr) => self.nodes[ptr].child = to,
            Link::Sibling(ptr) => self.nodes[ptr].sibling = to,
        }
    }

    /// Link within the chain starting at `head` that holds the first node whose
    /// leading byte is not below `byte`: the match, or where it would go.
    fn locate(&self, head: Link, byte: u8) -> Link {
        let mut link = head;
        loop {
            let ptr = self.link(link);
            if ptr.is_null() || self.nodes[ptr].lead() >= byte {
                return link;
            }
            link = Link::Sibling(ptr);
        }
    }

    /// Read-only form of [`RadixTrie::locate`].
    fn find(&self, mut ptr: Ptr, byte: u8) -> Ptr {
        while !ptr.is_null() && self.nodes[ptr].lead() < byte {
            ptr = self.nodes[ptr].sibling;
        }
        ptr
    }

    fn leaf_segment(&mut self, suffix: &[u8]) -> std::result::Result<Segment, AllocError> {
        let mut segment = self.alloc.allocate(suffix.len() + 1)?;
        segment.extend_from_slice(suffix);
        segment.push(TERMINATOR);
        Ok(segment)
    }

    /// Put a terminal node for `suffix` at `link`, ahead of whatever it held.
    fn splice_leaf(&mut self, link: Link, suffix: &[u8]) -> Result<()> {
        self.nodes.reserve(1)?;
        let segment = self.leaf_segment(suffix)?;
        let next = self.link(link);
        let leaf = self.nodes.insert(Node::new(segment, next, Ptr::NULL));
        self.set_link(link, leaf);
        Ok(())
    }

    /// Split the node at `link` after `diff` bytes and branch off a leaf for
    /// `suffix`.
    ///
    /// The leading bytes move to a new prefix node that takes over the old
    /// node's place and sibling link. The old node keeps the remainder and its
    /// child chain and becomes a child of the prefix next to the new leaf.
    fn split(&mut self, link: Link, diff: usize, suffix: &[u8]) -> Result<()> {
        debug_assert!(diff > 0);
        let old = self.link(link);

        self.nodes.reserve(2)?;
        let mut prefix = self.alloc.allocate(diff)?;
        prefix.extend_from_slice(&self.nodes[old].segment[..diff]);
        let leaf = match self.leaf_segment(suffix) {
            Ok(leaf) => leaf,
            Err(err) => {
                self.alloc.release(prefix);
                return Err(err.into());
            }
        };

        let mut remainder = std::mem::take(&mut self.nodes[old].segment);
        self.alloc.trim_front(&mut remainder, diff);
        let old_lead = remainder[0];
        let leaf_lead = leaf[0];
        self.nodes[old].segment = remainder;
        let sibling = std::mem::replace(&mut self.nodes[old].sibling, Ptr::NULL);

        let leaf = self.nodes.insert(Node::new(leaf, Ptr::NULL, Ptr::NULL));
        let head = if leaf_lead < old_lead {
            self.nodes[leaf].sibling = old;
            leaf
        } else {
            self.nodes[old].sibling = leaf;
            old
        };
        let prefix = self.nodes.insert(Node::new(prefix, sibling, head));
        self.set_link(link, prefix);

        trace!(at = diff, "split node");
        Ok(())
    }

    /// Detach the node at `link` from its chain and free it together with the
    /// single-child path below it. Returns the number of nodes freed.
    fn unhook(&mut self, link: Link) -> usize {
        let mut doomed = self.link(link);
        let next = self.nodes[doomed].sibling;
        self.set_link(link, next);

        let mut freed = 0;
        while !doomed.is_null() {
            debug_assert!(freed == 0 || self.nodes[doomed].sibling.is_null());
            let below = self.nodes[doomed].child;
            let segment = self.nodes.remove(doomed);
            self.alloc.release(segment);
            doomed = below;
            freed += 1;
        }
        freed
    }

    /// Merge `parent` with its child if that child has no siblings.
    fn fuse(&mut self, parent: Ptr) -> std::result::Result<(), AllocError> {
        let child = self.nodes[parent].child;
        if child.is_null() || !self.nodes[child].sibling.is_null() {
            return Ok(());
        }

        let extra = self.nodes[child].len();
        self.alloc.grow(&mut self.nodes[parent].segment, extra)?;

        let grandchild = self.nodes[child].child;
        let absorbed = self.nodes.remove(child);
        let merged = &mut self.nodes[parent];
        merged.segment.extend_from_slice(&absorbed);
        merged.child = grandchild;
        self.alloc.release(absorbed);

        trace!(len = self.nodes[parent].len(), "fused node with sole child");
        Ok(())
    }
}

impl<A: SegmentAlloc> fmt::Debug for RadixTrie<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.iter().map(|key| String::from_utf8_lossy(&key).into_owned()))
            .finish()
    }
}

impl<'a, A: SegmentAlloc> IntoIterator for &'a RadixTrie<A> {
    type Item = Vec<u8>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}


#[cfg(test)]
mod proptests;
