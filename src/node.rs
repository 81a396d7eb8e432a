//! Node model: byte segments linked into sibling and child chains.
//!
//! Nodes live in a [`NodeArena`] and refer to each other through [`Ptr`]
//! indices. A node owns its child chain and the rest of its sibling chain;
//! nothing else points into either.

use std::ops::{Index, IndexMut};

use smallvec::SmallVec;

use crate::error::AllocError;

/// Byte closing the segment of a terminal node.
pub const TERMINATOR: u8 = 0;

/// Segment bytes stored inline before spilling to the heap.
pub const INLINE_SEGMENT: usize = 16;

/// The bytes of one compressed edge.
pub type Segment = SmallVec<[u8; INLINE_SEGMENT]>;

/// Byte `i` of `key`, reading the implicit terminator at `key.len()`.
#[inline]
pub(crate) fn key_byte(key: &[u8], i: usize) -> u8 {
    key.get(i).copied().unwrap_or(TERMINATOR)
}

/// Offset of the first terminator byte inside `key`, if any.
#[inline]
pub(crate) fn interior_terminator(key: &[u8]) -> Option<usize> {
    key.iter().position(|&b| b == TERMINATOR)
}

/// Number of leading bytes `segment` and `key` agree on.
///
/// Stops at the end of the segment, at the end of the key (where its
/// terminator would sit) or at the first mismatch, whichever comes first. The
/// result never exceeds `key.len()`, so `key_byte(key, result)` is always the
/// byte the caller should compare against `segment[result]`.
#[inline]
pub(crate) fn common_prefix(segment: &[u8], key: &[u8]) -> usize {
    segment
        .iter()
        .zip(key)
        .take_while(|(a, b)| a == b)
        .count()
}

// =============================================================================
// Pointer type
// =============================================================================

/// Index of a node slot in the arena.
///
/// `Ptr::NULL` marks an absent sibling, child or root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ptr(u32);

impl Ptr {
    pub(crate) const NULL: Ptr = Ptr(u32::MAX);

    #[inline]
    pub(crate) fn is_null(self) -> bool {
        self == Self::NULL
    }

    #[inline]
    fn idx(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize
    }
}

impl Default for Ptr {
    fn default() -> Self {
        Self::NULL
    }
}

/// Where a pointer to a chain member is stored.
///
/// The insertion and deletion walks hold one of these instead of a mutable
/// borrow into the arena, so the slot can be rewritten after the nodes around
/// it change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Link {
    /// The trie's root pointer.
    Root,
    /// The `child` field of a node.
    Child(Ptr),
    /// The `sibling` field of a node.
    Sibling(Ptr),
}

// =============================================================================
// Node
// =============================================================================

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) segment: Segment,
    pub(crate) sibling: Ptr,
    pub(crate) child: Ptr,
}

impl Node {
    pub(crate) fn new(segment: Segment, sibling: Ptr, child: Ptr) -> Self {
        Self {
            segment,
            sibling,
            child,
        }
    }

    /// Leading byte; chains are ordered by it.
    #[inline]
    pub(crate) fn lead(&self) -> u8 {
        self.segment[0]
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.segment.len()
    }

    /// Whether this node closes a member of the set.
    #[inline]
    pub(crate) fn is_terminal(&self) -> bool {
        self.segment.last() == Some(&TERMINATOR)
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Slot storage for nodes, with an intrusive free list.
///
/// A freed slot keeps an empty segment and threads the free list through its
/// `sibling` field, so releasing a node never allocates.
#[derive(Clone, Debug, Default)]
pub(crate) struct NodeArena {
    slots: Vec<Node>,
    free_head: Ptr,
    free_len: usize,
}

impl NodeArena {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: Ptr::NULL,
            free_len: 0,
        }
    }

    /// Number of nodes currently in use.
    #[inline]
    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free_len
    }

    #[inline]
    pub(crate) fn free_len(&self) -> usize {
        self.free_len
    }

    /// Make room for `additional` nodes so that the next `additional` calls to
    /// [`NodeArena::insert`] cannot fail.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        let fresh = additional.saturating_sub(self.free_len);
        if fresh == 0 {
            return Ok(());
        }
        let err = AllocError {
            requested: fresh * std::mem::size_of::<Node>(),
        };
        if self.slots.len() + fresh >= Ptr::NULL.0 as usize {
            return Err(err);
        }
        self.slots.try_reserve(fresh).map_err(|_| err)
    }

    /// Store `node` in a free slot. Call [`NodeArena::reserve`] first.
    pub(crate) fn insert(&mut self, node: Node) -> Ptr {
        if self.free_head.is_null() {
            let ptr = Ptr(self.slots.len() as u32);
            self.slots.push(node);
            return ptr;
        }
        let ptr = self.free_head;
        self.free_head = self.slots[ptr.idx()].sibling;
        self.free_len -= 1;
        self.slots[ptr.idx()] = node;
        ptr
    }

    /// Take the segment out of `ptr` and return its slot to the free list.
    pub(crate) fn remove(&mut self, ptr: Ptr) -> Segment {
        let slot = &mut self.slots[ptr.idx()];
        let segment = std::mem::take(&mut slot.segment);
        slot.child = Ptr::NULL;
        slot.sibling = self.free_head;
        self.free_head = ptr;
        self.free_len += 1;
        segment
    }

    /// Remove every node, yielding their segments.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Segment> + '_ {
        self.free_head = Ptr::NULL;
        self.free_len = 0;
        self.slots.drain(..).map(|node| node.segment)
    }

    /// Walk the free list, returning its length.
    pub(crate) fn count_free_list(&self) -> usize {
        let mut n = 0;
        let mut ptr = self.free_head;
        while !ptr.is_null() && n <= self.slots.len() {
            n += 1;
            ptr = self.slots[ptr.idx()].sibling;
        }
        n
    }
}

impl Index<Ptr> for NodeArena {
    type Output = Node;

    #[inline]
    fn index(&self, ptr: Ptr) -> &Node {
        &self.slots[ptr.idx()]
    }
}

impl IndexMut<Ptr> for NodeArena {
    #[inline]
    fn index_mut(&mut self, ptr: Ptr) -> &mut Node {
        &mut self.slots[ptr.idx()]
    }
}
