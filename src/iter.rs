//! Sorted enumeration of members.
//!
//! Both walks visit a node's child chain before its sibling chain. Chains are
//! ordered by leading byte, so members come out in ascending byte order.

use std::iter::FusedIterator;
use std::ops::ControlFlow;

use crate::node::{NodeArena, Ptr};

/// How a [`foreach`](crate::RadixTrie::foreach) walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Traversal {
    /// Every member was visited.
    Completed,
    /// The visitor asked to stop; no node was visited after that.
    Stopped,
}

impl Traversal {
    pub fn is_stopped(self) -> bool {
        self == Traversal::Stopped
    }
}

/// Reconstruct members into `buf` and hand each to `visit`.
///
/// `buf.len()` bounds the reconstruction, terminator included: a member that
/// does not fit reaches the visitor cut to `buf.len() - 1` bytes.
pub(crate) fn for_each_member<F>(nodes: &NodeArena, root: Ptr, buf: &mut [u8], mut visit: F) -> Traversal
where
    F: FnMut(&[u8]) -> ControlFlow<()>,
{
    let capacity = buf.len();
    if capacity == 0 {
        return Traversal::Completed;
    }

    let mut stack: Vec<(Ptr, usize)> = vec![(root, 0)];
    while let Some((ptr, offset)) = stack.pop() {
        if ptr.is_null() {
            continue;
        }
        let node = &nodes[ptr];

        let take = capacity.saturating_sub(offset).min(node.len());
        if take > 0 {
            buf[offset..offset + take].copy_from_slice(&node.segment[..take]);
        }

        if node.is_terminal() {
            let end = (offset + node.len() - 1).min(capacity - 1);
            if visit(&buf[..end]).is_break() {
                return Traversal::Stopped;
            }
        }

        stack.push((node.sibling, offset));
        stack.push((node.child, offset + node.len()));
    }
    Traversal::Completed
}

/// Lazy iterator over members in ascending order.
///
/// Yields full keys without the terminator; nothing is truncated.
pub struct Iter<'a> {
    nodes: &'a NodeArena,
    stack: Vec<(Ptr, usize)>,
    path: Vec<u8>,
    remaining: usize,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(nodes: &'a NodeArena, root: Ptr, len: usize) -> Self {
        let mut stack = Vec::new();
        if !root.is_null() {
            stack.push((root, 0));
        }
        Self {
            nodes,
            stack,
            path: Vec::new(),
            remaining: len,
        }
    }
}

impl Iterator for Iter<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((ptr, depth)) = self.stack.pop() {
            let node = &self.nodes[ptr];
            self.path.truncate(depth);
            self.path.extend_from_slice(&node.segment);

            if !node.sibling.is_null() {
                self.stack.push((node.sibling, depth));
            }
            if !node.child.is_null() {
                self.stack.push((node.child, self.path.len()));
            }

            if node.is_terminal() {
                self.remaining = self.remaining.saturating_sub(1);
                return Some(self.path[..self.path.len() - 1].to_vec());
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
