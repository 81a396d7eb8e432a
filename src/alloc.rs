//! Segment allocation.
//!
//! Every node segment is obtained from a [`SegmentAlloc`]. The trie requests
//! storage before it changes any links, so a refused request leaves the
//! structure exactly as it was.

use crate::error::AllocError;
use crate::node::Segment;

/// Source of segment storage for a [`RadixTrie`](crate::RadixTrie).
///
/// Implementations either satisfy a request or return [`AllocError`] without
/// touching the segment they were handed.
pub trait SegmentAlloc {
    /// Return an empty segment with room for at least `len` bytes.
    fn allocate(&mut self, len: usize) -> Result<Segment, AllocError>;

    /// Make room for `additional` more bytes at the end of `segment`.
    fn grow(&mut self, segment: &mut Segment, additional: usize) -> Result<(), AllocError>;

    /// Drop the first `count` bytes of `segment`. Shrinking cannot fail.
    fn trim_front(&mut self, segment: &mut Segment, count: usize) {
        segment.drain(..count);
    }

    /// Give `segment` back.
    fn release(&mut self, segment: Segment) {
        drop(segment);
    }
}

/// Global-heap allocation with fallible reservation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Heap;

impl SegmentAlloc for Heap {
    fn allocate(&mut self, len: usize) -> Result<Segment, AllocError> {
        let mut segment = Segment::new();
        segment
            .try_reserve_exact(len)
            .map_err(|_| AllocError { requested: len })?;
        Ok(segment)
    }

    fn grow(&mut self, segment: &mut Segment, additional: usize) -> Result<(), AllocError> {
        segment
            .try_reserve_exact(additional)
            .map_err(|_| AllocError {
                requested: segment.len() + additional,
            })
    }
}

/// Caps the number of live segment bytes.
///
/// Requests that would push the total past the limit are refused. The limit
/// can be moved at any time; lowering it below what is already live only
/// affects later requests.
#[derive(Clone, Debug)]
pub struct Budget<A = Heap> {
    inner: A,
    limit: usize,
    live: usize,
}

impl Budget<Heap> {
    /// Budget of `limit` bytes on the global heap.
    pub fn new(limit: usize) -> Self {
        Self::with_inner(limit, Heap)
    }

    /// Budget that never refuses.
    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }
}

impl<A: SegmentAlloc> Budget<A> {
    /// Budget of `limit` bytes drawing from `inner`.
    pub fn with_inner(limit: usize, inner: A) -> Self {
        Self {
            inner,
            limit,
            live: 0,
        }
    }

    /// Bytes currently held by segments.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    fn admit(&self, len: usize) -> Result<(), AllocError> {
        match self.live.checked_add(len) {
            Some(total) if total <= self.limit => Ok(()),
            _ => Err(AllocError { requested: len }),
        }
    }
}

impl<A: SegmentAlloc> SegmentAlloc for Budget<A> {
    fn allocate(&mut self, len: usize) -> Result<Segment, AllocError> {
        self.admit(len)?;
        let segment = self.inner.allocate(len)?;
        self.live += len;
        Ok(segment)
    }

    fn grow(&mut self, segment: &mut Segment, additional: usize) -> Result<(), AllocError> {
        self.admit(additional)?;
        self.inner.grow(segment, additional)?;
        self.live += additional;
        Ok(())
    }

    fn trim_front(&mut self, segment: &mut Segment, count: usize) {
        self.live = self.live.saturating_sub(count);
        self.inner.trim_front(segment, count);
    }

    fn release(&mut self, segment: Segment) {
        self.live = self.live.saturating_sub(segment.len());
        self.inner.release(segment);
    }
}
