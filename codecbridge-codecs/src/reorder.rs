//! Presentation-order output window for reordering codecs.

use codecbridge_core::Timestamp;

/// Upper bound on how many inputs a module may accept before emitting the
/// output for an earlier one. Modules needing deeper reordering are out of
/// contract; hosts may size queues against this bound.
pub const MAX_REORDER_DEPTH: usize = 16;

/// A fixed-depth window that re-sorts decoded items into presentation
/// order.
///
/// Decoders fed in coding order (B-frames arrive after the frames they
/// depend on) push each item with its pts; once the window is full, the
/// earliest item pops out. Flushing drains the remainder in order.
pub struct ReorderBuffer<T> {
    /// Pending items, kept sorted by pts ascending.
    pending: Vec<(Timestamp, T)>,
    /// Window depth; 0 disables reordering (pass-through).
    depth: usize,
}

impl<T> ReorderBuffer<T> {
    /// Create a window of the given depth.
    ///
    /// # Panics
    ///
    /// Panics if `depth` exceeds [`MAX_REORDER_DEPTH`].
    pub fn new(depth: usize) -> Self {
        assert!(
            depth <= MAX_REORDER_DEPTH,
            "reorder depth {} exceeds contract maximum {}",
            depth,
            MAX_REORDER_DEPTH
        );
        Self {
            pending: Vec::with_capacity(depth + 1),
            depth,
        }
    }

    /// Insert an item; returns the earliest pending item once the window
    /// is full.
    pub fn push(&mut self, pts: Timestamp, item: T) -> Option<T> {
        let at = self
            .pending
            .partition_point(|(pending_pts, _)| *pending_pts <= pts);
        self.pending.insert(at, (pts, item));
        if self.pending.len() > self.depth {
            Some(self.pending.remove(0).1)
        } else {
            None
        }
    }

    /// Drain all pending items in presentation order.
    pub fn drain(&mut self) -> Vec<T> {
        self.pending.drain(..).map(|(_, item)| item).collect()
    }

    /// Items currently buffered.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
