//! Reference-counted buffer handles.
//!
//! A pool hands the producer a [`BufferLease`]: a unique, writable hold on
//! one buffer. Once the payload is written, [`BufferLease::into_ref`] seals
//! it into a [`BufferRef`]: the shared, read-only handle consumers keep.
//!
//! Holder accounting is structural. [`BufferRef::link`] (or `clone`) adds a
//! holder, dropping a handle removes one, and the backing storage goes back
//! to its pool exactly when the last holder is gone. Double release and
//! negative holder counts cannot be expressed; releasing a buffer after its
//! pool (or the session that produced it) is gone is legal and simply frees
//! the storage.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};

/// A payload type that can be recycled through a pool.
pub trait Pooled {
    /// Reset per-use metadata before the storage is handed out again.
    fn reset(&mut self);
}

impl Pooled for crate::picture::Picture {
    fn reset(&mut self) {
        self.clear_meta();
    }
}

impl Pooled for crate::audio::AudioBuffer {
    fn reset(&mut self) {
        self.clear_meta();
    }
}

impl Pooled for crate::subpicture::Subpicture {
    fn reset(&mut self) {
        self.clear_meta();
    }
}

/// Shared pool bookkeeping: recycled storage plus live-buffer accounting.
pub(crate) struct Shelf<T> {
    /// Idle buffers ready for reuse.
    pub idle: VecDeque<T>,
    /// Buffers currently out (leased or referenced).
    pub live: usize,
    /// Cap on `idle`; reclaimed storage beyond it is dropped.
    pub max_idle: usize,
    /// Bumped on every format change; stale-generation storage is not
    /// recycled.
    pub generation: u64,
    /// Cap on `live`; `None` means unbounded.
    pub limit: Option<usize>,
    /// Buffers ever allocated, for statistics.
    pub total_allocated: usize,
}

impl<T> Shelf<T> {
    pub(crate) fn new(max_idle: usize) -> Self {
        Self {
            idle: VecDeque::with_capacity(max_idle),
            live: 0,
            max_idle,
            generation: 0,
            limit: None,
            total_allocated: 0,
        }
    }
}

pub(crate) type SharedShelf<T> = Arc<Mutex<Shelf<T>>>;

/// Return a payload to its shelf, or drop it if the shelf is gone, full, or
/// the pool has since been reconfigured.
fn reclaim<T: Pooled>(home: &Weak<Mutex<Shelf<T>>>, mut payload: T, generation: u64) {
    if let Some(shelf) = home.upgrade() {
        let mut shelf = shelf.lock();
        shelf.live -= 1;
        if shelf.generation == generation && shelf.idle.len() < shelf.max_idle {
            payload.reset();
            shelf.idle.push_back(payload);
        }
    }
}

/// The producer's unique, writable hold on a pool buffer.
///
/// Dropping a lease without sealing it returns the storage unused (a decoder
/// that acquired a buffer and then hit corrupt input).
pub struct BufferLease<T: Pooled> {
    payload: Option<T>,
    generation: u64,
    home: Weak<Mutex<Shelf<T>>>,
}

impl<T: Pooled> BufferLease<T> {
    pub(crate) fn new_pooled(payload: T, generation: u64, home: Weak<Mutex<Shelf<T>>>) -> Self {
        Self {
            payload: Some(payload),
            generation,
            home,
        }
    }

    /// Create a lease with no backing pool; the payload is simply dropped
    /// on final release.
    pub fn detached(payload: T) -> Self {
        Self {
            payload: Some(payload),
            generation: 0,
            home: Weak::new(),
        }
    }

    /// Seal the written payload into a shared, read-only handle.
    ///
    /// The returned handle is the one producer hold the contract speaks of.
    pub fn into_ref(mut self) -> BufferRef<T> {
        BufferRef {
            slot: Arc::new(Slot {
                payload: self.payload.take(),
                generation: self.generation,
                home: std::mem::replace(&mut self.home, Weak::new()),
            }),
        }
    }
}

impl<T: Pooled> Deref for BufferLease<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.payload
            .as_ref()
            .expect("lease payload present until drop")
    }
}

impl<T: Pooled> DerefMut for BufferLease<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.payload
            .as_mut()
            .expect("lease payload present until drop")
    }
}

impl<T: Pooled> Drop for BufferLease<T> {
    fn drop(&mut self) {
        if let Some(payload) = self.payload.take() {
            reclaim(&self.home, payload, self.generation);
        }
    }
}

struct Slot<T: Pooled> {
    payload: Option<T>,
    generation: u64,
    home: Weak<Mutex<Shelf<T>>>,
}

impl<T: Pooled> Drop for Slot<T> {
    fn drop(&mut self) {
        if let Some(payload) = self.payload.take() {
            reclaim(&self.home, payload, self.generation);
        }
    }
}

/// A shared, read-only handle to a produced buffer.
///
/// Cloning ([`BufferRef::link`]) adds a holder; dropping removes one. The
/// backing storage is reclaimed exactly once, when the holder count reaches
/// zero.
pub struct BufferRef<T: Pooled> {
    slot: Arc<Slot<T>>,
}

impl<T: Pooled> BufferRef<T> {
    /// Create a handle with no backing pool.
    pub fn detached(payload: T) -> Self {
        BufferLease::detached(payload).into_ref()
    }

    /// Add a holder.
    #[must_use = "the linked handle is the new hold; dropping it immediately unlinks"]
    pub fn link(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Current holder count.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.slot)
    }
}

impl<T: Pooled> Clone for BufferRef<T> {
    fn clone(&self) -> Self {
        self.link()
    }
}

impl<T: Pooled> Deref for BufferRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.slot
            .payload
            .as_ref()
            .expect("buffer payload present until final release")
    }
}

impl<T: Pooled + fmt::Debug> fmt::Debug for BufferRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferRef")
            .field("holders", &self.holders())
            .field("payload", &**self)
            .finish()
    }
}
