//! Host-owned buffer pools behind the acquisition contract.
//!
//! Pools are pure allocation indirection: they never look at payload
//! contents, and the acquiring module never sees allocation policy. Each
//! pool is a cloneable handle around shared state and is safe to call from
//! multiple producer threads while consumer threads drop [`BufferRef`]s.
//!
//! `acquire` returning `None` is a synchronous backpressure signal (pool
//! exhausted, or the output format is not negotiated yet); the caller
//! decides whether to retry after advancing state, block, or drop. It is
//! never an error and nothing is retried internally.

use crate::audio::AudioBuffer;
use crate::format::{AudioParams, VideoParams};
use crate::handle::{BufferLease, Shelf, SharedShelf};
use crate::picture::Picture;
use crate::subpicture::Subpicture;
use parking_lot::Mutex;
use std::sync::Arc;

#[cfg(doc)]
use crate::handle::BufferRef;

/// Default cap on recycled buffers kept idle per pool.
const DEFAULT_MAX_IDLE: usize = 8;

/// A pool of decoded picture buffers, sized by the negotiated output format.
pub struct PicturePool {
    shelf: SharedShelf<Picture>,
    format: Arc<Mutex<VideoParams>>,
}

impl PicturePool {
    /// Create a pool for the given output format.
    ///
    /// The format may still be incomplete; `acquire` returns `None` until it
    /// is completed via [`PicturePool::set_format`].
    pub fn new(format: VideoParams) -> Self {
        Self {
            shelf: Arc::new(Mutex::new(Shelf::new(DEFAULT_MAX_IDLE))),
            format: Arc::new(Mutex::new(format)),
        }
    }

    /// Cap the number of live buffers; an at-limit pool refuses acquisition.
    pub fn with_live_limit(self, limit: usize) -> Self {
        self.shelf.lock().limit = Some(limit);
        self
    }

    /// Replace the negotiated format.
    ///
    /// Idle storage for the previous format is dropped and outstanding
    /// buffers will not be recycled when released.
    pub fn set_format(&self, format: VideoParams) {
        let mut shelf = self.shelf.lock();
        shelf.generation += 1;
        shelf.idle.clear();
        *self.format.lock() = format;
    }

    /// The currently negotiated format.
    pub fn format(&self) -> VideoParams {
        *self.format.lock()
    }

    /// Acquire a writable picture buffer.
    ///
    /// Returns `None` when the format is not yet complete or the live limit
    /// is reached.
    pub fn acquire(&self) -> Option<BufferLease<Picture>> {
        let params = *self.format.lock();
        let pixel_format = params.pixel_format?;
        if !params.is_complete() {
            return None;
        }

        let mut shelf = self.shelf.lock();
        let picture = if let Some(p) = shelf.idle.pop_front() {
            p
        } else {
            if let Some(limit) = shelf.limit {
                if shelf.live >= limit {
                    return None;
                }
            }
            shelf.total_allocated += 1;
            Picture::new(params.width, params.height, pixel_format)
        };
        shelf.live += 1;
        Some(BufferLease::new_pooled(
            picture,
            shelf.generation,
            Arc::downgrade(&self.shelf),
        ))
    }

    /// Buffers currently out (leased or referenced).
    pub fn live(&self) -> usize {
        self.shelf.lock().live
    }

    /// Recycled buffers ready for reuse.
    pub fn idle(&self) -> usize {
        self.shelf.lock().idle.len()
    }

    /// Buffers ever allocated.
    pub fn total_allocated(&self) -> usize {
        self.shelf.lock().total_allocated
    }
}

impl Clone for PicturePool {
    fn clone(&self) -> Self {
        Self {
            shelf: Arc::clone(&self.shelf),
            format: Arc::clone(&self.format),
        }
    }
}

/// A pool of decoded audio buffers with per-acquisition byte sizing.
pub struct AudioPool {
    shelf: SharedShelf<AudioBuffer>,
    format: Arc<Mutex<AudioParams>>,
}

impl AudioPool {
    /// Create a pool for the given output format.
    pub fn new(format: AudioParams) -> Self {
        Self {
            shelf: Arc::new(Mutex::new(Shelf::new(DEFAULT_MAX_IDLE))),
            format: Arc::new(Mutex::new(format)),
        }
    }

    /// Cap the number of live buffers.
    pub fn with_live_limit(self, limit: usize) -> Self {
        self.shelf.lock().limit = Some(limit);
        self
    }

    /// Replace the negotiated format. Idle storage is dropped.
    pub fn set_format(&self, format: AudioParams) {
        let mut shelf = self.shelf.lock();
        shelf.generation += 1;
        shelf.idle.clear();
        *self.format.lock() = format;
    }

    /// The currently negotiated format.
    pub fn format(&self) -> AudioParams {
        *self.format.lock()
    }

    /// Acquire a writable audio buffer of exactly `bytes` length.
    ///
    /// Recycled storage with enough capacity is reused; otherwise a fresh
    /// buffer is allocated. Returns `None` when the format is incomplete or
    /// the live limit is reached.
    pub fn acquire(&self, bytes: usize) -> Option<BufferLease<AudioBuffer>> {
        let params = *self.format.lock();
        let (layout, sample_format) = (params.layout?, params.sample_format?);
        if !params.is_complete() {
            return None;
        }

        let mut shelf = self.shelf.lock();
        let reuse = shelf.idle.iter().position(|b| b.capacity() >= bytes);
        let buffer = if let Some(at) = reuse {
            let mut b = shelf.idle.remove(at).unwrap_or_else(|| unreachable!());
            b.resize(bytes);
            b
        } else {
            if let Some(limit) = shelf.limit {
                if shelf.live >= limit {
                    return None;
                }
            }
            shelf.total_allocated += 1;
            AudioBuffer::new(bytes, sample_format, layout, params.sample_rate)
        };
        shelf.live += 1;
        Some(BufferLease::new_pooled(
            buffer,
            shelf.generation,
            Arc::downgrade(&self.shelf),
        ))
    }

    /// Buffers currently out.
    pub fn live(&self) -> usize {
        self.shelf.lock().live
    }

    /// Recycled buffers ready for reuse.
    pub fn idle(&self) -> usize {
        self.shelf.lock().idle.len()
    }

    /// Buffers ever allocated.
    pub fn total_allocated(&self) -> usize {
        self.shelf.lock().total_allocated
    }
}

impl Clone for AudioPool {
    fn clone(&self) -> Self {
        Self {
            shelf: Arc::clone(&self.shelf),
            format: Arc::clone(&self.format),
        }
    }
}

/// A pool of subpicture buffers. Regions grow on demand, so there is no
/// format to negotiate.
pub struct SubpicturePool {
    shelf: SharedShelf<Subpicture>,
}

impl SubpicturePool {
    /// Create a pool.
    pub fn new() -> Self {
        Self {
            shelf: Arc::new(Mutex::new(Shelf::new(DEFAULT_MAX_IDLE))),
        }
    }

    /// Cap the number of live buffers.
    pub fn with_live_limit(self, limit: usize) -> Self {
        self.shelf.lock().limit = Some(limit);
        self
    }

    /// Acquire a writable, empty subpicture.
    pub fn acquire(&self) -> Option<BufferLease<Subpicture>> {
        let mut shelf = self.shelf.lock();
        let spu = if let Some(s) = shelf.idle.pop_front() {
            s
        } else {
            if let Some(limit) = shelf.limit {
                if shelf.live >= limit {
                    return None;
                }
            }
            shelf.total_allocated += 1;
            Subpicture::new()
        };
        shelf.live += 1;
        Some(BufferLease::new_pooled(
            spu,
            shelf.generation,
            Arc::downgrade(&self.shelf),
        ))
    }

    /// Buffers currently out.
    pub fn live(&self) -> usize {
        self.shelf.lock().live
    }

    /// Recycled buffers ready for reuse.
    pub fn idle(&self) -> usize {
        self.shelf.lock().idle.len()
    }
}

impl Default for SubpicturePool {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SubpicturePool {
    fn clone(&self) -> Self {
        Self {
            shelf: Arc::clone(&self.shelf),
        }
    }
}
