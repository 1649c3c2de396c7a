//! Input units and encoded byte-stream units.
//!
//! A [`Block`] is one chunk of compressed (or pre-decoded) data travelling
//! between demuxer, packetizer, decoder and encoder. Blocks can borrow
//! external data (zero-copy) or own it; a module that retains a block
//! across processing calls converts it with [`Block::into_owned`].

use crate::timestamp::{Duration, TimeBase, Timestamp};
use bitflags::bitflags;
use std::borrow::Cow;
use std::fmt;

bitflags! {
    /// Block property flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlockFlags: u32 {
        /// Contains an intra-coded unit (random access point).
        const KEYFRAME = 0x0001;
        /// Contains a predicted unit.
        const TYPE_P = 0x0002;
        /// Contains a bi-predicted unit.
        const TYPE_B = 0x0004;
        /// Data is known to be damaged.
        const CORRUPTED = 0x0008;
        /// A timing discontinuity precedes this unit.
        const DISCONTINUITY = 0x0010;
        /// Unit is truncated: not aligned to a coding-unit boundary.
        /// Packetizers clear this; decoders that require packetized input
        /// must never see it.
        const INCOMPLETE = 0x0020;
    }
}

/// One unit of compressed or pre-decoded media data.
#[derive(Clone)]
pub struct Block<'a> {
    /// The payload.
    data: Cow<'a, [u8]>,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Decode timestamp.
    pub dts: Timestamp,
    /// Playback duration of the unit.
    pub duration: Duration,
    /// Property flags.
    pub flags: BlockFlags,
}

impl<'a> Block<'a> {
    /// Create a block owning its data.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Cow::Owned(data),
            pts: Timestamp::none(),
            dts: Timestamp::none(),
            duration: Duration::zero(),
            flags: BlockFlags::empty(),
        }
    }

    /// Create a block borrowing external data.
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self {
            data: Cow::Borrowed(data),
            pts: Timestamp::none(),
            dts: Timestamp::none(),
            duration: Duration::zero(),
            flags: BlockFlags::empty(),
        }
    }

    /// Create an empty block.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// The payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check the keyframe flag.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(BlockFlags::KEYFRAME)
    }

    /// Check whether the unit is aligned to a coding-unit boundary.
    pub fn is_packetized(&self) -> bool {
        !self.flags.contains(BlockFlags::INCOMPLETE)
    }

    /// Convert into a block that owns its data.
    pub fn into_owned(self) -> OwnedBlock {
        Block {
            data: Cow::Owned(self.data.into_owned()),
            pts: self.pts,
            dts: self.dts,
            duration: self.duration,
            flags: self.flags,
        }
    }

    /// Append another block's payload to this one.
    ///
    /// Used by packetizers accumulating fragments into a complete coding
    /// unit. Timing of the first fragment wins; flags are merged, except
    /// INCOMPLETE which is taken from the appended (latest) fragment.
    pub fn append(&mut self, other: &Block<'_>) {
        self.data.to_mut().extend_from_slice(other.data());
        if !self.pts.is_valid() {
            self.pts = other.pts;
        }
        if !self.dts.is_valid() {
            self.dts = other.dts;
        }
        self.duration = self.duration + other.duration;
        let incomplete = other.flags.contains(BlockFlags::INCOMPLETE);
        self.flags |= other.flags;
        self.flags.set(BlockFlags::INCOMPLETE, incomplete);
    }

    /// Builder: set the timestamps.
    pub fn with_timestamps(mut self, pts: Timestamp, dts: Timestamp) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    /// Builder: set the presentation timestamp in a given base.
    pub fn with_pts(mut self, value: i64, time_base: TimeBase) -> Self {
        self.pts = Timestamp::new(value, time_base);
        self
    }

    /// Builder: set the flags.
    pub fn with_flags(mut self, flags: BlockFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("size", &self.size())
            .field("pts", &self.pts)
            .field("dts", &self.dts)
            .field("flags", &self.flags)
            .finish()
    }
}

impl Default for Block<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

/// A block that owns its data, suitable for retention across calls.
pub type OwnedBlock = Block<'static>;
