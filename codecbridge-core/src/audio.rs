//! Decoded audio buffers.

use crate::timestamp::{Duration, Timestamp};
use std::fmt;

/// Sample format for decoded audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Unsigned 8-bit.
    U8,
    /// Signed 16-bit, native endian.
    S16,
    /// Signed 32-bit, native endian.
    S32,
    /// 32-bit float.
    F32,
}

impl SampleFormat {
    /// Bytes per single sample.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "u8"),
            Self::S16 => write!(f, "s16"),
            Self::S32 => write!(f, "s32"),
            Self::F32 => write!(f, "flt"),
        }
    }
}

/// Channel layout for decoded audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Mono.
    Mono,
    /// Stereo (left, right).
    #[default]
    Stereo,
    /// 5.1 (FL, FR, FC, LFE, BL, BR).
    Surround51,
    /// Custom layout with an explicit channel count.
    Custom(u32),
}

impl ChannelLayout {
    /// Number of channels in this layout.
    pub fn num_channels(&self) -> u32 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Surround51 => 6,
            Self::Custom(n) => *n,
        }
    }
}

/// A decoded, interleaved audio buffer.
#[derive(Clone)]
pub struct AudioBuffer {
    /// Raw interleaved sample bytes.
    data: Vec<u8>,
    /// Sample format.
    format: SampleFormat,
    /// Channel layout.
    layout: ChannelLayout,
    /// Sample rate in Hz.
    sample_rate: u32,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Playback duration.
    pub duration: Duration,
}

impl AudioBuffer {
    /// Allocate a zeroed buffer of `bytes` capacity.
    pub fn new(bytes: usize, format: SampleFormat, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            data: vec![0u8; bytes],
            format,
            layout,
            sample_rate,
            pts: Timestamp::none(),
            duration: Duration::zero(),
        }
    }

    /// The sample bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the sample bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Buffer size in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Sample format.
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Channel layout.
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per channel held in this buffer.
    pub fn num_samples(&self) -> usize {
        let frame = self.format.bytes_per_sample() * self.layout.num_channels() as usize;
        if frame == 0 {
            0
        } else {
            self.data.len() / frame
        }
    }

    /// Shrink the buffer to exactly `bytes` (a decoder filled less than it
    /// asked for).
    pub fn truncate(&mut self, bytes: usize) {
        self.data.truncate(bytes);
    }

    /// Grow or shrink storage to `bytes`, zero-filling new space.
    pub(crate) fn resize(&mut self, bytes: usize) {
        self.data.resize(bytes, 0);
    }

    /// Storage capacity in bytes, independent of the current length.
    pub(crate) fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Reset timing so the storage can be handed out again.
    pub(crate) fn clear_meta(&mut self) {
        self.pts = Timestamp::none();
        self.duration = Duration::zero();
    }
}

impl fmt::Debug for AudioBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBuffer")
            .field("bytes", &self.data.len())
            .field("format", &self.format)
            .field("layout", &self.layout)
            .field("sample_rate", &self.sample_rate)
            .field("pts", &self.pts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_samples() {
        let buf = AudioBuffer::new(4096, SampleFormat::S16, ChannelLayout::Stereo, 48000);
        assert_eq!(buf.num_samples(), 1024);
    }

    #[test]
    fn test_truncate() {
        let mut buf = AudioBuffer::new(4096, SampleFormat::F32, ChannelLayout::Mono, 44100);
        buf.truncate(1024);
        assert_eq!(buf.byte_len(), 1024);
        assert_eq!(buf.num_samples(), 256);
    }

    #[test]
    fn test_layout_channels() {
        assert_eq!(ChannelLayout::Surround51.num_channels(), 6);
        assert_eq!(ChannelLayout::Custom(8).num_channels(), 8);
    }
}
