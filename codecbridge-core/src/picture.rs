//! Decoded video picture buffers.

use crate::timestamp::{Duration, Timestamp};
use bitflags::bitflags;
use std::fmt;

/// Pixel format for decoded pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp.
    Yuv420p,
    /// Planar YUV 4:2:2, 16bpp.
    Yuv422p,
    /// Y plane plus interleaved UV plane.
    Nv12,
    /// Packed RGBA, 32bpp.
    Rgba,
    /// Grayscale, 8bpp.
    Gray8,
}

impl PixelFormat {
    /// Number of planes for this format.
    pub fn num_planes(&self) -> usize {
        match self {
            Self::Yuv420p | Self::Yuv422p => 3,
            Self::Nv12 => 2,
            Self::Rgba | Self::Gray8 => 1,
        }
    }

    /// Chroma subsampling factors (horizontal, vertical).
    pub fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p | Self::Nv12 => (2, 2),
            Self::Yuv422p => (2, 1),
            Self::Rgba | Self::Gray8 => (1, 1),
        }
    }

    /// Unpadded bytes per row of the given plane at `width` pixels.
    pub fn row_bytes(&self, plane: usize, width: u32) -> usize {
        match self {
            Self::Yuv420p | Self::Yuv422p => {
                if plane == 0 {
                    width as usize
                } else {
                    width as usize / 2
                }
            }
            // Y and interleaved UV rows are both `width` bytes wide.
            Self::Nv12 => width as usize,
            Self::Rgba => width as usize * 4,
            Self::Gray8 => width as usize,
        }
    }

    /// Rows in the given plane at `height` pixels.
    pub fn plane_rows(&self, plane: usize, height: u32) -> usize {
        let (_, vsub) = self.chroma_subsampling();
        if plane == 0 {
            height as usize
        } else {
            height as usize / vsub as usize
        }
    }

    /// Total unpadded byte size of a picture at the given dimensions.
    pub fn picture_size(&self, width: u32, height: u32) -> usize {
        (0..self.num_planes())
            .map(|p| self.row_bytes(p, width) * self.plane_rows(p, height))
            .sum()
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yuv420p => write!(f, "yuv420p"),
            Self::Yuv422p => write!(f, "yuv422p"),
            Self::Nv12 => write!(f, "nv12"),
            Self::Rgba => write!(f, "rgba"),
            Self::Gray8 => write!(f, "gray8"),
        }
    }
}

bitflags! {
    /// Picture property flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PictureFlags: u32 {
        /// Progressive (non-interlaced) content.
        const PROGRESSIVE = 0x0001;
        /// Top field first, for interlaced content.
        const TOP_FIELD_FIRST = 0x0002;
        /// Must be displayed even under pacing pressure.
        const FORCE_DISPLAY = 0x0004;
        /// Decoded from a keyframe.
        const KEYFRAME = 0x0008;
    }
}

/// A decoded video picture.
#[derive(Clone)]
pub struct Picture {
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
    /// Pixel format.
    format: PixelFormat,
    /// Plane storage.
    planes: Vec<Plane>,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Display duration.
    pub duration: Duration,
    /// Property flags.
    pub flags: PictureFlags,
}

#[derive(Clone)]
struct Plane {
    data: Vec<u8>,
    stride: usize,
}

/// Stride alignment, in bytes, for plane rows.
const STRIDE_ALIGN: usize = 32;

impl Picture {
    /// Allocate a zeroed picture.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let planes = (0..format.num_planes())
            .map(|p| {
                let row = format.row_bytes(p, width);
                let stride = (row + STRIDE_ALIGN - 1) & !(STRIDE_ALIGN - 1);
                Plane {
                    data: vec![0u8; stride * format.plane_rows(p, height)],
                    stride,
                }
            })
            .collect();

        Self {
            width,
            height,
            format,
            planes,
            pts: Timestamp::none(),
            duration: Duration::zero(),
            flags: PictureFlags::PROGRESSIVE,
        }
    }

    /// Picture width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Picture height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Number of planes.
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    /// A plane's data, row-padded to the stride.
    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.planes.get(index).map(|p| p.data.as_slice())
    }

    /// Mutable access to a plane's data.
    pub fn plane_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        self.planes.get_mut(index).map(|p| p.data.as_mut_slice())
    }

    /// Bytes per row for a plane.
    pub fn stride(&self, plane: usize) -> usize {
        self.planes.get(plane).map(|p| p.stride).unwrap_or(0)
    }

    /// Check the keyframe flag.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(PictureFlags::KEYFRAME)
    }

    /// Reset timing and flags so the storage can be handed out again.
    pub(crate) fn clear_meta(&mut self) {
        self.pts = Timestamp::none();
        self.duration = Duration::zero();
        self.flags = PictureFlags::PROGRESSIVE;
    }
}

impl fmt::Debug for Picture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Picture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("pts", &self.pts)
            .field("flags", &self.flags)
            .finish()
    }
}
