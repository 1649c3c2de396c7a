//! Subtitle and overlay buffers.

use crate::timestamp::Timestamp;
use std::fmt;

/// One positioned overlay region, stored as packed RGBA.
#[derive(Clone)]
pub struct SubpictureRegion {
    /// Horizontal offset of the region on the video, in pixels.
    pub x: u32,
    /// Vertical offset of the region on the video, in pixels.
    pub y: u32,
    /// Region width in pixels.
    pub width: u32,
    /// Region height in pixels.
    pub height: u32,
    /// RGBA pixel data, `width * height * 4` bytes.
    data: Vec<u8>,
}

impl SubpictureRegion {
    /// Allocate a transparent region.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
        }
    }

    /// The RGBA pixels.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the RGBA pixels.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Debug for SubpictureRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubpictureRegion")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A decoded subtitle/overlay unit: zero or more regions plus the display
/// window they are shown in.
#[derive(Clone, Debug, Default)]
pub struct Subpicture {
    /// Overlay regions.
    pub regions: Vec<SubpictureRegion>,
    /// When display starts.
    pub start: Timestamp,
    /// When display ends. Unknown means "until replaced".
    pub stop: Timestamp,
    /// Display only until the next subpicture arrives, regardless of `stop`.
    pub ephemeral: bool,
}

impl Subpicture {
    /// Create an empty subpicture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the subpicture shows anything.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Reset contents so the storage can be handed out again.
    pub(crate) fn clear_meta(&mut self) {
        self.regions.clear();
        self.start = Timestamp::none();
        self.stop = Timestamp::none();
        self.ephemeral = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::TimeBase;

    #[test]
    fn test_region_allocation() {
        let region = SubpictureRegion::new(10, 20, 64, 16);
        assert_eq!(region.data().len(), 64 * 16 * 4);
    }

    #[test]
    fn test_clear_meta() {
        let mut spu = Subpicture::new();
        spu.regions.push(SubpictureRegion::new(0, 0, 8, 8));
        spu.start = Timestamp::new(0, TimeBase::MPEG);
        spu.ephemeral = true;
        spu.clear_meta();
        assert!(spu.is_empty());
        assert!(!spu.ephemeral);
        assert!(!spu.start.is_valid());
    }
}
