//! Closed-caption channel bookkeeping (CEA-608/708 style).

use bitflags::bitflags;

bitflags! {
    /// Presence bitmap over the four independent caption channels.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CcChannels: u8 {
        /// Caption channel 1.
        const CC1 = 0b0001;
        /// Caption channel 2.
        const CC2 = 0b0010;
        /// Caption channel 3.
        const CC3 = 0b0100;
        /// Caption channel 4.
        const CC4 = 0b1000;
    }
}

impl CcChannels {
    /// Build a bitmap from per-channel booleans.
    pub fn from_bitmap(present: [bool; 4]) -> Self {
        let mut channels = CcChannels::empty();
        channels.set(CcChannels::CC1, present[0]);
        channels.set(CcChannels::CC2, present[1]);
        channels.set(CcChannels::CC3, present[2]);
        channels.set(CcChannels::CC4, present[3]);
        channels
    }

    /// Expand into per-channel booleans.
    pub fn to_bitmap(self) -> [bool; 4] {
        [
            self.contains(CcChannels::CC1),
            self.contains(CcChannels::CC2),
            self.contains(CcChannels::CC3),
            self.contains(CcChannels::CC4),
        ]
    }

    /// Check one channel by zero-based index.
    pub fn channel(self, index: usize) -> bool {
        index < 4 && self.to_bitmap()[index]
    }
}
