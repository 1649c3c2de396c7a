//! The host side of the contract: buffer acquisition and auxiliary queries.
//!
//! Codec modules never see allocation callbacks or pool internals; the
//! [`DecoderHost`] trait is the only surface between a module and its
//! owner. The handle-level operations ([`BufferLease`], `BufferRef`) carry
//! all ownership discipline.

use codecbridge_core::{
    Attachment, AudioBuffer, AudioParams, BufferLease, Picture, Subpicture, Timestamp,
    VideoParams,
};
use codecbridge_core::{AudioPool, PicturePool, SubpicturePool};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

/// Fixed-point display rate for normal-speed playback.
pub const RATE_ONE: i32 = 1000;

/// What a codec module may ask of its owner.
///
/// Acquisitions return `None` on exhaustion or while the output format is
/// still unknown; that is backpressure, not failure. The display channels
/// are advisory, side-effect free, and must only feed instrumentation —
/// never frame drop or sync decisions.
pub trait DecoderHost: Send + Sync {
    /// Acquire a picture buffer sized for `params`.
    ///
    /// Passing updated parameters renegotiates the output format; the
    /// change reaches the host synchronously, before the buffer that first
    /// uses it is produced.
    fn new_picture(&self, params: &VideoParams) -> Option<BufferLease<Picture>>;

    /// Acquire an audio buffer of exactly `bytes` length.
    fn new_audio(&self, params: &AudioParams, bytes: usize) -> Option<BufferLease<AudioBuffer>>;

    /// Acquire an empty subpicture buffer.
    fn new_subpicture(&self) -> Option<BufferLease<Subpicture>>;

    /// All attachments known for the stream, as a fresh owned snapshot.
    fn attachments(&self) -> Vec<Attachment> {
        Vec::new()
    }

    /// Translate a decode-domain timestamp into a wall-clock estimate.
    fn display_date(&self, ts: Timestamp) -> Option<Timestamp> {
        let _ = ts;
        None
    }

    /// Current playback rate multiplier, fixed-point with
    /// [`RATE_ONE`] = 1.0x.
    fn display_rate(&self) -> i32 {
        RATE_ONE
    }
}

/// The provided host implementation, backed by one pool per buffer kind.
pub struct PooledHost {
    pictures: PicturePool,
    audio: AudioPool,
    subpictures: SubpicturePool,
    attachments: Mutex<Vec<Attachment>>,
    /// Wall-clock date of stream time zero, if playback timing is known.
    clock_origin: Mutex<Option<Timestamp>>,
    rate: AtomicI32,
}

impl PooledHost {
    /// Create a host around the given pools.
    pub fn new(pictures: PicturePool, audio: AudioPool, subpictures: SubpicturePool) -> Self {
        Self {
            pictures,
            audio,
            subpictures,
            attachments: Mutex::new(Vec::new()),
            clock_origin: Mutex::new(None),
            rate: AtomicI32::new(RATE_ONE),
        }
    }

    /// Replace the attachment set for the stream.
    pub fn set_attachments(&self, attachments: Vec<Attachment>) {
        *self.attachments.lock() = attachments;
    }

    /// Anchor the display clock: the wall-clock date at stream time zero.
    pub fn set_clock_origin(&self, origin: Timestamp) {
        *self.clock_origin.lock() = Some(origin);
    }

    /// Set the playback rate multiplier (fixed-point, [`RATE_ONE`] = 1.0x).
    pub fn set_rate(&self, rate: i32) {
        self.rate.store(rate.max(1), Ordering::Relaxed);
    }

    /// The picture pool backing this host.
    pub fn picture_pool(&self) -> &PicturePool {
        &self.pictures
    }

    /// The audio pool backing this host.
    pub fn audio_pool(&self) -> &AudioPool {
        &self.audio
    }
}

impl DecoderHost for PooledHost {
    fn new_picture(&self, params: &VideoParams) -> Option<BufferLease<Picture>> {
        if self.pictures.format() != *params {
            tracing::debug!(
                width = params.width,
                height = params.height,
                "video output format renegotiated"
            );
            self.pictures.set_format(*params);
        }
        self.pictures.acquire()
    }

    fn new_audio(&self, params: &AudioParams, bytes: usize) -> Option<BufferLease<AudioBuffer>> {
        if self.audio.format() != *params {
            tracing::debug!(
                sample_rate = params.sample_rate,
                "audio output format renegotiated"
            );
            self.audio.set_format(*params);
        }
        self.audio.acquire(bytes)
    }

    fn new_subpicture(&self) -> Option<BufferLease<Subpicture>> {
        self.subpictures.acquire()
    }

    fn attachments(&self) -> Vec<Attachment> {
        self.attachments.lock().clone()
    }

    fn display_date(&self, ts: Timestamp) -> Option<Timestamp> {
        let origin = (*self.clock_origin.lock())?;
        let micros = ts.to_micros()?;
        let rate = self.rate.load(Ordering::Relaxed);
        // Stream time stretches by the inverse of the playback rate.
        let scaled = micros * RATE_ONE as i64 / rate as i64;
        Some(Timestamp::from_micros(origin.to_micros()? + scaled))
    }

    fn display_rate(&self) -> i32 {
        self.rate.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codecbridge_core::{ChannelLayout, PixelFormat, SampleFormat, TimeBase};

    fn host() -> PooledHost {
        PooledHost::new(
            PicturePool::new(VideoParams::new(64, 64, PixelFormat::Yuv420p)),
            AudioPool::new(AudioParams::new(
                48000,
                ChannelLayout::Stereo,
                SampleFormat::S16,
            )),
            SubpicturePool::new(),
        )
    }

    #[test]
    fn test_new_picture_renegotiates_pool() {
        let host = host();
        let params = VideoParams::new(128, 96, PixelFormat::Yuv420p);
        let lease = host.new_picture(&params).unwrap();
        assert_eq!(lease.width(), 128);
        assert_eq!(host.picture_pool().format(), params);
    }

    #[test]
    fn test_display_date_requires_origin() {
        let host = host();
        let ts = Timestamp::new(90000, TimeBase::MPEG);
        assert!(host.display_date(ts).is_none());

        host.set_clock_origin(Timestamp::from_micros(5_000_000));
        let date = host.display_date(ts).unwrap();
        assert_eq!(date.to_micros(), Some(6_000_000));
    }

    #[test]
    fn test_display_date_scales_with_rate() {
        let host = host();
        host.set_clock_origin(Timestamp::from_micros(0));
        host.set_rate(2 * RATE_ONE);
        let ts = Timestamp::new(90000, TimeBase::MPEG);
        // 1s of stream time passes in 0.5s at 2x.
        assert_eq!(host.display_date(ts).unwrap().to_micros(), Some(500_000));
        assert_eq!(host.display_rate(), 2000);
    }

    #[test]
    fn test_attachment_snapshots_are_independent() {
        let host = host();
        host.set_attachments(vec![Attachment::new("a.ttf", "font/ttf", vec![1, 2])]);
        let first = host.attachments();
        let mut second = host.attachments();
        second[0].data[0] = 9;
        assert_eq!(first[0].data, vec![1, 2]);
    }
}
