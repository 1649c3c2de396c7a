//! Contract conformance tests for sessions, pools and handles.
//!
//! Covers the binding properties of the host/module contract: refcounted
//! reclamation, output ordering under reordering, the packetized-input
//! precondition, caption presence accumulation, attachment snapshot
//! independence and encoder keyframe intervals.

use codecbridge_codecs::host::{DecoderHost, PooledHost};
use codecbridge_codecs::raw::{CopyPacketizer, RawVideoDecoder, RawVideoEncoder};
use codecbridge_codecs::session::{PacketizerSession, StreamBinding, VideoSession};
use codecbridge_codecs::traits::{CodecInfo, Packetizer, VideoDecoder, VideoEncoder};
use codecbridge_codecs::{CcChannels, EncoderConfig, EncoderModule, EncoderSession, ReorderBuffer};
use codecbridge_core::{
    Attachment, AudioParams, AudioPool, Block, BlockFlags, BufferRef, CodecError, CodecId,
    OwnedBlock, Picture, PicturePool, PixelFormat, Result, StreamFormat, SubpicturePool, TimeBase,
    Timestamp, VideoParams,
};
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;

fn gray(width: u32, height: u32) -> VideoParams {
    VideoParams::new(width, height, PixelFormat::Gray8)
}

fn pooled_host(params: VideoParams) -> Arc<PooledHost> {
    Arc::new(PooledHost::new(
        PicturePool::new(params),
        AudioPool::new(AudioParams::default()),
        SubpicturePool::new(),
    ))
}

fn frame_block(params: VideoParams, pts: i64) -> OwnedBlock {
    let bytes = params
        .pixel_format
        .unwrap()
        .picture_size(params.width, params.height);
    Block::new(vec![0u8; bytes]).with_pts(pts, TimeBase::MPEG)
}

fn raw_session(host: Arc<PooledHost>, params: VideoParams) -> VideoSession {
    let binding = StreamBinding::new(StreamFormat::video(CodecId::RawVideo, params));
    VideoSession::new(binding, Box::new(RawVideoDecoder::new(params, true)), host)
}

// =============================================================================
// Property 1: storage is reclaimed exactly once, at zero holders
// =============================================================================

#[test]
fn storage_reclaimed_exactly_at_zero_holders() {
    let pool = PicturePool::new(gray(16, 16));
    let handle = pool.acquire().unwrap().into_ref();
    let second = handle.link();
    let third = second.link();
    assert_eq!(handle.holders(), 3);
    assert_eq!(pool.live(), 1);

    drop(second);
    drop(handle);
    assert_eq!(pool.idle(), 0, "storage reclaimed while a holder remains");

    drop(third);
    assert_eq!(pool.live(), 0);
    assert_eq!(pool.idle(), 1);
}

proptest! {
    /// Any number of links in any drop order reclaims once, never before.
    #[test]
    fn refcount_discipline_holds(extra_links in 0usize..8, drop_first in any::<bool>()) {
        let pool = PicturePool::new(gray(8, 8));
        let producer = pool.acquire().unwrap().into_ref();
        let mut extras: Vec<BufferRef<Picture>> =
            (0..extra_links).map(|_| producer.link()).collect();

        if drop_first {
            drop(producer);
            prop_assert_eq!(pool.idle(), usize::from(extras.is_empty()));
            extras.clear();
        } else {
            extras.clear();
            prop_assert_eq!(pool.idle(), 0);
            drop(producer);
        }
        prop_assert_eq!(pool.live(), 0);
        prop_assert_eq!(pool.idle(), 1);
    }
}

// =============================================================================
// Property 2: monotonic output order under B-frame style reordering
// =============================================================================

/// Test decoder that receives frames in coding order and re-sorts them into
/// presentation order through a fixed window.
struct ReorderingDecoder {
    params: VideoParams,
    window: ReorderBuffer<BufferRef<Picture>>,
}

impl ReorderingDecoder {
    fn new(params: VideoParams, depth: usize) -> Self {
        Self {
            params,
            window: ReorderBuffer::new(depth),
        }
    }
}

impl VideoDecoder for ReorderingDecoder {
    fn codec_info(&self) -> CodecInfo {
        CodecInfo {
            name: "reorder-test",
            long_name: "reordering test decoder",
            needs_packetized_input: true,
        }
    }

    fn decode(
        &mut self,
        host: &dyn DecoderHost,
        block: Block<'_>,
    ) -> Result<Vec<BufferRef<Picture>>> {
        let mut lease = host.new_picture(&self.params).unwrap();
        lease.pts = block.pts;
        let handle = lease.into_ref();
        Ok(self.window.push(handle.pts, handle).into_iter().collect())
    }

    fn flush(&mut self, _host: &dyn DecoderHost) -> Result<Vec<BufferRef<Picture>>> {
        Ok(self.window.drain())
    }

    fn reset(&mut self) {
        let _ = self.window.drain();
    }

    fn output_format(&self) -> Option<StreamFormat> {
        Some(StreamFormat::video(CodecId::RawVideo, self.params))
    }
}

#[test]
fn reordered_input_yields_monotonic_output() {
    let params = gray(8, 8);
    let host = pooled_host(params);
    let binding = StreamBinding::new(StreamFormat::video(CodecId::RawVideo, params));
    let mut session = VideoSession::new(
        binding,
        Box::new(ReorderingDecoder::new(params, 2)),
        host,
    );

    let mut got = Vec::new();
    for pts in [0i64, 3, 1, 2] {
        got.extend(session.decode(frame_block(params, pts)).unwrap());
    }
    got.extend(session.flush().unwrap());

    let order: Vec<i64> = got.iter().map(|p| p.pts.value).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);
}

// =============================================================================
// Property 3: packetized-input precondition is checked, not "fixed"
// =============================================================================

#[test]
#[should_panic(expected = "requires packetized input")]
fn truncated_unit_hits_precondition() {
    let params = gray(8, 8);
    let host = pooled_host(params);
    let binding = StreamBinding::new(StreamFormat::video(CodecId::RawVideo, params))
        .require_packetized_input();
    let mut session =
        VideoSession::new(binding, Box::new(RawVideoDecoder::new(params, true)), host);

    let truncated = frame_block(params, 0).with_flags(BlockFlags::INCOMPLETE);
    let _ = session.decode(truncated);
}

// =============================================================================
// Property 4: caption presence is global, payload is per-call
// =============================================================================

/// Test decoder emitting one caption payload on a chosen call.
struct CaptionedDecoder {
    params: VideoParams,
    call: u32,
    cc_on_call: u32,
    pending_cc: Option<(OwnedBlock, CcChannels)>,
}

impl VideoDecoder for CaptionedDecoder {
    fn codec_info(&self) -> CodecInfo {
        CodecInfo {
            name: "cc-test",
            long_name: "captioned test decoder",
            needs_packetized_input: true,
        }
    }

    fn decode(
        &mut self,
        host: &dyn DecoderHost,
        block: Block<'_>,
    ) -> Result<Vec<BufferRef<Picture>>> {
        self.call += 1;
        if self.call == self.cc_on_call {
            self.pending_cc = Some((Block::new(vec![0x15, 0x2c]), CcChannels::CC2));
        }
        let mut lease = host.new_picture(&self.params).unwrap();
        lease.pts = block.pts;
        Ok(vec![lease.into_ref()])
    }

    fn flush(&mut self, _host: &dyn DecoderHost) -> Result<Vec<BufferRef<Picture>>> {
        Ok(Vec::new())
    }

    fn reset(&mut self) {}

    fn output_format(&self) -> Option<StreamFormat> {
        Some(StreamFormat::video(CodecId::RawVideo, self.params))
    }

    fn closed_captions(&mut self) -> Option<(OwnedBlock, CcChannels)> {
        self.pending_cc.take()
    }
}

#[test]
fn caption_presence_outlives_payload() {
    let params = gray(8, 8);
    let host = pooled_host(params);
    let binding = StreamBinding::new(StreamFormat::video(CodecId::RawVideo, params));
    let mut session = VideoSession::new(
        binding,
        Box::new(CaptionedDecoder {
            params,
            call: 0,
            cc_on_call: 5,
            pending_cc: None,
        }),
        host,
    );

    for call in 1..=8i64 {
        session.decode(frame_block(params, call)).unwrap();
        let (payload, present) = session.closed_captions();
        if call < 5 {
            assert!(payload.is_none());
            assert_eq!(present, CcChannels::empty());
        } else if call == 5 {
            assert!(payload.is_some());
            assert!(present.channel(1));
        } else {
            // Payload was scoped to call 5; presence never reverts.
            assert!(payload.is_none());
            assert!(present.channel(1));
        }
    }
}

/// Test packetizer that re-frames nothing but extracts a caption payload
/// on a chosen call.
struct CaptionedPacketizer {
    call: u32,
    cc_on_call: u32,
    pending_cc: Option<(OwnedBlock, CcChannels)>,
}

impl Packetizer for CaptionedPacketizer {
    fn codec_info(&self) -> CodecInfo {
        CodecInfo {
            name: "cc-pkt-test",
            long_name: "captioned test packetizer",
            needs_packetized_input: false,
        }
    }

    fn packetize(&mut self, block: Block<'_>) -> Result<Vec<OwnedBlock>> {
        self.call += 1;
        if self.call == self.cc_on_call {
            self.pending_cc = Some((Block::new(vec![0x14, 0x20]), CcChannels::CC3));
        }
        let mut unit = block.into_owned();
        unit.flags -= BlockFlags::INCOMPLETE;
        Ok(vec![unit])
    }

    fn flush(&mut self) -> Result<Vec<OwnedBlock>> {
        Ok(Vec::new())
    }

    fn reset(&mut self) {}

    fn output_format(&self) -> Option<StreamFormat> {
        None
    }

    fn closed_captions(&mut self) -> Option<(OwnedBlock, CcChannels)> {
        self.pending_cc.take()
    }
}

#[test]
fn packetizer_session_scopes_captions_like_a_decoder() {
    let params = gray(8, 8);
    let host = pooled_host(params);
    let binding = StreamBinding::new(StreamFormat::video(CodecId::H264, params));
    let mut session = PacketizerSession::new(
        binding,
        Box::new(CaptionedPacketizer {
            call: 0,
            cc_on_call: 2,
            pending_cc: None,
        }),
        host,
    );

    for call in 1..=4i64 {
        let out = session
            .packetize(Block::new(vec![0u8; 4]).with_pts(call, TimeBase::MPEG))
            .unwrap();
        assert!(out.iter().all(|b| b.is_packetized()));
        let (payload, present) = session.closed_captions();
        assert_eq!(payload.is_some(), call == 2);
        assert_eq!(present.channel(2), call >= 2);
    }

    // Presence is stream-global and survives a reset.
    session.reset();
    let (payload, present) = session.closed_captions();
    assert!(payload.is_none());
    assert!(present.channel(2));
}

#[test]
fn copy_packetizer_session_reframes_without_captions() {
    let params = gray(8, 8);
    let host = pooled_host(params);
    let fmt = StreamFormat::video(CodecId::H264, params);
    let binding = StreamBinding::new(fmt.clone());
    let mut session =
        PacketizerSession::new(binding, Box::new(CopyPacketizer::new(fmt, 4)), host);

    let out = session
        .packetize(Block::new(vec![1, 2, 3, 4, 5, 6]).with_flags(BlockFlags::INCOMPLETE))
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].data(), &[1, 2, 3, 4]);

    // A pure byte copier has no captions to surface.
    let (payload, present) = session.closed_captions();
    assert!(payload.is_none());
    assert_eq!(present, CcChannels::empty());

    // The partial tail never leaves the packetizer.
    assert!(session.flush().unwrap().is_empty());
}

/// Test decoder that emits a caption and then fails on a chosen call.
struct FailingDecoder {
    params: VideoParams,
    call: u32,
    fail_on_call: u32,
    pending_cc: Option<(OwnedBlock, CcChannels)>,
}

impl VideoDecoder for FailingDecoder {
    fn codec_info(&self) -> CodecInfo {
        CodecInfo {
            name: "fail-test",
            long_name: "failing test decoder",
            needs_packetized_input: true,
        }
    }

    fn decode(
        &mut self,
        host: &dyn DecoderHost,
        block: Block<'_>,
    ) -> Result<Vec<BufferRef<Picture>>> {
        self.call += 1;
        if self.call == self.fail_on_call {
            return Err(CodecError::CorruptInput { offset: 0 }.into());
        }
        self.pending_cc = Some((Block::new(vec![0x15]), CcChannels::CC1));
        let mut lease = host.new_picture(&self.params).unwrap();
        lease.pts = block.pts;
        Ok(vec![lease.into_ref()])
    }

    fn flush(&mut self, _host: &dyn DecoderHost) -> Result<Vec<BufferRef<Picture>>> {
        Ok(Vec::new())
    }

    fn reset(&mut self) {}

    fn output_format(&self) -> Option<StreamFormat> {
        Some(StreamFormat::video(CodecId::RawVideo, self.params))
    }

    fn closed_captions(&mut self) -> Option<(OwnedBlock, CcChannels)> {
        self.pending_cc.take()
    }
}

#[test]
fn failed_call_does_not_inherit_previous_captions() {
    let params = gray(8, 8);
    let host = pooled_host(params);
    let binding = StreamBinding::new(StreamFormat::video(CodecId::RawVideo, params));
    let mut session = VideoSession::new(
        binding,
        Box::new(FailingDecoder {
            params,
            call: 0,
            fail_on_call: 2,
            pending_cc: None,
        }),
        host,
    );

    session.decode(frame_block(params, 0)).unwrap();
    // The first call's payload is not claimed before the next call.
    assert!(session.decode(frame_block(params, 1)).is_err());

    let (payload, present) = session.closed_captions();
    assert!(payload.is_none(), "stale payload attributed to a failed call");
    assert!(present.channel(0));
}

// =============================================================================
// Property 5: attachment snapshots are independently owned
// =============================================================================

#[test]
fn attachment_snapshots_do_not_alias() {
    let params = gray(8, 8);
    let host = pooled_host(params);
    host.set_attachments(vec![
        Attachment::new("font.ttf", "font/ttf", vec![0xde, 0xad]),
        Attachment::new("cover.png", "image/png", vec![0x89, 0x50]),
    ]);
    let session = raw_session(host, params);

    let first = session.attachments();
    let mut second = session.attachments();
    assert_eq!(first, second);

    second[0].data[0] = 0;
    second.pop();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].data, vec![0xde, 0xad]);
}

// =============================================================================
// Property 6: I-frame interval semantics
// =============================================================================

#[test]
fn iframe_interval_one_marks_every_unit() {
    let params = gray(8, 8);
    let config = EncoderConfig {
        iframe_interval: 1,
        ..Default::default()
    };
    let mut session = EncoderSession::new(
        StreamFormat::video(CodecId::RawVideo, params),
        config,
        EncoderModule::Video(Box::new(RawVideoEncoder::new(params, config))),
    );

    for _ in 0..10 {
        let picture = Picture::new(8, 8, PixelFormat::Gray8);
        let blocks = session.encode_picture(&picture).unwrap();
        assert!(blocks.iter().all(|b| b.is_keyframe()));
    }
}

#[test]
fn iframe_interval_zero_means_default_not_never() {
    let params = gray(8, 8);
    let config = EncoderConfig::default();
    let mut encoder = RawVideoEncoder::new(params, config);

    let mut keyframes = 0;
    for _ in 0..24 {
        let picture = Picture::new(8, 8, PixelFormat::Gray8);
        let blocks = codecbridge_codecs::traits::VideoEncoder::encode(&mut encoder, &picture)
            .unwrap();
        keyframes += blocks.iter().filter(|b| b.is_keyframe()).count();
    }
    // Default GOP still produces periodic keyframes.
    assert_eq!(keyframes, 2);
}

/// Test encoder that buffers a fixed lookahead before emitting.
struct LookaheadEncoder {
    params: VideoParams,
    depth: usize,
    queue: VecDeque<OwnedBlock>,
}

impl VideoEncoder for LookaheadEncoder {
    fn codec_info(&self) -> CodecInfo {
        CodecInfo {
            name: "lookahead-test",
            long_name: "lookahead-buffering test encoder",
            needs_packetized_input: true,
        }
    }

    fn encode(&mut self, picture: &Picture) -> Result<Vec<OwnedBlock>> {
        let unit = Block::new(Vec::new()).with_timestamps(picture.pts, picture.pts);
        self.queue.push_back(unit);
        if self.queue.len() > self.depth {
            Ok(self.queue.pop_front().into_iter().collect())
        } else {
            Ok(Vec::new())
        }
    }

    fn flush(&mut self) -> Result<Vec<OwnedBlock>> {
        Ok(self.queue.drain(..).collect())
    }

    fn reset(&mut self) {
        self.queue.clear();
    }

    fn output_format(&self) -> StreamFormat {
        StreamFormat::video(CodecId::RawVideo, self.params)
    }
}

#[test]
fn encoder_flush_emits_lookahead_remainder_in_order() {
    let params = gray(8, 8);
    let mut session = EncoderSession::new(
        StreamFormat::video(CodecId::RawVideo, params),
        EncoderConfig::default(),
        EncoderModule::Video(Box::new(LookaheadEncoder {
            params,
            depth: 2,
            queue: VecDeque::new(),
        })),
    );

    let mut emitted = Vec::new();
    for pts in 0..6i64 {
        let mut picture = Picture::new(8, 8, PixelFormat::Gray8);
        picture.pts = Timestamp::new(pts, TimeBase::MPEG);
        emitted.extend(session.encode_picture(&picture).unwrap());
    }
    // Two units are still held back for lookahead.
    assert_eq!(emitted.len(), 4);

    let tail = session.flush().unwrap();
    assert_eq!(tail.len(), 2);

    emitted.extend(tail);
    let order: Vec<i64> = emitted.iter().map(|b| b.pts.value).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
}

// =============================================================================
// Teardown, backpressure and renegotiation
// =============================================================================

#[test]
fn session_teardown_keeps_linked_buffers_valid() {
    let params = gray(16, 16);
    let host = pooled_host(params);
    let pool = host.picture_pool().clone();
    let mut session = raw_session(host, params);

    let out = session.decode(frame_block(params, 0)).unwrap();
    let held = out[0].link();
    drop(out);
    drop(session);

    // The producing unit is gone; the buffer is still readable.
    assert_eq!(held.width(), 16);
    assert_eq!(pool.live(), 1);
    drop(held);
    assert_eq!(pool.live(), 0);
}

#[test]
fn acquisition_backpressure_is_retryable() {
    let params = gray(8, 8);
    let host = Arc::new(PooledHost::new(
        PicturePool::new(params).with_live_limit(1),
        AudioPool::new(AudioParams::default()),
        SubpicturePool::new(),
    ));
    let mut session = raw_session(host, params);

    let first = session.decode(frame_block(params, 0)).unwrap();
    assert_eq!(first.len(), 1);

    // Pool saturated: the unit is retained, not lost.
    let stalled = session.decode(frame_block(params, 1)).unwrap();
    assert!(stalled.is_empty());

    drop(first);
    let retried = session.flush().unwrap();
    assert_eq!(retried.len(), 1);
    assert_eq!(retried[0].pts.value, 1);
}

#[test]
fn pace_free_session_counts_drops() {
    let params = gray(8, 8);
    let host = Arc::new(PooledHost::new(
        PicturePool::new(params).with_live_limit(1),
        AudioPool::new(AudioParams::default()),
        SubpicturePool::new(),
    ));
    let binding = StreamBinding::new(StreamFormat::video(CodecId::RawVideo, params))
        .with_pace_control(false);
    let mut session =
        VideoSession::new(binding, Box::new(RawVideoDecoder::new(params, false)), host);

    let first = session.decode(frame_block(params, 0)).unwrap();
    assert_eq!(session.frames_dropped(), 0);

    let starved = session.decode(frame_block(params, 1)).unwrap();
    assert!(starved.is_empty());
    assert_eq!(session.frames_dropped(), 1);
    drop(first);
}

/// Test decoder that changes its output dimensions mid-stream.
struct GrowingDecoder {
    params: VideoParams,
    frames: u32,
    grow_at: u32,
}

impl VideoDecoder for GrowingDecoder {
    fn codec_info(&self) -> CodecInfo {
        CodecInfo {
            name: "grow-test",
            long_name: "format-changing test decoder",
            needs_packetized_input: true,
        }
    }

    fn decode(
        &mut self,
        host: &dyn DecoderHost,
        block: Block<'_>,
    ) -> Result<Vec<BufferRef<Picture>>> {
        self.frames += 1;
        if self.frames == self.grow_at {
            self.params = gray(self.params.width * 2, self.params.height * 2);
        }
        let mut lease = host.new_picture(&self.params).unwrap();
        lease.pts = block.pts;
        Ok(vec![lease.into_ref()])
    }

    fn flush(&mut self, _host: &dyn DecoderHost) -> Result<Vec<BufferRef<Picture>>> {
        Ok(Vec::new())
    }

    fn reset(&mut self) {}

    fn output_format(&self) -> Option<StreamFormat> {
        Some(StreamFormat::video(CodecId::RawVideo, self.params))
    }
}

#[test]
fn format_change_is_observed_with_the_buffer_that_uses_it() {
    let params = gray(8, 8);
    let host = pooled_host(params);
    let binding = StreamBinding::new(StreamFormat::video(CodecId::RawVideo, params));
    let mut session = VideoSession::new(
        binding,
        Box::new(GrowingDecoder {
            params,
            frames: 0,
            grow_at: 3,
        }),
        host,
    );

    for call in 1..=4i64 {
        let out = session.decode(frame_block(params, call)).unwrap();
        if call < 3 {
            assert_eq!(out[0].width(), 8);
        } else {
            assert_eq!(out[0].width(), 16);
        }
        // The change is visible exactly once, with the first new-format
        // buffer. (The first call reports the initial format discovery.)
        assert_eq!(session.format_changed(), call == 1 || call == 3);
    }
    let fmt = session.fmt_out().unwrap();
    assert_eq!(fmt.params.video().unwrap().width, 16);
}

#[test]
fn display_channels_are_advisory_and_pure() {
    let params = gray(8, 8);
    let host = pooled_host(params);
    host.set_clock_origin(Timestamp::from_micros(1_000_000));
    let mut session = raw_session(host, params);

    let ts = Timestamp::new(45000, TimeBase::MPEG);
    let a = session.display_date(ts);
    let b = session.display_date(ts);
    assert_eq!(a, b);
    assert_eq!(a.unwrap().to_micros(), Some(1_500_000));
    assert_eq!(session.display_rate(), 1000);

    // Clock queries leave decoding untouched.
    let out = session.decode(frame_block(params, 45000)).unwrap();
    assert_eq!(out.len(), 1);
}
