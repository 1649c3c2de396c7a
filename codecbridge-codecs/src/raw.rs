//! Reference raw/copy modules.
//!
//! These implement the module traits for uncompressed payloads: no entropy
//! coding, just the full ownership, pooling, pacing and re-framing
//! discipline of the contract. They double as the conformance vehicles for
//! the integration tests.

use crate::encoder::EncoderConfig;
use crate::host::DecoderHost;
use crate::traits::{AudioDecoder, CodecInfo, Packetizer, VideoDecoder, VideoEncoder};
use codecbridge_core::{
    AudioBuffer, AudioParams, Block, BlockFlags, BufferRef, CodecError, CodecId, OwnedBlock,
    Picture, Result, StreamFormat, Timestamp, VideoParams,
};
use std::collections::VecDeque;

/// Default GOP length when the I-frame interval is left at 0.
const DEFAULT_IFRAME_INTERVAL: u32 = 12;

/// Copy one frame's worth of tightly-packed bytes into a picture's strided
/// planes. Returns an error when the payload is short.
fn fill_picture(picture: &mut Picture, data: &[u8]) -> Result<()> {
    let format = picture.format();
    let (width, height) = (picture.width(), picture.height());
    let needed = format.picture_size(width, height);
    if data.len() < needed {
        return Err(CodecError::CorruptInput {
            offset: data.len() as u64,
        }
        .into());
    }

    let mut offset = 0;
    for plane_index in 0..format.num_planes() {
        let row_bytes = format.row_bytes(plane_index, width);
        let rows = format.plane_rows(plane_index, height);
        let stride = picture.stride(plane_index);
        let plane = picture
            .plane_mut(plane_index)
            .ok_or_else(|| CodecError::from("plane missing"))?;
        for row in 0..rows {
            let src = &data[offset..offset + row_bytes];
            plane[row * stride..row * stride + row_bytes].copy_from_slice(src);
            offset += row_bytes;
        }
    }
    Ok(())
}

/// Decoder for uncompressed video: one packetized unit is exactly one
/// frame.
pub struct RawVideoDecoder {
    params: VideoParams,
    /// Frames retained across calls while acquisition is saturated.
    queue: VecDeque<OwnedBlock>,
    pace_control: bool,
    dropped: u64,
}

impl RawVideoDecoder {
    /// Create a decoder for frames described by `params`.
    ///
    /// `pace_control` mirrors the stream binding: when `false`, a frame
    /// that cannot get an output buffer is dropped (and counted) instead
    /// of retained.
    pub fn new(params: VideoParams, pace_control: bool) -> Self {
        Self {
            params,
            queue: VecDeque::new(),
            pace_control,
            dropped: 0,
        }
    }

    fn decode_one(
        &self,
        host: &dyn DecoderHost,
        block: &Block<'_>,
    ) -> Result<Option<BufferRef<Picture>>> {
        let Some(mut lease) = host.new_picture(&self.params) else {
            return Ok(None);
        };
        fill_picture(&mut lease, block.data())?;
        lease.pts = block.pts;
        lease.duration = block.duration;
        Ok(Some(lease.into_ref()))
    }

    fn drain_queue(&mut self, host: &dyn DecoderHost) -> Result<Vec<BufferRef<Picture>>> {
        let mut out = Vec::new();
        while let Some(unit) = self.queue.pop_front() {
            match self.decode_one(host, &unit)? {
                Some(picture) => out.push(picture),
                None => {
                    if self.pace_control {
                        // Backpressure: keep the frame for the next call.
                        self.queue.push_front(unit);
                    } else {
                        self.dropped += 1;
                        tracing::trace!(total = self.dropped, "raw frame dropped under pressure");
                    }
                    break;
                }
            }
        }
        Ok(out)
    }
}

impl VideoDecoder for RawVideoDecoder {
    fn codec_info(&self) -> CodecInfo {
        CodecInfo {
            name: "rawvideo",
            long_name: "Uncompressed video passthrough",
            needs_packetized_input: true,
        }
    }

    fn decode(
        &mut self,
        host: &dyn DecoderHost,
        block: Block<'_>,
    ) -> Result<Vec<BufferRef<Picture>>> {
        self.queue.push_back(block.into_owned());
        self.drain_queue(host)
    }

    fn flush(&mut self, host: &dyn DecoderHost) -> Result<Vec<BufferRef<Picture>>> {
        self.drain_queue(host)
    }

    fn reset(&mut self) {
        self.queue.clear();
    }

    fn output_format(&self) -> Option<StreamFormat> {
        Some(StreamFormat::video(CodecId::RawVideo, self.params))
    }

    fn frames_dropped(&self) -> u64 {
        self.dropped
    }
}

/// Decoder for PCM audio: payload bytes map one-to-one into the output
/// buffer.
pub struct RawAudioDecoder {
    params: AudioParams,
}

impl RawAudioDecoder {
    /// Create a decoder for samples described by `params`.
    pub fn new(params: AudioParams) -> Self {
        Self { params }
    }
}

impl AudioDecoder for RawAudioDecoder {
    fn codec_info(&self) -> CodecInfo {
        CodecInfo {
            name: "araw",
            long_name: "Uncompressed PCM passthrough",
            needs_packetized_input: false,
        }
    }

    fn decode(
        &mut self,
        host: &dyn DecoderHost,
        block: Block<'_>,
    ) -> Result<Vec<BufferRef<AudioBuffer>>> {
        if block.is_empty() {
            return Ok(Vec::new());
        }
        let Some(mut lease) = host.new_audio(&self.params, block.size()) else {
            return Ok(Vec::new());
        };
        lease.data_mut().copy_from_slice(block.data());
        lease.pts = block.pts;
        lease.duration = block.duration;
        Ok(vec![lease.into_ref()])
    }

    fn flush(&mut self, _host: &dyn DecoderHost) -> Result<Vec<BufferRef<AudioBuffer>>> {
        Ok(Vec::new())
    }

    fn reset(&mut self) {}

    fn output_format(&self) -> Option<StreamFormat> {
        Some(StreamFormat::audio(CodecId::Pcm, self.params))
    }
}

/// Encoder for uncompressed video: planes out, tightly packed, with GOP
/// keyframe marking per the advisory config.
pub struct RawVideoEncoder {
    params: VideoParams,
    gop: u32,
    frame_index: u64,
}

impl RawVideoEncoder {
    /// Create an encoder for frames described by `params`.
    pub fn new(params: VideoParams, config: EncoderConfig) -> Self {
        Self {
            params,
            gop: config.iframe_interval_or(DEFAULT_IFRAME_INTERVAL),
            frame_index: 0,
        }
    }
}

impl VideoEncoder for RawVideoEncoder {
    fn codec_info(&self) -> CodecInfo {
        CodecInfo {
            name: "rawvideo",
            long_name: "Uncompressed video writer",
            needs_packetized_input: true,
        }
    }

    fn encode(&mut self, picture: &Picture) -> Result<Vec<OwnedBlock>> {
        let format = picture.format();
        let (width, height) = (picture.width(), picture.height());
        let mut data = Vec::with_capacity(format.picture_size(width, height));

        for plane_index in 0..format.num_planes() {
            let row_bytes = format.row_bytes(plane_index, width);
            let stride = picture.stride(plane_index);
            let plane = picture
                .plane(plane_index)
                .ok_or_else(|| CodecError::from("plane missing"))?;
            for row in 0..format.plane_rows(plane_index, height) {
                data.extend_from_slice(&plane[row * stride..row * stride + row_bytes]);
            }
        }

        let mut block = Block::new(data).with_timestamps(picture.pts, picture.pts);
        block.duration = picture.duration;
        if self.frame_index % self.gop as u64 == 0 {
            block.flags |= BlockFlags::KEYFRAME;
        }
        self.frame_index += 1;
        Ok(vec![block])
    }

    fn flush(&mut self) -> Result<Vec<OwnedBlock>> {
        Ok(Vec::new())
    }

    fn reset(&mut self) {
        self.frame_index = 0;
    }

    fn output_format(&self) -> StreamFormat {
        StreamFormat::video(CodecId::RawVideo, self.params)
    }
}

/// Re-frames an arbitrarily fragmented byte stream into fixed-size coding
/// units.
///
/// Accepts truncated fragments, accumulates, and emits only complete
/// units; the INCOMPLETE flag never survives it. Each produced unit
/// carries the timestamp of the input fragment that contributed its first
/// byte. It copies bytes without parsing them, so it never surfaces
/// closed-caption payloads.
pub struct CopyPacketizer {
    unit_size: usize,
    buffered: Vec<u8>,
    /// Absolute stream offset at which each timestamped fragment starts.
    starts: VecDeque<(u64, Timestamp)>,
    /// Timestamp of the fragment covering the next unemitted byte.
    current_pts: Timestamp,
    /// Absolute stream offset of `buffered[0]`.
    consumed: u64,
    fmt: StreamFormat,
}

impl CopyPacketizer {
    /// Create a packetizer producing `unit_size`-byte units of format
    /// `fmt`.
    ///
    /// # Panics
    ///
    /// Panics if `unit_size` is zero.
    pub fn new(fmt: StreamFormat, unit_size: usize) -> Self {
        assert!(unit_size > 0, "unit size must be non-zero");
        Self {
            unit_size,
            buffered: Vec::new(),
            starts: VecDeque::new(),
            current_pts: Timestamp::none(),
            consumed: 0,
            fmt,
        }
    }
}

impl Packetizer for CopyPacketizer {
    fn codec_info(&self) -> CodecInfo {
        CodecInfo {
            name: "copy",
            long_name: "Fixed-size re-framing packetizer",
            needs_packetized_input: false,
        }
    }

    fn packetize(&mut self, block: Block<'_>) -> Result<Vec<OwnedBlock>> {
        if block.pts.is_valid() {
            let at = self.consumed + self.buffered.len() as u64;
            self.starts.push_back((at, block.pts));
        }
        self.buffered.extend_from_slice(block.data());

        let mut out = Vec::new();
        while self.buffered.len() >= self.unit_size {
            // The fragment covering the unit's first byte stamps it.
            while let Some(&(at, pts)) = self.starts.front() {
                if at > self.consumed {
                    break;
                }
                self.current_pts = pts;
                self.starts.pop_front();
            }
            let rest = self.buffered.split_off(self.unit_size);
            let data = std::mem::replace(&mut self.buffered, rest);
            let pts = self.current_pts;
            out.push(Block::new(data).with_timestamps(pts, pts));
            self.consumed += self.unit_size as u64;
        }
        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<OwnedBlock>> {
        // A short tail is dropped: an incomplete coding unit must never
        // leave a packetizer.
        if !self.buffered.is_empty() {
            tracing::debug!(bytes = self.buffered.len(), "discarding partial unit at eos");
            self.buffered.clear();
        }
        self.starts.clear();
        Ok(Vec::new())
    }

    fn reset(&mut self) {
        self.buffered.clear();
        self.starts.clear();
        self.current_pts = Timestamp::none();
        self.consumed = 0;
    }

    fn output_format(&self) -> Option<StreamFormat> {
        Some(self.fmt.clone())
    }
}
