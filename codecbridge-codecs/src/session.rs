//! Per-stream processing sessions.
//!
//! A session is created when a module is bound to a stream and destroyed
//! when the stream is torn down or the module is replaced. It owns the
//! negotiated formats and mode flags, drives the module, and enforces the
//! stream-level contract around every processing call:
//!
//! - the packetized-input precondition (a breach is a caller bug and
//!   panics, it is not a recoverable error),
//! - observation of output format renegotiation,
//! - monotonic non-decreasing output timestamps,
//! - closed-caption payload scoping and global channel presence,
//! - aggregate drop accounting when pace control is off.
//!
//! Destroying a session never invalidates output buffers it produced;
//! their lifetime is the holder count's business alone.

use crate::caption::CcChannels;
use crate::host::DecoderHost;
use crate::traits::{AudioDecoder, Packetizer, SubtitleDecoder, VideoDecoder};
use codecbridge_core::{
    Attachment, AudioBuffer, Block, BufferRef, OwnedBlock, Picture, Result, StreamFormat,
    Subpicture, Timestamp,
};
use std::sync::Arc;

/// Stream-level configuration fixed at bind time.
#[derive(Debug, Clone)]
pub struct StreamBinding {
    /// Input format from the demuxer; possibly partially unknown.
    pub fmt_in: StreamFormat,
    /// The host guarantees fully-packetized input units.
    pub requires_packetized_input: bool,
    /// When `false`, the module may silently drop output to keep pace,
    /// accounted only through the aggregate drop counter.
    pub pace_control: bool,
}

impl StreamBinding {
    /// Create a binding with default flags (packetization not required,
    /// pace control on).
    pub fn new(fmt_in: StreamFormat) -> Self {
        Self {
            fmt_in,
            requires_packetized_input: false,
            pace_control: true,
        }
    }

    /// Require fully-packetized input units.
    pub fn require_packetized_input(mut self) -> Self {
        self.requires_packetized_input = true;
        self
    }

    /// Set whether the module must keep every frame.
    pub fn with_pace_control(mut self, pace_control: bool) -> Self {
        self.pace_control = pace_control;
        self
    }
}

/// Shared per-session bookkeeping.
struct SessionState {
    binding: StreamBinding,
    /// Effective flag: the binding's requirement or the module's own.
    needs_packetized: bool,
    fmt_out: Option<StreamFormat>,
    format_changed: bool,
    cc_present: CcChannels,
    cc_payload: Option<OwnedBlock>,
    last_pts: Timestamp,
    dropped_seen: u64,
}

impl SessionState {
    fn new(binding: StreamBinding, module_needs_packetized: bool) -> Self {
        let needs_packetized = binding.requires_packetized_input || module_needs_packetized;
        Self {
            binding,
            needs_packetized,
            fmt_out: None,
            format_changed: false,
            cc_present: CcChannels::empty(),
            cc_payload: None,
            last_pts: Timestamp::none(),
            dropped_seen: 0,
        }
    }

    fn check_input(&self, module_name: &str, block: &Block<'_>) {
        assert!(
            !self.needs_packetized || block.is_packetized(),
            "non-packetized input unit fed to '{}', which requires packetized input",
            module_name
        );
    }

    fn observe_format(&mut self, current: Option<StreamFormat>) {
        let Some(current) = current else { return };
        if self.fmt_out.as_ref() != Some(&current) {
            if self.fmt_out.is_some() {
                tracing::debug!(codec = %current.codec, "output format renegotiated");
            }
            self.fmt_out = Some(current);
            self.format_changed = true;
        }
    }

    fn observe_pts(&mut self, pts: Timestamp) {
        if !pts.is_valid() {
            return;
        }
        debug_assert!(
            !self.last_pts.is_valid() || pts >= self.last_pts,
            "module emitted output with decreasing pts"
        );
        self.last_pts = pts;
    }

    fn observe_drops(&mut self, total: u64) {
        if total > self.dropped_seen {
            let new = total - self.dropped_seen;
            self.dropped_seen = total;
            if self.binding.pace_control {
                tracing::warn!(dropped = new, "module dropped frames despite pace control");
            } else {
                tracing::trace!(dropped = new, total, "frames dropped to keep pace");
            }
        }
    }

    fn capture_captions(&mut self, found: Option<(OwnedBlock, CcChannels)>) {
        match found {
            Some((payload, channels)) => {
                self.cc_present |= channels;
                self.cc_payload = Some(payload);
            }
            None => self.cc_payload = None,
        }
    }
}

macro_rules! session_common {
    () => {
        /// The input format negotiated at bind time.
        pub fn fmt_in(&self) -> &StreamFormat {
            &self.state.binding.fmt_in
        }

        /// The authoritative output format, once the module has emitted it.
        pub fn fmt_out(&self) -> Option<&StreamFormat> {
            self.state.fmt_out.as_ref()
        }

        /// Whether the last processing call changed the output format.
        pub fn format_changed(&self) -> bool {
            self.state.format_changed
        }

        /// An owned snapshot of the stream's attachments.
        ///
        /// Every call returns an independently-owned collection.
        pub fn attachments(&self) -> Vec<Attachment> {
            self.host.attachments()
        }

        /// Advisory decode-domain to wall-clock translation. Statistics
        /// only; never a correctness input.
        pub fn display_date(&self, ts: Timestamp) -> Option<Timestamp> {
            self.host.display_date(ts)
        }

        /// Advisory playback rate multiplier (fixed-point). Statistics only.
        pub fn display_rate(&self) -> i32 {
            self.host.display_rate()
        }
    };
}

/// A video stream bound to a decoder module.
pub struct VideoSession {
    state: SessionState,
    module: Box<dyn VideoDecoder>,
    host: Arc<dyn DecoderHost>,
}

impl VideoSession {
    /// Bind a decoder module to a stream.
    pub fn new(
        binding: StreamBinding,
        module: Box<dyn VideoDecoder>,
        host: Arc<dyn DecoderHost>,
    ) -> Self {
        let needs = module.codec_info().needs_packetized_input;
        Self {
            state: SessionState::new(binding, needs),
            module,
            host,
        }
    }

    session_common!();

    /// Feed one input unit; returns the pictures it yielded.
    ///
    /// # Panics
    ///
    /// Panics when the binding (or the module) requires packetized input
    /// and the unit is truncated — that is a contract violation upstream,
    /// not a runtime condition to recover from.
    pub fn decode(&mut self, block: Block<'_>) -> Result<Vec<BufferRef<Picture>>> {
        self.state.format_changed = false;
        self.state
            .check_input(self.module.codec_info().name, &block);

        // The caption payload is scoped to the preceding call; a failed
        // call must not leave the previous one claimable.
        self.state.cc_payload = None;
        let out = self.module.decode(self.host.as_ref(), block)?;

        self.state.observe_format(self.module.output_format());
        for picture in &out {
            self.state.observe_pts(picture.pts);
        }
        self.state.observe_drops(self.module.frames_dropped());
        let cc = self.module.closed_captions();
        self.state.capture_captions(cc);
        Ok(out)
    }

    /// Drain internally buffered pictures (end of stream).
    pub fn flush(&mut self) -> Result<Vec<BufferRef<Picture>>> {
        let out = self.module.flush(self.host.as_ref())?;
        for picture in &out {
            self.state.observe_pts(picture.pts);
        }
        Ok(out)
    }

    /// Reset for a seek or discontinuity. Channel presence is stream-global
    /// and survives resets.
    pub fn reset(&mut self) {
        self.module.reset();
        self.state.cc_payload = None;
        self.state.last_pts = Timestamp::none();
    }

    /// Closed captions from the immediately preceding call, plus the
    /// global channel presence bitmap.
    ///
    /// The payload is scoped to the buffers produced by the last `decode`
    /// only; the bitmap covers every channel ever seen on this stream.
    pub fn closed_captions(&mut self) -> (Option<OwnedBlock>, CcChannels) {
        (self.state.cc_payload.take(), self.state.cc_present)
    }

    /// Aggregate frames dropped by the module to keep pace.
    pub fn frames_dropped(&self) -> u64 {
        self.module.frames_dropped()
    }
}

/// An audio stream bound to a decoder module.
pub struct AudioSession {
    state: SessionState,
    module: Box<dyn AudioDecoder>,
    host: Arc<dyn DecoderHost>,
}

impl AudioSession {
    /// Bind a decoder module to a stream.
    pub fn new(
        binding: StreamBinding,
        module: Box<dyn AudioDecoder>,
        host: Arc<dyn DecoderHost>,
    ) -> Self {
        let needs = module.codec_info().needs_packetized_input;
        Self {
            state: SessionState::new(binding, needs),
            module,
            host,
        }
    }

    session_common!();

    /// Feed one input unit; returns the audio buffers it yielded.
    ///
    /// # Panics
    ///
    /// Panics on a truncated unit when packetized input is required.
    pub fn decode(&mut self, block: Block<'_>) -> Result<Vec<BufferRef<AudioBuffer>>> {
        self.state.format_changed = false;
        self.state
            .check_input(self.module.codec_info().name, &block);

        let out = self.module.decode(self.host.as_ref(), block)?;

        self.state.observe_format(self.module.output_format());
        for buffer in &out {
            self.state.observe_pts(buffer.pts);
        }
        self.state.observe_drops(self.module.frames_dropped());
        Ok(out)
    }

    /// Drain internally buffered audio (end of stream).
    pub fn flush(&mut self) -> Result<Vec<BufferRef<AudioBuffer>>> {
        let out = self.module.flush(self.host.as_ref())?;
        for buffer in &out {
            self.state.observe_pts(buffer.pts);
        }
        Ok(out)
    }

    /// Reset for a seek or discontinuity.
    pub fn reset(&mut self) {
        self.module.reset();
        self.state.last_pts = Timestamp::none();
    }

    /// Aggregate buffers dropped by the module to keep pace.
    pub fn frames_dropped(&self) -> u64 {
        self.module.frames_dropped()
    }
}

/// A subtitle stream bound to a decoder module.
pub struct SubtitleSession {
    state: SessionState,
    module: Box<dyn SubtitleDecoder>,
    host: Arc<dyn DecoderHost>,
}

impl SubtitleSession {
    /// Bind a decoder module to a stream.
    pub fn new(
        binding: StreamBinding,
        module: Box<dyn SubtitleDecoder>,
        host: Arc<dyn DecoderHost>,
    ) -> Self {
        let needs = module.codec_info().needs_packetized_input;
        Self {
            state: SessionState::new(binding, needs),
            module,
            host,
        }
    }

    session_common!();

    /// Feed one input unit; returns the subpictures it yielded.
    ///
    /// # Panics
    ///
    /// Panics on a truncated unit when packetized input is required.
    pub fn decode(&mut self, block: Block<'_>) -> Result<Vec<BufferRef<Subpicture>>> {
        self.state.format_changed = false;
        self.state
            .check_input(self.module.codec_info().name, &block);

        let out = self.module.decode(self.host.as_ref(), block)?;

        self.state.observe_format(self.module.output_format());
        for spu in &out {
            self.state.observe_pts(spu.start);
        }
        Ok(out)
    }

    /// Reset for a seek or discontinuity.
    pub fn reset(&mut self) {
        self.module.reset();
        self.state.last_pts = Timestamp::none();
    }
}

/// A stream bound to a packetizer module (packetize-only mode).
pub struct PacketizerSession {
    state: SessionState,
    module: Box<dyn Packetizer>,
    host: Arc<dyn DecoderHost>,
}

impl PacketizerSession {
    /// Bind a packetizer module to a stream.
    ///
    /// A packetizer by definition accepts truncated input; the binding's
    /// packetization flag is ignored.
    pub fn new(
        binding: StreamBinding,
        module: Box<dyn Packetizer>,
        host: Arc<dyn DecoderHost>,
    ) -> Self {
        Self {
            state: SessionState::new(binding, false),
            module,
            host,
        }
    }

    session_common!();

    /// Feed one input unit; returns re-framed, fully-packetized units.
    pub fn packetize(&mut self, block: Block<'_>) -> Result<Vec<OwnedBlock>> {
        self.state.format_changed = false;
        self.state.cc_payload = None;
        let out = self.module.packetize(block)?;

        debug_assert!(
            out.iter().all(|b| b.is_packetized()),
            "packetizer emitted a truncated unit"
        );
        self.state.observe_format(self.module.output_format());
        for unit in &out {
            self.state.observe_pts(unit.pts);
        }
        let cc = self.module.closed_captions();
        self.state.capture_captions(cc);
        Ok(out)
    }

    /// Drain any accumulated partial unit (end of stream).
    pub fn flush(&mut self) -> Result<Vec<OwnedBlock>> {
        self.module.flush()
    }

    /// Reset for a seek or discontinuity.
    pub fn reset(&mut self) {
        self.module.reset();
        self.state.cc_payload = None;
        self.state.last_pts = Timestamp::none();
    }

    /// Closed captions from the immediately preceding call, plus the
    /// global channel presence bitmap.
    pub fn closed_captions(&mut self) -> (Option<OwnedBlock>, CcChannels) {
        (self.state.cc_payload.take(), self.state.cc_present)
    }
}
