//! Common codec module traits.
//!
//! One trait per payload kind and per mode keeps buffer typing static: a
//! video decoder can only ever return picture handles, an audio decoder
//! audio handles, and so on. Every processing call may return zero or more
//! outputs; modules may buffer internally (reordering, lookahead) but must
//! emit outputs in presentation order with non-decreasing timestamps, and
//! may delay an output by at most [`crate::MAX_REORDER_DEPTH`] inputs.
//!
//! Output buffers come exclusively from the [`DecoderHost`] passed into
//! each call; an acquisition returning `None` is backpressure, and a module
//! that cannot produce must either retain the input for a later call or
//! account for it through its drop counter.

use crate::caption::CcChannels;
use crate::host::DecoderHost;
use codecbridge_core::{
    AudioBuffer, Block, BufferRef, OwnedBlock, Picture, Result, StreamFormat, Subpicture,
};

/// Information about a codec module.
#[derive(Debug, Clone)]
pub struct CodecInfo {
    /// Codec name.
    pub name: &'static str,
    /// Long name/description.
    pub long_name: &'static str,
    /// Whether the module needs fully-packetized input units.
    pub needs_packetized_input: bool,
}

/// Common trait for video decoder modules.
pub trait VideoDecoder: Send {
    /// Get codec information.
    fn codec_info(&self) -> CodecInfo;

    /// Decode one input unit into zero or more pictures.
    ///
    /// The module takes ownership of the unit and may retain it across
    /// calls to accumulate a complete coding unit.
    fn decode(
        &mut self,
        host: &dyn DecoderHost,
        block: Block<'_>,
    ) -> Result<Vec<BufferRef<Picture>>>;

    /// Drain any internally buffered pictures.
    fn flush(&mut self, host: &dyn DecoderHost) -> Result<Vec<BufferRef<Picture>>>;

    /// Reset the decoder state (seek, discontinuity).
    fn reset(&mut self);

    /// The authoritative output format, once the module has determined it.
    ///
    /// May change mid-stream; the change is propagated synchronously with
    /// the first buffer using the new format.
    fn output_format(&self) -> Option<StreamFormat>;

    /// Closed captions extracted from the immediately preceding call's
    /// output, plus the channels carried by that payload.
    fn closed_captions(&mut self) -> Option<(OwnedBlock, CcChannels)> {
        None
    }

    /// Aggregate count of frames dropped to keep pace.
    fn frames_dropped(&self) -> u64 {
        0
    }
}

/// Common trait for audio decoder modules.
pub trait AudioDecoder: Send {
    /// Get codec information.
    fn codec_info(&self) -> CodecInfo;

    /// Decode one input unit into zero or more audio buffers.
    fn decode(
        &mut self,
        host: &dyn DecoderHost,
        block: Block<'_>,
    ) -> Result<Vec<BufferRef<AudioBuffer>>>;

    /// Drain any internally buffered audio.
    fn flush(&mut self, host: &dyn DecoderHost) -> Result<Vec<BufferRef<AudioBuffer>>>;

    /// Reset the decoder state.
    fn reset(&mut self);

    /// The authoritative output format, once determined.
    fn output_format(&self) -> Option<StreamFormat>;

    /// Aggregate count of buffers dropped to keep pace.
    fn frames_dropped(&self) -> u64 {
        0
    }
}

/// Common trait for subtitle decoder modules.
pub trait SubtitleDecoder: Send {
    /// Get codec information.
    fn codec_info(&self) -> CodecInfo;

    /// Decode one input unit into zero or more subpictures.
    fn decode(
        &mut self,
        host: &dyn DecoderHost,
        block: Block<'_>,
    ) -> Result<Vec<BufferRef<Subpicture>>>;

    /// Reset the decoder state.
    fn reset(&mut self);

    /// The authoritative output format, once determined.
    fn output_format(&self) -> Option<StreamFormat>;
}

/// Common trait for packetizer modules.
///
/// A packetizer re-frames a possibly-truncated byte stream into units
/// aligned exactly to coding-unit boundaries; it never decodes. Its output
/// blocks are always packetized.
pub trait Packetizer: Send {
    /// Get codec information.
    fn codec_info(&self) -> CodecInfo;

    /// Consume one input unit, producing zero or more re-framed units.
    fn packetize(&mut self, block: Block<'_>) -> Result<Vec<OwnedBlock>>;

    /// Drain any accumulated partial unit.
    fn flush(&mut self) -> Result<Vec<OwnedBlock>>;

    /// Reset the packetizer state.
    fn reset(&mut self);

    /// The authoritative output format, once determined.
    fn output_format(&self) -> Option<StreamFormat>;

    /// Closed captions found while parsing the preceding call's units.
    fn closed_captions(&mut self) -> Option<(OwnedBlock, CcChannels)> {
        None
    }
}

/// Common trait for video encoder modules.
pub trait VideoEncoder: Send {
    /// Get codec information.
    fn codec_info(&self) -> CodecInfo;

    /// Encode one picture into zero or more byte-stream units.
    ///
    /// An encoder may buffer for lookahead (I/B/P placement) and emit the
    /// corresponding units on a later call.
    fn encode(&mut self, picture: &Picture) -> Result<Vec<OwnedBlock>>;

    /// Drain lookahead and emit all pending units.
    fn flush(&mut self) -> Result<Vec<OwnedBlock>>;

    /// Reset the encoder state.
    fn reset(&mut self);

    /// The output format of the produced byte stream.
    fn output_format(&self) -> StreamFormat;

    /// Codec-specific configuration data (parameter sets), once known.
    fn extra_data(&self) -> Option<&[u8]> {
        None
    }
}

/// Common trait for audio encoder modules.
pub trait AudioEncoder: Send {
    /// Get codec information.
    fn codec_info(&self) -> CodecInfo;

    /// Encode one audio buffer into zero or more byte-stream units.
    fn encode(&mut self, buffer: &AudioBuffer) -> Result<Vec<OwnedBlock>>;

    /// Drain lookahead and emit all pending units.
    fn flush(&mut self) -> Result<Vec<OwnedBlock>>;

    /// Reset the encoder state.
    fn reset(&mut self);

    /// The output format of the produced byte stream.
    fn output_format(&self) -> StreamFormat;

    /// Codec-specific configuration data, once known.
    fn extra_data(&self) -> Option<&[u8]> {
        None
    }
}

/// Common trait for subtitle encoder modules.
pub trait SubtitleEncoder: Send {
    /// Get codec information.
    fn codec_info(&self) -> CodecInfo;

    /// Encode one subpicture into zero or more byte-stream units.
    fn encode(&mut self, subpicture: &Subpicture) -> Result<Vec<OwnedBlock>>;

    /// Reset the encoder state.
    fn reset(&mut self);

    /// The output format of the produced byte stream.
    fn output_format(&self) -> StreamFormat;
}
