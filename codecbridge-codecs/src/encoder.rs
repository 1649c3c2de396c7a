//! Per-stream encoding sessions and their tuning surface.

use crate::traits::{AudioEncoder, SubtitleEncoder, VideoEncoder};
use codecbridge_core::{
    AudioBuffer, Error, OwnedBlock, Picture, Result, StreamFormat, Subpicture,
};

/// Advisory encoder tuning supplied at bind time.
///
/// Every field is a hint: a module may ignore any of them and must still
/// produce a valid bitstream. Zero always means "use the implementation
/// default", never "disable".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderConfig {
    /// Worker thread count hint (0 = auto).
    pub threads: u32,
    /// Emit one I-frame per this many frames (0 = implementation default;
    /// never "no I-frames").
    pub iframe_interval: u32,
    /// Emit one B-frame per this many frames (0 = implementation default).
    pub bframe_interval: u32,
    /// Bitrate tolerance hint, in bits per second.
    pub bitrate_tolerance: u32,
}

impl EncoderConfig {
    /// Resolve the I-frame interval against an implementation default.
    pub fn iframe_interval_or(&self, default: u32) -> u32 {
        if self.iframe_interval == 0 {
            default.max(1)
        } else {
            self.iframe_interval
        }
    }
}

/// The bound encoder module, one variant per payload kind.
pub enum EncoderModule {
    /// Picture input.
    Video(Box<dyn VideoEncoder>),
    /// Audio buffer input.
    Audio(Box<dyn AudioEncoder>),
    /// Subpicture input.
    Subtitle(Box<dyn SubtitleEncoder>),
}

/// An encoding stream: the inverse of a decoder session.
///
/// One typed entry point per payload kind; feeding the wrong kind is an
/// invalid-parameter error (the stream was bound for another payload).
pub struct EncoderSession {
    config: EncoderConfig,
    fmt_in: StreamFormat,
    module: EncoderModule,
}

impl EncoderSession {
    /// Bind an encoder module to a stream.
    pub fn new(fmt_in: StreamFormat, config: EncoderConfig, module: EncoderModule) -> Self {
        Self {
            config,
            fmt_in,
            module,
        }
    }

    /// The tuning supplied at bind time.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// The raw input format negotiated at bind time.
    pub fn fmt_in(&self) -> &StreamFormat {
        &self.fmt_in
    }

    /// The output byte-stream format.
    pub fn fmt_out(&self) -> StreamFormat {
        match &self.module {
            EncoderModule::Video(m) => m.output_format(),
            EncoderModule::Audio(m) => m.output_format(),
            EncoderModule::Subtitle(m) => m.output_format(),
        }
    }

    /// Encode one picture into zero or more byte-stream units.
    ///
    /// An encoder may buffer for lookahead and emit the corresponding
    /// units on a later call, in input order.
    pub fn encode_picture(&mut self, picture: &Picture) -> Result<Vec<OwnedBlock>> {
        match &mut self.module {
            EncoderModule::Video(m) => m.encode(picture),
            _ => Err(Error::invalid_param(
                "picture fed to a non-video encoder session",
            )),
        }
    }

    /// Encode one audio buffer into zero or more byte-stream units.
    pub fn encode_audio(&mut self, buffer: &AudioBuffer) -> Result<Vec<OwnedBlock>> {
        match &mut self.module {
            EncoderModule::Audio(m) => m.encode(buffer),
            _ => Err(Error::invalid_param(
                "audio fed to a non-audio encoder session",
            )),
        }
    }

    /// Encode one subpicture into zero or more byte-stream units.
    pub fn encode_subpicture(&mut self, subpicture: &Subpicture) -> Result<Vec<OwnedBlock>> {
        match &mut self.module {
            EncoderModule::Subtitle(m) => m.encode(subpicture),
            _ => Err(Error::invalid_param(
                "subpicture fed to a non-subtitle encoder session",
            )),
        }
    }

    /// Drain lookahead and emit all pending units.
    pub fn flush(&mut self) -> Result<Vec<OwnedBlock>> {
        match &mut self.module {
            EncoderModule::Video(m) => m.flush(),
            EncoderModule::Audio(m) => m.flush(),
            EncoderModule::Subtitle(_) => Ok(Vec::new()),
        }
    }

    /// Codec-specific configuration data for the produced stream.
    pub fn extra_data(&self) -> Option<&[u8]> {
        match &self.module {
            EncoderModule::Video(m) => m.extra_data(),
            EncoderModule::Audio(m) => m.extra_data(),
            EncoderModule::Subtitle(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iframe_interval_resolution() {
        let config = EncoderConfig::default();
        assert_eq!(config.iframe_interval_or(12), 12);

        let config = EncoderConfig {
            iframe_interval: 1,
            ..Default::default()
        };
        assert_eq!(config.iframe_interval_or(12), 1);
    }
}
