//! Stream format descriptors negotiated between host and codec modules.
//!
//! The input-side descriptor comes from the demuxer and may be partially
//! unknown; modules fill fields in as they discover them mid-stream
//! ([`StreamFormat::absorb`]). The output-side descriptor is authoritative
//! once a module emits it, and may change mid-stream — a change is a
//! renegotiation signal for the host, not an error.

use crate::audio::{ChannelLayout, SampleFormat};
use crate::picture::PixelFormat;
use crate::rational::Rational;
use std::fmt;

/// Identifies the coding of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    /// H.264/AVC video.
    H264,
    /// H.265/HEVC video.
    Hevc,
    /// MPEG-2 video.
    Mpeg2Video,
    /// Uncompressed video.
    RawVideo,
    /// AAC audio.
    Aac,
    /// MP3 audio.
    Mp3,
    /// Opus audio.
    Opus,
    /// Uncompressed PCM audio.
    Pcm,
    /// SubRip text subtitles.
    Srt,
    /// HDMV presentation graphics subtitles.
    PgsSub,
    /// Coding not (yet) identified.
    Unknown,
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::H264 => write!(f, "h264"),
            Self::Hevc => write!(f, "hevc"),
            Self::Mpeg2Video => write!(f, "mpeg2video"),
            Self::RawVideo => write!(f, "rawvideo"),
            Self::Aac => write!(f, "aac"),
            Self::Mp3 => write!(f, "mp3"),
            Self::Opus => write!(f, "opus"),
            Self::Pcm => write!(f, "pcm"),
            Self::Srt => write!(f, "srt"),
            Self::PgsSub => write!(f, "pgssub"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Video coding parameters. Zero dimensions mean "not yet known".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoParams {
    /// Coded width in pixels (0 = unknown).
    pub width: u32,
    /// Coded height in pixels (0 = unknown).
    pub height: u32,
    /// Pixel format, once known.
    pub pixel_format: Option<PixelFormat>,
    /// Frame rate, once known.
    pub frame_rate: Option<Rational>,
    /// Sample aspect ratio, once known.
    pub sample_aspect: Option<Rational>,
}

impl VideoParams {
    /// Create parameters with known dimensions and pixel format.
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            pixel_format: Some(pixel_format),
            frame_rate: None,
            sample_aspect: None,
        }
    }

    /// Whether enough is known to size an output picture.
    pub fn is_complete(&self) -> bool {
        self.width != 0 && self.height != 0 && self.pixel_format.is_some()
    }

    /// Fill unknown fields from `other` without clobbering known ones.
    pub fn absorb(&mut self, other: &VideoParams) {
        if self.width == 0 {
            self.width = other.width;
        }
        if self.height == 0 {
            self.height = other.height;
        }
        if self.pixel_format.is_none() {
            self.pixel_format = other.pixel_format;
        }
        if self.frame_rate.is_none() {
            self.frame_rate = other.frame_rate;
        }
        if self.sample_aspect.is_none() {
            self.sample_aspect = other.sample_aspect;
        }
    }
}

/// Audio coding parameters. A zero sample rate means "not yet known".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioParams {
    /// Sample rate in Hz (0 = unknown).
    pub sample_rate: u32,
    /// Channel layout, once known.
    pub layout: Option<ChannelLayout>,
    /// Sample format, once known.
    pub sample_format: Option<SampleFormat>,
}

impl AudioParams {
    /// Create parameters with everything known.
    pub fn new(sample_rate: u32, layout: ChannelLayout, sample_format: SampleFormat) -> Self {
        Self {
            sample_rate,
            layout: Some(layout),
            sample_format: Some(sample_format),
        }
    }

    /// Whether enough is known to size an output buffer.
    pub fn is_complete(&self) -> bool {
        self.sample_rate != 0 && self.layout.is_some() && self.sample_format.is_some()
    }

    /// Fill unknown fields from `other` without clobbering known ones.
    pub fn absorb(&mut self, other: &AudioParams) {
        if self.sample_rate == 0 {
            self.sample_rate = other.sample_rate;
        }
        if self.layout.is_none() {
            self.layout = other.layout;
        }
        if self.sample_format.is_none() {
            self.sample_format = other.sample_format;
        }
    }
}

/// Subtitle coding parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubtitleParams {
    /// Text encoding label for text-based codings, once known.
    pub encoding: Option<String>,
}

impl SubtitleParams {
    /// Fill unknown fields from `other` without clobbering known ones.
    pub fn absorb(&mut self, other: &SubtitleParams) {
        if self.encoding.is_none() {
            self.encoding = other.encoding.clone();
        }
    }
}

/// Kind-specific coding parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecParams {
    /// Video stream parameters.
    Video(VideoParams),
    /// Audio stream parameters.
    Audio(AudioParams),
    /// Subtitle stream parameters.
    Subtitle(SubtitleParams),
}

impl CodecParams {
    /// The video parameters, if this is a video descriptor.
    pub fn video(&self) -> Option<&VideoParams> {
        match self {
            Self::Video(v) => Some(v),
            _ => None,
        }
    }

    /// The audio parameters, if this is an audio descriptor.
    pub fn audio(&self) -> Option<&AudioParams> {
        match self {
            Self::Audio(a) => Some(a),
            _ => None,
        }
    }

    /// The subtitle parameters, if this is a subtitle descriptor.
    pub fn subtitle(&self) -> Option<&SubtitleParams> {
        match self {
            Self::Subtitle(s) => Some(s),
            _ => None,
        }
    }
}

/// A stream format descriptor: the coding parameters negotiated between the
/// host and a codec module for one side (input or output) of a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamFormat {
    /// Stream coding.
    pub codec: CodecId,
    /// Kind-specific parameters.
    pub params: CodecParams,
    /// Average bitrate in bits per second, once known.
    pub bitrate: Option<u32>,
    /// Codec-specific configuration data (parameter sets, magic cookies).
    pub extra_data: Vec<u8>,
}

impl StreamFormat {
    /// Create a video descriptor.
    pub fn video(codec: CodecId, params: VideoParams) -> Self {
        Self {
            codec,
            params: CodecParams::Video(params),
            bitrate: None,
            extra_data: Vec::new(),
        }
    }

    /// Create an audio descriptor.
    pub fn audio(codec: CodecId, params: AudioParams) -> Self {
        Self {
            codec,
            params: CodecParams::Audio(params),
            bitrate: None,
            extra_data: Vec::new(),
        }
    }

    /// Create a subtitle descriptor.
    pub fn subtitle(codec: CodecId, params: SubtitleParams) -> Self {
        Self {
            codec,
            params: CodecParams::Subtitle(params),
            bitrate: None,
            extra_data: Vec::new(),
        }
    }

    /// Attach codec-specific configuration data.
    pub fn with_extra_data(mut self, data: Vec<u8>) -> Self {
        self.extra_data = data;
        self
    }

    /// Fill unknown fields from `other` without clobbering known ones.
    ///
    /// Used on the input side as a module discovers coding parameters
    /// mid-stream. Mismatched kinds are left untouched.
    pub fn absorb(&mut self, other: &StreamFormat) {
        match (&mut self.params, &other.params) {
            (CodecParams::Video(a), CodecParams::Video(b)) => a.absorb(b),
            (CodecParams::Audio(a), CodecParams::Audio(b)) => a.absorb(b),
            (CodecParams::Subtitle(a), CodecParams::Subtitle(b)) => a.absorb(b),
            _ => return,
        }
        if self.codec == CodecId::Unknown {
            self.codec = other.codec;
        }
        if self.bitrate.is_none() {
            self.bitrate = other.bitrate;
        }
        if self.extra_data.is_empty() {
            self.extra_data = other.extra_data.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_params_completeness() {
        let mut p = VideoParams::default();
        assert!(!p.is_complete());
        p.absorb(&VideoParams::new(1280, 720, PixelFormat::Yuv420p));
        assert!(p.is_complete());
    }

    #[test]
    fn test_absorb_keeps_known_fields() {
        let mut p = VideoParams::new(1920, 1080, PixelFormat::Nv12);
        p.absorb(&VideoParams::new(640, 480, PixelFormat::Yuv420p));
        assert_eq!(p.width, 1920);
        assert_eq!(p.pixel_format, Some(PixelFormat::Nv12));
    }

    #[test]
    fn test_stream_format_absorb() {
        let mut fmt = StreamFormat::audio(CodecId::Unknown, AudioParams::default());
        let discovered = StreamFormat::audio(
            CodecId::Aac,
            AudioParams::new(48000, ChannelLayout::Stereo, SampleFormat::S16),
        )
        .with_extra_data(vec![0x12, 0x10]);
        fmt.absorb(&discovered);
        assert_eq!(fmt.codec, CodecId::Aac);
        assert!(fmt.params.audio().unwrap().is_complete());
        assert_eq!(fmt.extra_data, vec![0x12, 0x10]);
    }

    #[test]
    fn test_absorb_kind_mismatch_is_noop() {
        let mut fmt = StreamFormat::video(CodecId::H264, VideoParams::default());
        let other = StreamFormat::audio(
            CodecId::Aac,
            AudioParams::new(44100, ChannelLayout::Mono, SampleFormat::F32),
        );
        fmt.absorb(&other);
        assert_eq!(fmt.codec, CodecId::H264);
        assert!(fmt.params.video().is_some());
    }
}
