//! # Codecbridge Codecs
//!
//! The runtime contract between a media-processing host and pluggable codec
//! modules.
//!
//! ## Trait System
//!
//! One trait per payload kind and direction keeps buffer typing static:
//!
//! - [`VideoDecoder`] / [`AudioDecoder`] / [`SubtitleDecoder`] - decode mode
//! - [`Packetizer`] - packetize-only mode (re-framing, no decoding)
//! - [`VideoEncoder`] / [`AudioEncoder`] / [`SubtitleEncoder`] - encoders
//!
//! Modules never allocate output buffers themselves; they go through the
//! [`DecoderHost`] they are handed on every call, which also carries the
//! auxiliary channels (attachments, display date, display rate).
//!
//! ## Sessions
//!
//! A session binds one module to one stream and enforces the stream-level
//! contract: the packetized-input precondition, output format renegotiation
//! observation, monotonic output timing, and closed-caption bookkeeping.
//!
//! ## Reference Modules
//!
//! The [`raw`] module holds minimal raw/copy implementations that exercise
//! the whole contract without any real compression.

pub mod caption;
pub mod encoder;
pub mod host;
pub mod parallel;
pub mod raw;
pub mod reorder;
pub mod session;
pub mod traits;

pub use caption::CcChannels;
pub use encoder::{EncoderConfig, EncoderModule, EncoderSession};
pub use host::{DecoderHost, PooledHost, RATE_ONE};
pub use parallel::decode_streams;
pub use reorder::{ReorderBuffer, MAX_REORDER_DEPTH};
pub use session::{
    AudioSession, PacketizerSession, StreamBinding, SubtitleSession, VideoSession,
};
pub use traits::{
    AudioDecoder, AudioEncoder, CodecInfo, Packetizer, SubtitleDecoder, SubtitleEncoder,
    VideoDecoder, VideoEncoder,
};
