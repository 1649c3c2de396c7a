//! # Codecbridge Core
//!
//! Core types for the codecbridge host/codec-module contract.
//!
//! This crate provides the building blocks shared by hosts and codec modules:
//! - Error handling types
//! - Timestamp and time base management
//! - Stream format descriptors (input and output sides)
//! - Input units and encoded byte-stream units ([`Block`])
//! - Decoded payload buffers ([`Picture`], [`AudioBuffer`], [`Subpicture`])
//! - Reference-counted buffer handles and the pools that back them
//! - Out-of-band stream attachments

pub mod attachment;
pub mod audio;
pub mod block;
pub mod error;
pub mod format;
pub mod handle;
pub mod picture;
pub mod pool;
pub mod rational;
pub mod subpicture;
pub mod timestamp;

pub use attachment::Attachment;
pub use audio::{AudioBuffer, ChannelLayout, SampleFormat};
pub use block::{Block, BlockFlags, OwnedBlock};
pub use error::{CodecError, Error, Result};
pub use format::{AudioParams, CodecId, CodecParams, StreamFormat, SubtitleParams, VideoParams};
pub use handle::{BufferLease, BufferRef};
pub use picture::{Picture, PictureFlags, PixelFormat};
pub use pool::{AudioPool, PicturePool, SubpicturePool};
pub use rational::Rational;
pub use subpicture::{Subpicture, SubpictureRegion};
pub use timestamp::{Duration, TimeBase, Timestamp};
