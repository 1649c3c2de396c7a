//! Error types for the codecbridge contract.
//!
//! Pool exhaustion is deliberately *not* part of this hierarchy: an empty
//! acquisition is signalled by `None` and handled as backpressure by the
//! caller (see [`crate::pool`]).

use thiserror::Error;

/// Main error type for the codecbridge contract.
#[derive(Error, Debug)]
pub enum Error {
    /// Codec errors (decoding/encoding/packetizing).
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Invalid parameter provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unsupported feature or format.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// End of stream reached.
    #[error("End of stream")]
    EndOfStream,
}

/// Codec errors.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Module not bound or not initialized for this stream.
    #[error("Codec not initialized")]
    NotInitialized,

    /// Decoder configuration error.
    #[error("Decoder configuration error: {0}")]
    DecoderConfig(String),

    /// Encoder configuration error.
    #[error("Encoder configuration error: {0}")]
    EncoderConfig(String),

    /// Corrupted input data.
    #[error("Corrupt input at offset {offset}")]
    CorruptInput { offset: u64 },

    /// Input unit does not match the negotiated input format.
    #[error("Format mismatch: {0}")]
    FormatMismatch(String),

    /// Generic codec error message.
    #[error("{0}")]
    Other(String),
}

impl From<String> for CodecError {
    fn from(s: String) -> Self {
        CodecError::Other(s)
    }
}

impl From<&str> for CodecError {
    fn from(s: &str) -> Self {
        CodecError::Other(s.to_string())
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Check if this is an end-of-stream error.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::EndOfStream)
    }

    /// Check if this error is recoverable (processing may continue with the
    /// next input unit).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Codec(CodecError::CorruptInput { .. })
                | Error::Codec(CodecError::FormatMismatch(_))
        )
    }
}
