//! Error kinds for BSON serialization and deserialization.

use thiserror::Error;

/// Malformed-bytes subkinds produced while reading a BSON document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unknown BSON element type: 0x{0:02x}")]
    UnknownTag(u8),

    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("{0} is missing its trailing NUL terminator")]
    MissingNulTerminator(&'static str),

    #[error("document declares length {declared} but only {available} bytes are available")]
    LengthMismatch { declared: i64, available: usize },

    #[error("embedded document length overruns its parent document")]
    LengthOverrun,
}

/// Errors produced by [`crate::serialize`] and [`crate::deserialize`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// `check_keys` rejected a key: it starts with `$` or contains `.`.
    #[error("key {0:?} must not start with '$' or contain '.'")]
    InvalidName(String),

    /// A byte range required to be UTF-8 was not, on a path where the
    /// check is actually reachable (see `src/utf8.rs`).
    #[error("invalid UTF-8 encoding in {0}")]
    InvalidStringEncoding(&'static str),

    /// A key or regex pattern contained a NUL byte, or the encoded
    /// document exceeded the 4MiB top-level size ceiling.
    #[error("{0}")]
    InvalidDocument(String),

    /// An integer value does not fit in BSON's signed 64-bit range.
    #[error("integer {0} is outside the range representable by BSON Int64")]
    RangeError(i128),

    /// A key was not a string or symbol.
    #[error("keys must be strings or symbols, found {0}")]
    TypeError(&'static str),

    /// Malformed input bytes during decoding.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The byte buffer could not grow: the allocator is exhausted.
    #[error("out of memory while growing the BSON encode buffer")]
    OutOfMemory,
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
