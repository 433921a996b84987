//! Error types for the framing core.
//!
//! The taxonomy separates envelope-level failures from body-level ones:
//!
//! - [`FrameError`]: wire-level issues with the frame envelope (unsupported
//!   version byte, oversized or overlong bodies).
//! - [`BodyError`]: malformed message bodies (truncated notations, invalid
//!   UTF-8, unrecognised protocol constants).
//! - [`CodecError`]: top-level enum wrapping both, plus the unknown-opcode
//!   failure raised when a peer sends an opcode outside the registered set.
//!
//! Unknown opcodes and malformed bodies originate across the network
//! boundary and are reportable: the caller decides whether they terminate
//! the connection. Programmer errors (encoding a request kind under a
//! protocol version that does not support it) are not represented here —
//! they panic at the dispatch site.

use std::io;

use thiserror::Error;

/// Envelope-level errors occurring while reading or writing a frame header.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Version byte outside the supported set {1, 2}.
    #[error("unsupported protocol version: {version}")]
    UnsupportedVersion {
        /// Version number carried by the frame header, direction bit
        /// stripped.
        version: u8,
    },

    /// Body length prefix exceeds the configured maximum.
    #[error("frame body exceeds max length: {size} > {max}")]
    OversizedBody {
        /// Body size declared by the length prefix.
        size: usize,
        /// Maximum allowed body size.
        max: usize,
    },

    /// Body too large to express in the 32-bit length prefix.
    #[error("frame body too long for length prefix: {size} bytes")]
    BodyTooLong {
        /// Actual body size in bytes.
        size: usize,
    },
}

/// Errors decoding the content of a message body.
///
/// These indicate a malformed or truncated body after the envelope was
/// successfully read.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BodyError {
    /// A notation read ran past the available bytes.
    #[error("body underflow: need {need} bytes, {remaining} remaining")]
    Underflow {
        /// Bytes the notation required.
        need: usize,
        /// Bytes left in the body.
        remaining: usize,
    },

    /// A `[string]` notation carried invalid UTF-8.
    #[error("invalid UTF-8 in string notation")]
    InvalidUtf8,

    /// A length prefix was negative where absence is not meaningful.
    #[error("negative length prefix: {len}")]
    NegativeLength {
        /// The length read off the wire.
        len: i32,
    },

    /// A `[consistency]` notation carried an unrecognised code.
    #[error("unknown consistency code: {code:#06x}")]
    UnknownConsistency {
        /// The code read off the wire.
        code: u16,
    },

    /// A RESULT body carried an unrecognised result kind.
    #[error("unknown result kind: {kind}")]
    UnknownResultKind {
        /// The kind discriminant read off the wire.
        kind: i32,
    },

    /// An EVENT body carried an unrecognised event type name.
    #[error("unknown event type: {name:?}")]
    UnknownEventType {
        /// The event type string read off the wire.
        name: String,
    },

    /// An `[inet]` notation carried an address length other than 4 or 16.
    #[error("invalid inet address length: {len}")]
    InvalidInetLength {
        /// The address length byte read off the wire.
        len: u8,
    },
}

/// Top-level decode failure surfaced to the caller of the protocol codec.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Response opcode outside the registered set.
    ///
    /// Triggerable by a malformed or version-mismatched peer, so this is a
    /// reportable protocol error rather than a panic.
    #[error("unknown response opcode: {opcode:#04x}")]
    UnknownOpcode {
        /// The opcode read from the frame header.
        opcode: u8,
    },

    /// Envelope-level failure.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Malformed message body.
    #[error("body error: {0}")]
    Body(#[from] BodyError),
}

impl CodecError {
    /// Returns the error category as a string for logging.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::UnknownOpcode { .. } => "opcode",
            Self::Frame(_) => "frame",
            Self::Body(_) => "body",
        }
    }
}

impl From<FrameError> for io::Error {
    fn from(err: FrameError) -> Self { io::Error::new(io::ErrorKind::InvalidData, err) }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self { io::Error::new(io::ErrorKind::InvalidData, err) }
}
