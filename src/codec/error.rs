//! Error types for the codec layer.
//!
//! This module provides a structured error taxonomy covering every
//! encode/decode failure in the crate: primitive-value errors, tagged-field
//! scan errors, and struct-level errors. Every variant carries the context
//! a caller needs to identify the failing value (field id, expected versus
//! actual size) without re-parsing the buffer.
//!
//! Codec errors are always returned as values from the failing call; they
//! are never thrown across an async boundary implicitly.

use std::io;

use thiserror::Error;

/// Failures raised while encoding or decoding wire values.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A fixed-width scalar was given a slice of the wrong length.
    #[error("scalar width mismatch: expected {expected} bytes, got {actual}")]
    WidthMismatch {
        /// Byte length the scalar requires.
        expected: usize,
        /// Byte length actually supplied.
        actual: usize,
    },

    /// A numeric value was rejected by validation before encoding.
    ///
    /// Floats reject NaN and the infinities; integer ranges are enforced by
    /// the Rust types themselves.
    #[error("value out of range for {kind}: {detail}")]
    OutOfRange {
        /// Name of the wire type that rejected the value.
        kind: &'static str,
        /// Human-readable description of the offending value.
        detail: String,
    },

    /// A boolean byte was neither 0 nor 1.
    #[error("invalid boolean byte: {byte:#04x}")]
    InvalidBool {
        /// Byte actually found on the wire.
        byte: u8,
    },

    /// A string payload was not valid UTF-8.
    #[error("invalid UTF-8 in string payload at byte {valid_up_to}")]
    Utf8 {
        /// Number of valid bytes preceding the failure.
        valid_up_to: usize,
    },

    /// A scalar-array payload was not a whole multiple of the element width.
    #[error("array payload of {len} bytes is not a multiple of element width {width}")]
    RaggedArray {
        /// Total payload length.
        len: usize,
        /// Fixed element width.
        width: usize,
    },

    /// A length-prefixed record claimed more bytes than remain in the buffer.
    #[error("truncated record: need {need} bytes, {have} remain")]
    TruncatedRecord {
        /// Bytes the record requires.
        need: usize,
        /// Bytes actually remaining.
        have: usize,
    },

    /// A tagged-field size rank byte was not one of 8, 16, 32 or 64.
    #[error("unknown size rank {rank} for field {id}")]
    UnknownSizeRank {
        /// Field id whose rank byte was invalid.
        id: u16,
        /// Rank byte actually found.
        rank: u8,
    },

    /// The same field id appeared twice within one struct.
    #[error("duplicate field id {id}")]
    DuplicateField {
        /// Offending field id.
        id: u16,
    },

    /// A declared-required field was absent from the tagged-field table.
    #[error("missing required field {id}")]
    MissingField {
        /// Field id that was expected.
        id: u16,
    },

    /// A tagged union carried a variant id outside its declared set.
    #[error("unknown union variant {id}")]
    UnknownVariant {
        /// Variant id actually found on the wire.
        id: u16,
    },

    /// The envelope carried a message-type id the protocol does not declare.
    #[error("unknown message id {id}")]
    UnknownMessage {
        /// Envelope message-type id that was not recognised.
        id: u32,
    },
}

impl CodecError {
    /// Returns the error category as a string for logging.
    ///
    /// One of: `"width"`, `"range"`, `"bool"`, `"utf8"`, `"array"`,
    /// `"truncated"`, `"rank"`, `"duplicate"`, `"missing"`, `"variant"`,
    /// or `"message"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::WidthMismatch { .. } => "width",
            Self::OutOfRange { .. } => "range",
            Self::InvalidBool { .. } => "bool",
            Self::Utf8 { .. } => "utf8",
            Self::RaggedArray { .. } => "array",
            Self::TruncatedRecord { .. } => "truncated",
            Self::UnknownSizeRank { .. } => "rank",
            Self::DuplicateField { .. } => "duplicate",
            Self::MissingField { .. } => "missing",
            Self::UnknownVariant { .. } => "variant",
            Self::UnknownMessage { .. } => "message",
        }
    }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self { io::Error::new(io::ErrorKind::InvalidData, err) }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
