//! Primitive value codecs for the wire protocol.
//!
//! The codec layer owns the byte-level representation of every value the
//! protocol can carry: fixed-width scalars, UTF-8 strings, and homogeneous
//! arrays of both. Higher layers (the tagged-field table and the struct
//! codec) never touch raw bytes directly; they drive these entry points.
//!
//! # Error Handling
//!
//! Every failure is a typed [`CodecError`] carrying identifying context
//! (field id, expected versus actual size). Errors are returned, never
//! panicked, and convert into `std::io::Error` where `tokio_util` codecs
//! require it.

pub mod error;
pub mod primitive;

pub use error::CodecError;
pub use primitive::{
    Scalar,
    decode_scalar,
    decode_scalar_array,
    decode_str,
    decode_str_array,
    encode_scalar,
    encode_scalar_array,
    encode_str,
    encode_str_array,
};

#[cfg(test)]
mod tests;
