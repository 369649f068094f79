//! Fixed-width scalar and variable-length string codecs.
//!
//! Every protocol scalar is little-endian on the wire with a fixed byte
//! width; strings travel as raw UTF-8 whose length is carried by the
//! surrounding tagged-field or array-element frame. The [`Scalar`] trait is
//! the single seam the generic struct codec drives, so adding a wire type
//! means one `impl` here and nothing else.

use bytes::{BufMut, BytesMut};

use super::error::CodecError;
use crate::byte_order::{
    read_wire_u16,
    read_wire_u32,
    read_wire_u64,
    write_wire_u16,
    write_wire_u32,
    write_wire_u64,
};

/// Fixed-width wire scalar.
///
/// Implementations encode into exactly [`Scalar::WIDTH`] bytes and decode
/// from exactly that many. [`Scalar::validate`] runs before every encode;
/// the float implementations use it to reject NaN and the infinities.
pub trait Scalar: Copy + PartialEq + std::fmt::Debug + Sized {
    /// Exact encoded width in bytes.
    const WIDTH: usize;

    /// Name used in error context.
    const NAME: &'static str;

    /// Append the little-endian encoding of `self` to `dst`.
    fn put(self, dst: &mut BytesMut);

    /// Decode from a slice of exactly [`Scalar::WIDTH`] bytes.
    ///
    /// Callers must have checked the width; use [`decode_scalar`] for the
    /// checked entry point.
    fn get(src: &[u8]) -> Result<Self, CodecError>;

    /// Reject values with no wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::OutOfRange`] for unrepresentable values.
    fn validate(self) -> Result<(), CodecError> { Ok(()) }
}

macro_rules! int_scalar {
    ($ty:ty, $width:expr) => {
        impl Scalar for $ty {
            const WIDTH: usize = $width;
            const NAME: &'static str = stringify!($ty);

            fn put(self, dst: &mut BytesMut) {
                #[expect(
                    clippy::little_endian_bytes,
                    reason = "Wire byte order requires little-endian bytes."
                )]
                dst.put_slice(&self.to_le_bytes());
            }

            fn get(src: &[u8]) -> Result<Self, CodecError> {
                let bytes: [u8; $width] =
                    src.try_into().map_err(|_| CodecError::WidthMismatch {
                        expected: $width,
                        actual: src.len(),
                    })?;
                #[expect(
                    clippy::little_endian_bytes,
                    reason = "Wire byte order requires little-endian bytes."
                )]
                Ok(<$ty>::from_le_bytes(bytes))
            }
        }
    };
}

int_scalar!(u8, 1);
int_scalar!(i8, 1);
int_scalar!(i16, 2);
int_scalar!(i32, 4);
int_scalar!(i64, 8);

impl Scalar for u16 {
    const WIDTH: usize = 2;
    const NAME: &'static str = "u16";

    fn put(self, dst: &mut BytesMut) { dst.put_slice(&write_wire_u16(self)); }

    fn get(src: &[u8]) -> Result<Self, CodecError> {
        let bytes: [u8; 2] = src.try_into().map_err(|_| CodecError::WidthMismatch {
            expected: 2,
            actual: src.len(),
        })?;
        Ok(read_wire_u16(bytes))
    }
}

impl Scalar for u32 {
    const WIDTH: usize = 4;
    const NAME: &'static str = "u32";

    fn put(self, dst: &mut BytesMut) { dst.put_slice(&write_wire_u32(self)); }

    fn get(src: &[u8]) -> Result<Self, CodecError> {
        let bytes: [u8; 4] = src.try_into().map_err(|_| CodecError::WidthMismatch {
            expected: 4,
            actual: src.len(),
        })?;
        Ok(read_wire_u32(bytes))
    }
}

impl Scalar for u64 {
    const WIDTH: usize = 8;
    const NAME: &'static str = "u64";

    fn put(self, dst: &mut BytesMut) { dst.put_slice(&write_wire_u64(self)); }

    fn get(src: &[u8]) -> Result<Self, CodecError> {
        let bytes: [u8; 8] = src.try_into().map_err(|_| CodecError::WidthMismatch {
            expected: 8,
            actual: src.len(),
        })?;
        Ok(read_wire_u64(bytes))
    }
}

macro_rules! float_scalar {
    ($ty:ty, $width:expr) => {
        impl Scalar for $ty {
            const WIDTH: usize = $width;
            const NAME: &'static str = stringify!($ty);

            fn put(self, dst: &mut BytesMut) {
                #[expect(
                    clippy::little_endian_bytes,
                    reason = "Wire byte order requires little-endian bytes."
                )]
                dst.put_slice(&self.to_le_bytes());
            }

            fn get(src: &[u8]) -> Result<Self, CodecError> {
                let bytes: [u8; $width] =
                    src.try_into().map_err(|_| CodecError::WidthMismatch {
                        expected: $width,
                        actual: src.len(),
                    })?;
                #[expect(
                    clippy::little_endian_bytes,
                    reason = "Wire byte order requires little-endian bytes."
                )]
                Ok(<$ty>::from_le_bytes(bytes))
            }

            fn validate(self) -> Result<(), CodecError> {
                if self.is_finite() {
                    Ok(())
                } else {
                    Err(CodecError::OutOfRange {
                        kind: Self::NAME,
                        detail: format!("{self} is not a finite number"),
                    })
                }
            }
        }
    };
}

float_scalar!(f32, 4);
float_scalar!(f64, 8);

impl Scalar for bool {
    const WIDTH: usize = 1;
    const NAME: &'static str = "bool";

    fn put(self, dst: &mut BytesMut) { dst.put_u8(u8::from(self)); }

    fn get(src: &[u8]) -> Result<Self, CodecError> {
        match src {
            [0] => Ok(false),
            [1] => Ok(true),
            [byte] => Err(CodecError::InvalidBool { byte: *byte }),
            _ => Err(CodecError::WidthMismatch {
                expected: 1,
                actual: src.len(),
            }),
        }
    }
}

/// Encode one scalar, validating it first.
///
/// # Errors
///
/// Returns [`CodecError::OutOfRange`] if the value has no wire
/// representation (for example a non-finite float).
pub fn encode_scalar<T: Scalar>(value: T, dst: &mut BytesMut) -> Result<(), CodecError> {
    value.validate()?;
    value.put(dst);
    Ok(())
}

/// Decode one scalar from a slice that must be exactly [`Scalar::WIDTH`]
/// bytes long.
///
/// # Errors
///
/// Returns [`CodecError::WidthMismatch`] naming the expected and actual
/// lengths when the slice is the wrong size, or the scalar's own decode
/// error (for example [`CodecError::InvalidBool`]).
pub fn decode_scalar<T: Scalar>(src: &[u8]) -> Result<T, CodecError> {
    if src.len() != T::WIDTH {
        return Err(CodecError::WidthMismatch {
            expected: T::WIDTH,
            actual: src.len(),
        });
    }
    T::get(src)
}

/// Encode a homogeneous scalar array as the concatenation of element
/// encodings. The empty array encodes to the empty buffer.
///
/// # Errors
///
/// Returns the first element's validation error, if any.
pub fn encode_scalar_array<T: Scalar>(values: &[T], dst: &mut BytesMut) -> Result<(), CodecError> {
    dst.reserve(values.len() * T::WIDTH);
    for value in values {
        encode_scalar(*value, dst)?;
    }
    Ok(())
}

/// Decode a scalar array by consuming [`Scalar::WIDTH`]-byte records until
/// the buffer is exhausted. The empty buffer decodes to the empty array.
///
/// # Errors
///
/// Returns [`CodecError::RaggedArray`] when the payload is not a whole
/// multiple of the element width.
pub fn decode_scalar_array<T: Scalar>(src: &[u8]) -> Result<Vec<T>, CodecError> {
    if src.len() % T::WIDTH != 0 {
        return Err(CodecError::RaggedArray {
            len: src.len(),
            width: T::WIDTH,
        });
    }
    src.chunks_exact(T::WIDTH).map(T::get).collect()
}

/// Encode a string as its raw UTF-8 bytes. Length is carried by the
/// enclosing tagged field or array-element frame, never by the string
/// itself.
pub fn encode_str(value: &str, dst: &mut BytesMut) { dst.put_slice(value.as_bytes()); }

/// Decode a string from the full given slice.
///
/// # Errors
///
/// Returns [`CodecError::Utf8`] on invalid UTF-8; decoding never panics.
pub fn decode_str(src: &[u8]) -> Result<String, CodecError> {
    std::str::from_utf8(src)
        .map(str::to_owned)
        .map_err(|e| CodecError::Utf8 {
            valid_up_to: e.valid_up_to(),
        })
}

/// Encode an array of strings. Each element is prefixed with its own
/// little-endian u32 byte length, elements concatenated.
///
/// # Errors
///
/// Returns [`CodecError::OutOfRange`] if an element exceeds `u32::MAX`
/// bytes.
pub fn encode_str_array(values: &[String], dst: &mut BytesMut) -> Result<(), CodecError> {
    for value in values {
        let len = u32::try_from(value.len()).map_err(|_| CodecError::OutOfRange {
            kind: "string",
            detail: format!("element of {} bytes exceeds u32 length prefix", value.len()),
        })?;
        len.put(dst);
        encode_str(value, dst);
    }
    Ok(())
}

/// Decode an array of strings by walking length-prefixed records until the
/// outer buffer is exhausted.
///
/// # Errors
///
/// Returns [`CodecError::TruncatedRecord`] when a prefix or element runs
/// past the end of the buffer, or [`CodecError::Utf8`] for an invalid
/// element.
pub fn decode_str_array(src: &[u8]) -> Result<Vec<String>, CodecError> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < src.len() {
        let remaining = &src[offset..];
        if remaining.len() < u32::WIDTH {
            return Err(CodecError::TruncatedRecord {
                need: u32::WIDTH,
                have: remaining.len(),
            });
        }
        let len = decode_scalar::<u32>(&remaining[..u32::WIDTH])? as usize;
        let body = &remaining[u32::WIDTH..];
        if body.len() < len {
            return Err(CodecError::TruncatedRecord {
                need: len,
                have: body.len(),
            });
        }
        out.push(decode_str(&body[..len])?);
        offset += u32::WIDTH + len;
    }
    Ok(out)
}
