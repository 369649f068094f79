//! Tagged-field table: the self-describing layout inside every struct body.
//!
//! Each field travels as `(id: u16, rank: u8, size: u{rank}, payload)`.
//! The rank byte selects the width of the size value (8, 16, 32 or 64 bits),
//! so small fields pay one size byte while large ones can still describe
//! payloads beyond 4 GiB. Because every record is self-describing, a decoder
//! can skip ids it does not declare, which is what gives the format its
//! forward and backward compatibility: new optional fields never break old
//! readers, and one generic scan replaces per-struct fixed offsets.
//!
//! The id width (u16) and rank width (u8) are fixed protocol constants.

use std::collections::HashMap;

use bytes::{BufMut, BytesMut};

use crate::{
    byte_order::{read_wire_u16, read_wire_u32, read_wire_u64, write_wire_u16},
    codec::CodecError,
};

/// Width class of a tagged field's size value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeRank {
    /// Size is a `u8`.
    U8,
    /// Size is a little-endian `u16`.
    U16,
    /// Size is a little-endian `u32`.
    U32,
    /// Size is a little-endian `u64`.
    U64,
}

impl SizeRank {
    /// Smallest rank whose size value can represent `len`.
    #[must_use]
    pub fn for_len(len: usize) -> Self {
        match len as u64 {
            0..=0xFF => Self::U8,
            0x100..=0xFFFF => Self::U16,
            0x1_0000..=0xFFFF_FFFF => Self::U32,
            _ => Self::U64,
        }
    }

    /// Wire value of the rank byte.
    #[must_use]
    pub const fn wire_value(self) -> u8 {
        match self {
            Self::U8 => 8,
            Self::U16 => 16,
            Self::U32 => 32,
            Self::U64 => 64,
        }
    }

    /// Byte width of the size value this rank selects.
    #[must_use]
    pub const fn size_width(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }

    fn from_wire(id: u16, byte: u8) -> Result<Self, CodecError> {
        match byte {
            8 => Ok(Self::U8),
            16 => Ok(Self::U16),
            32 => Ok(Self::U32),
            64 => Ok(Self::U64),
            rank => Err(CodecError::UnknownSizeRank { id, rank }),
        }
    }
}

/// Append one tagged-field record to `dst`, choosing the smallest rank
/// that fits the payload length.
pub(crate) fn put_field(dst: &mut BytesMut, id: u16, payload: &[u8]) {
    let rank = SizeRank::for_len(payload.len());
    dst.put_slice(&write_wire_u16(id));
    dst.put_u8(rank.wire_value());
    let len = payload.len() as u64;
    #[expect(
        clippy::little_endian_bytes,
        reason = "Wire byte order requires little-endian bytes."
    )]
    match rank {
        SizeRank::U8 => dst.put_u8(len as u8),
        SizeRank::U16 => dst.put_slice(&(len as u16).to_le_bytes()),
        SizeRank::U32 => dst.put_slice(&(len as u32).to_le_bytes()),
        SizeRank::U64 => dst.put_slice(&len.to_le_bytes()),
    }
    dst.put_slice(payload);
}

/// Decoded tagged-field table borrowing payload slices from the source
/// buffer.
///
/// `parse` is a single left-to-right scan that must consume the buffer
/// exactly; `get` is an O(1) lookup that distinguishes an absent id from a
/// present-but-empty payload.
#[derive(Debug, Default)]
pub struct FieldTable<'a> {
    fields: HashMap<u16, &'a [u8]>,
}

impl<'a> FieldTable<'a> {
    /// Scan `src` from offset zero into a field table.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedRecord`] if any record would read past
    /// the end of the buffer, [`CodecError::UnknownSizeRank`] for a rank
    /// byte outside {8, 16, 32, 64}, and [`CodecError::DuplicateField`] if
    /// an id repeats. Trailing bytes are impossible by construction: the
    /// scan only stops at exactly the buffer length.
    pub fn parse(src: &'a [u8]) -> Result<Self, CodecError> {
        let mut fields = HashMap::new();
        let mut offset = 0;
        while offset < src.len() {
            let (id, rank) = read_field_prelude(src, offset)?;
            offset += 3;
            let (size, width) = read_field_size(src, offset, rank)?;
            offset += width;
            let remaining = src.len() - offset;
            if size > remaining {
                return Err(CodecError::TruncatedRecord {
                    need: size,
                    have: remaining,
                });
            }
            if fields.insert(id, &src[offset..offset + size]).is_some() {
                return Err(CodecError::DuplicateField { id });
            }
            offset += size;
        }
        Ok(Self { fields })
    }

    /// Look up the payload for `id`.
    ///
    /// `None` means the id is absent; `Some(&[])` means the field was
    /// present with an empty payload (the wire form of an optional field
    /// that carries no value).
    #[must_use]
    pub fn get(&self, id: u16) -> Option<&'a [u8]> { self.fields.get(&id).copied() }

    /// Number of fields in the table.
    #[must_use]
    pub fn len(&self) -> usize { self.fields.len() }

    /// True when the table holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

/// Read the fixed `(id, rank)` prelude of the record starting at `offset`.
fn read_field_prelude(src: &[u8], offset: usize) -> Result<(u16, SizeRank), CodecError> {
    let remaining = src.len() - offset;
    if remaining < 3 {
        return Err(CodecError::TruncatedRecord {
            need: 3,
            have: remaining,
        });
    }
    let id = read_wire_u16([src[offset], src[offset + 1]]);
    let rank = SizeRank::from_wire(id, src[offset + 2])?;
    Ok((id, rank))
}

/// Read the size value at `offset`, returning `(size, width_consumed)`.
fn read_field_size(src: &[u8], offset: usize, rank: SizeRank) -> Result<(usize, usize), CodecError> {
    let width = rank.size_width();
    let remaining = src.len() - offset;
    if remaining < width {
        return Err(CodecError::TruncatedRecord {
            need: width,
            have: remaining,
        });
    }
    let bytes = &src[offset..offset + width];
    let size = match rank {
        SizeRank::U8 => u64::from(bytes[0]),
        SizeRank::U16 => u64::from(read_wire_u16([bytes[0], bytes[1]])),
        SizeRank::U32 => u64::from(read_wire_u32([bytes[0], bytes[1], bytes[2], bytes[3]])),
        SizeRank::U64 => read_wire_u64([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]),
    };
    let size = usize::try_from(size).map_err(|_| CodecError::TruncatedRecord {
        need: usize::MAX,
        have: src.len() - offset - width,
    })?;
    Ok((size, width))
}
