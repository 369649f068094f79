//! Helpers for explicit wire byte-order conversions.
//!
//! The protocol transmits every multi-byte scalar little-endian. These
//! helpers keep Clippy expectations scoped to the conversion points so
//! protocol code can remain explicit about wire endianness without
//! repeating lint annotations.

/// Serialise a `u16` in wire byte order (little-endian).
///
/// # Examples
///
/// ```
/// use tagwire::byte_order::write_wire_u16;
///
/// assert_eq!(write_wire_u16(0x1234), [0x34, 0x12]);
/// ```
#[must_use]
pub fn write_wire_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Wire byte order requires little-endian bytes."
    )]
    value.to_le_bytes()
}

/// Parse a wire-order `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use tagwire::byte_order::read_wire_u16;
///
/// assert_eq!(read_wire_u16([0x34, 0x12]), 0x1234);
/// ```
#[must_use]
pub fn read_wire_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Wire byte order requires little-endian bytes."
    )]
    u16::from_le_bytes(bytes)
}

/// Serialise a `u32` in wire byte order (little-endian).
///
/// # Examples
///
/// ```
/// use tagwire::byte_order::write_wire_u32;
///
/// assert_eq!(write_wire_u32(0x1234_5678), [0x78, 0x56, 0x34, 0x12]);
/// ```
#[must_use]
pub fn write_wire_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Wire byte order requires little-endian bytes."
    )]
    value.to_le_bytes()
}

/// Parse a wire-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use tagwire::byte_order::read_wire_u32;
///
/// assert_eq!(read_wire_u32([0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_wire_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Wire byte order requires little-endian bytes."
    )]
    u32::from_le_bytes(bytes)
}

/// Serialise a `u64` in wire byte order (little-endian).
///
/// # Examples
///
/// ```
/// use tagwire::byte_order::write_wire_u64;
///
/// assert_eq!(
///     write_wire_u64(0x1122_3344_5566_7788),
///     [0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]
/// );
/// ```
#[must_use]
pub fn write_wire_u64(value: u64) -> [u8; 8] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Wire byte order requires little-endian bytes."
    )]
    value.to_le_bytes()
}

/// Parse a wire-order `u64` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use tagwire::byte_order::read_wire_u64;
///
/// assert_eq!(
///     read_wire_u64([0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11]),
///     0x1122_3344_5566_7788
/// );
/// ```
#[must_use]
pub fn read_wire_u64(bytes: [u8; 8]) -> u64 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "Wire byte order requires little-endian bytes."
    )]
    u64::from_le_bytes(bytes)
}
