//! Message envelope: the fixed 26-byte header wrapping every wire message.
//!
//! Layout, little-endian throughout:
//!
//! ```text
//! id:u32 | signature:u16 | sequence:u32 | timestamp_ms:u64 | length:u64 | body
//! ```
//!
//! [`EnvelopeDecoder`] and [`EnvelopeEncoder`] implement the `tokio_util`
//! codec traits so the framing composes with any byte stream; the decoder
//! is resumable and returns `None` whenever the buffered bytes do not yet
//! hold a complete frame.

use std::{
    io,
    time::{SystemTime, UNIX_EPOCH},
};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    byte_order::{
        read_wire_u16,
        read_wire_u32,
        read_wire_u64,
        write_wire_u16,
        write_wire_u32,
        write_wire_u64,
    },
    codec::CodecError,
    message::WireMessage,
};

/// Exact byte length of the envelope header.
pub const HEADER_LEN: usize = 26;

/// Sequence value reserved for fire-and-forget and broadcast frames.
pub const BROADCAST_SEQUENCE: u32 = 0;

/// Minimum accepted maximum-frame-length setting.
pub const MIN_FRAME_LENGTH: usize = 64;

/// Maximum accepted maximum-frame-length setting (16 MiB).
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
}

/// Decoded envelope header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Message-type id used for dispatch.
    pub id: u32,
    /// Protocol/workflow signature.
    pub signature: u16,
    /// Correlation sequence; [`BROADCAST_SEQUENCE`] for unsolicited frames.
    pub sequence: u32,
    /// Sender timestamp in epoch milliseconds.
    pub timestamp_ms: u64,
    /// Body length in bytes.
    pub length: u64,
}

impl FrameHeader {
    /// Parse a header from exactly [`HEADER_LEN`] bytes.
    #[must_use]
    pub fn parse(src: &[u8; HEADER_LEN]) -> Self {
        Self {
            id: read_wire_u32([src[0], src[1], src[2], src[3]]),
            signature: read_wire_u16([src[4], src[5]]),
            sequence: read_wire_u32([src[6], src[7], src[8], src[9]]),
            timestamp_ms: read_wire_u64([
                src[10], src[11], src[12], src[13], src[14], src[15], src[16], src[17],
            ]),
            length: read_wire_u64([
                src[18], src[19], src[20], src[21], src[22], src[23], src[24], src[25],
            ]),
        }
    }

    /// Append the header's wire form to `dst`.
    pub fn write(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_LEN);
        dst.put_slice(&write_wire_u32(self.id));
        dst.put_slice(&write_wire_u16(self.signature));
        dst.put_slice(&write_wire_u32(self.sequence));
        dst.put_slice(&write_wire_u64(self.timestamp_ms));
        dst.put_slice(&write_wire_u64(self.length));
    }
}

/// One complete wire frame: header plus body bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Frame header.
    pub header: FrameHeader,
    /// Raw body bytes, exactly `header.length` long.
    pub body: Bytes,
}

/// Wrap an encoded message body in an envelope, stamping the current time.
///
/// Packing is all-or-nothing: if the inner encode fails, nothing is
/// produced.
///
/// # Errors
///
/// Returns the message's encode error.
pub fn pack<M: WireMessage>(
    message: &M,
    signature: u16,
    sequence: u32,
) -> Result<Bytes, CodecError> {
    let body = message.encode()?;
    let header = FrameHeader {
        id: M::MESSAGE_ID,
        signature,
        sequence,
        timestamp_ms: epoch_millis(),
        length: body.len() as u64,
    };
    let mut out = BytesMut::with_capacity(HEADER_LEN + body.len());
    header.write(&mut out);
    out.extend_from_slice(&body);
    Ok(out.freeze())
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Resumable envelope decoder for a byte stream.
#[derive(Clone, Debug)]
pub struct EnvelopeDecoder {
    max_frame_length: usize,
}

impl EnvelopeDecoder {
    /// Construct a decoder with a clamped maximum frame length.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            max_frame_length: clamp_frame_length(max_frame_length),
        }
    }

    /// Maximum body length this decoder will accept.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }
}

impl Default for EnvelopeDecoder {
    fn default() -> Self { Self::new(MAX_FRAME_LENGTH) }
}

impl Decoder for EnvelopeDecoder {
    type Item = Envelope;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }
        let header_bytes: [u8; HEADER_LEN] = src[..HEADER_LEN]
            .try_into()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "header slice"))?;
        let header = FrameHeader::parse(&header_bytes);
        let body_len = usize::try_from(header.length)
            .ok()
            .filter(|len| *len <= self.max_frame_length)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "frame body of {} bytes exceeds max {}",
                        header.length, self.max_frame_length
                    ),
                )
            })?;
        if src.len() < HEADER_LEN + body_len {
            // Frame straddles chunks; wait for more bytes.
            src.reserve(HEADER_LEN + body_len - src.len());
            return Ok(None);
        }
        src.advance(HEADER_LEN);
        let body = src.split_to(body_len).freeze();
        Ok(Some(Envelope { header, body }))
    }
}

/// Envelope encoder counterpart, for symmetry with the decoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvelopeEncoder;

impl Encoder<Envelope> for EnvelopeEncoder {
    type Error = io::Error;

    fn encode(&mut self, item: Envelope, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.header.length != item.body.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "header length {} disagrees with body length {}",
                    item.header.length,
                    item.body.len()
                ),
            ));
        }
        dst.reserve(HEADER_LEN + item.body.len());
        item.header.write(dst);
        dst.extend_from_slice(&item.body);
        Ok(())
    }
}
