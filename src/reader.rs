//! Push-style streaming reader turning raw chunks into decoded messages.
//!
//! Transports deliver bytes in arbitrary slices; one envelope may straddle
//! two chunks and one chunk may carry several envelopes. [`FrameReader`]
//! accumulates whatever arrives, drains every complete frame, and queues
//! the decoded messages in arrival order. [`FrameReader::push`] is
//! synchronous and never blocks waiting for bytes, so it is safe to drive
//! from an event-driven transport callback.
//!
//! Per-frame failures (signature mismatch, body decode error) are collected
//! and returned without stopping the scan; later frames in the same chunk
//! still decode. Framing failures (an oversized length) poison the stream
//! position and are fatal.

use std::collections::VecDeque;

use bytes::BytesMut;
use thiserror::Error;
use tokio_util::codec::Decoder;

use crate::{
    codec::CodecError,
    envelope::{EnvelopeDecoder, FrameHeader},
    protocol::Protocol,
};

/// Per-frame or stream-level failure reported by [`FrameReader::push`].
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame's signature did not match the protocol's.
    ///
    /// The frame is skipped; the stream continues.
    #[error(
        "signature mismatch on message {id} (sequence {sequence}): expected {expected:#06x}, got \
         {actual:#06x}"
    )]
    SignatureMismatch {
        /// Signature the protocol requires.
        expected: u16,
        /// Signature carried by the frame.
        actual: u16,
        /// Message-type id of the rejected frame.
        id: u32,
        /// Sequence of the rejected frame.
        sequence: u32,
    },

    /// The frame's body failed to decode.
    ///
    /// The frame is skipped; the stream continues.
    #[error("body decode failed on message {id} (sequence {sequence}): {source}")]
    Body {
        /// Message-type id of the failing frame.
        id: u32,
        /// Sequence of the failing frame.
        sequence: u32,
        /// Underlying codec failure.
        source: CodecError,
    },

    /// The framing layer itself failed; no further frames can be extracted.
    #[error("framing failed: {0}")]
    Framing(std::io::Error),
}

/// A decoded inbound frame: header context plus the typed message.
#[derive(Clone, Debug)]
pub struct Inbound<M> {
    /// Envelope header the message arrived under.
    pub header: FrameHeader,
    /// Decoded protocol message.
    pub message: M,
}

/// Accumulating frame reader for one inbound byte stream.
pub struct FrameReader<P: Protocol> {
    buffer: BytesMut,
    decoder: EnvelopeDecoder,
    ready: VecDeque<Inbound<P::Message>>,
}

impl<P: Protocol> Default for FrameReader<P> {
    fn default() -> Self { Self::new(EnvelopeDecoder::default()) }
}

impl<P: Protocol> FrameReader<P> {
    /// Construct a reader over the given envelope decoder.
    #[must_use]
    pub fn new(decoder: EnvelopeDecoder) -> Self {
        Self {
            buffer: BytesMut::new(),
            decoder,
            ready: VecDeque::new(),
        }
    }

    /// Append a chunk and drain every complete frame it completes.
    ///
    /// Returns the per-frame errors encountered, in stream order. An empty
    /// vector means every completed frame decoded cleanly; frames still
    /// awaiting bytes are not errors.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<FrameError> {
        self.buffer.extend_from_slice(chunk);
        let mut errors = Vec::new();
        loop {
            match self.decoder.decode(&mut self.buffer) {
                Ok(Some(envelope)) => {
                    let header = envelope.header;
                    if header.signature != P::SIGNATURE {
                        tracing::warn!(
                            id = header.id,
                            sequence = header.sequence,
                            actual = header.signature,
                            expected = P::SIGNATURE,
                            "rejecting frame with mismatched signature"
                        );
                        errors.push(FrameError::SignatureMismatch {
                            expected: P::SIGNATURE,
                            actual: header.signature,
                            id: header.id,
                            sequence: header.sequence,
                        });
                        continue;
                    }
                    match P::decode_body(header.id, &envelope.body) {
                        Ok(message) => self.ready.push_back(Inbound { header, message }),
                        Err(source) => errors.push(FrameError::Body {
                            id: header.id,
                            sequence: header.sequence,
                            source,
                        }),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    // The length prefix cannot be trusted, so the remaining
                    // buffered bytes have no usable frame boundary.
                    self.buffer.clear();
                    errors.push(FrameError::Framing(e));
                    break;
                }
            }
        }
        errors
    }

    /// Pop the oldest decoded message, preserving arrival order.
    pub fn next(&mut self) -> Option<Inbound<P::Message>> { self.ready.pop_front() }

    /// Number of decoded messages awaiting [`FrameReader::next`].
    #[must_use]
    pub fn pending(&self) -> usize { self.ready.len() }

    /// Bytes buffered awaiting a complete frame.
    #[must_use]
    pub fn buffered(&self) -> usize { self.buffer.len() }
}
