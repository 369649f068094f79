//! Protocol definition seam: signature constant and tagged message dispatch.
//!
//! A [`Protocol`] implementation is the dispatch table keyed by envelope
//! message-type id: it turns `(id, body)` into one variant of a message
//! enum. Discrimination happens once, at decode time, from the envelope id;
//! downstream code matches on the enum exhaustively instead of probing
//! which optional payload happens to be populated.

use crate::codec::CodecError;

/// A concrete wire protocol: one signature, one message enum, one decoder.
pub trait Protocol: Send + Sync + 'static {
    /// Decoded message enum covering every declared message type.
    type Message: Send + 'static;

    /// Protocol/workflow signature every envelope must carry.
    ///
    /// Frames with any other signature are rejected as mismatches.
    const SIGNATURE: u16;

    /// Decode a message body, dispatching on the envelope's message-type
    /// id.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownMessage`] for an undeclared id, or the
    /// body's decode error.
    fn decode_body(id: u32, body: &[u8]) -> Result<Self::Message, CodecError>;
}
