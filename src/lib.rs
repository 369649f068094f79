//! Public API for the `tagwire` client SDK.
//!
//! This crate provides the building blocks for speaking a tagged-field
//! binary messaging protocol over a host-supplied byte stream: primitive
//! and struct codecs, envelope framing, a resumable streaming reader,
//! sequence-correlated request/response calls, and broadcast routing.
//!
//! Layering, leaves first: [`codec`] owns byte-level value encoding,
//! [`storage`] the self-describing tagged-field scan, [`message`] the
//! generic struct codec, [`envelope`] and [`reader`] the wire framing, and
//! [`connection`]/[`request`] the correlation state machines. [`proto`]
//! holds the concrete chat workflow definitions.

pub mod byte_order;
pub mod codec;
pub mod connection;
pub mod envelope;
pub mod message;
pub mod proto;
pub mod protocol;
pub mod reader;
pub mod request;
pub mod storage;
pub mod transport;

pub use codec::CodecError;
pub use connection::{CallError, Connection};
pub use envelope::{BROADCAST_SEQUENCE, Envelope, FrameHeader, HEADER_LEN, pack};
pub use message::{FieldReader, FieldWriter, WireMessage, WireUnion};
pub use protocol::Protocol;
pub use reader::{FrameError, FrameReader, Inbound};
pub use request::{Exchange, Reply, Request, RequestError};
pub use storage::{FieldTable, SizeRank};
pub use transport::{Transport, TransportError, TransportEvent};
