//! Transport collaborator boundary.
//!
//! The SDK never opens sockets itself. A host supplies something that can
//! ship a fully framed byte buffer ([`Transport`]) and feeds inbound bytes
//! and lifecycle changes back through [`crate::connection::Connection`].
//! WebSocket wiring, reconnect policy and retry all live on the host side
//! of this seam.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Failure at the transport boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying connection is closed; nothing can be written.
    #[error("transport closed")]
    Closed,

    /// The write failed with an I/O error.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound half of the byte-stream collaborator.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ship one fully framed buffer to the peer.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the frame could not be written.
    async fn send(&self, frame: Bytes) -> Result<(), TransportError>;
}

/// Lifecycle and data events a host forwards from its transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// The stream is established.
    Connected,
    /// The stream closed; in-flight calls will not complete.
    Disconnected,
    /// The transport reported a failure.
    Error(TransportError),
}
