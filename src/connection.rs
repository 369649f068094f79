//! Connection: sequence correlation and inbound dispatch for one stream.
//!
//! The connection owns the monotonic sequence counter and the map from
//! outstanding sequence numbers to response continuations. An inbound frame
//! whose sequence matches a pending entry resolves that caller; any other
//! frame is an unsolicited broadcast and is routed by message-type id to
//! subscribers. Responses are matched purely by sequence, never by arrival
//! order, so out-of-order replies from the peer still correlate correctly.
//!
//! All shared state is behind atomics, a [`DashMap`], or a mutex, so a
//! multi-threaded host can drive `call` and `handle_data` from different
//! tasks without extra locking.

use std::sync::{
    Arc,
    Mutex,
    PoisonError,
    atomic::{AtomicU32, Ordering},
};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};

use crate::{
    codec::CodecError,
    envelope::{BROADCAST_SEQUENCE, EnvelopeDecoder, pack},
    message::WireMessage,
    protocol::Protocol,
    reader::{FrameError, FrameReader, Inbound},
    transport::{Transport, TransportError, TransportEvent},
};

/// Buffered frames per broadcast subject before slow subscribers lag.
const BROADCAST_CAPACITY: usize = 64;

/// Failure of a correlated request/response call.
#[derive(Debug, Error)]
pub enum CallError {
    /// The chosen sequence already has an outstanding request.
    ///
    /// Rejected before any I/O is attempted.
    #[error("sequence {0} already has an outstanding request")]
    DuplicateSequence(u32),

    /// The request failed to encode; nothing was sent.
    #[error("request encode failed: {0}")]
    Codec(#[from] CodecError),

    /// The transport write failed; the pending entry was cleaned up.
    #[error("transport send failed: {0}")]
    Transport(#[from] TransportError),

    /// The connection closed before the correlated response arrived.
    #[error("connection closed before the response arrived")]
    ConnectionClosed,
}

/// One logical connection speaking protocol `P` over a host transport.
pub struct Connection<P: Protocol> {
    transport: Arc<dyn Transport>,
    sequence: AtomicU32,
    pending: DashMap<u32, oneshot::Sender<Inbound<P::Message>>>,
    broadcasts: DashMap<u32, broadcast::Sender<Inbound<P::Message>>>,
    reader: Mutex<FrameReader<P>>,
}

impl<P: Protocol> Connection<P>
where
    P::Message: Clone,
{
    /// Construct a connection over `transport` with default framing limits.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_decoder(transport, EnvelopeDecoder::default())
    }

    /// Construct a connection with an explicit envelope decoder.
    #[must_use]
    pub fn with_decoder(transport: Arc<dyn Transport>, decoder: EnvelopeDecoder) -> Self {
        Self {
            transport,
            sequence: AtomicU32::new(0),
            pending: DashMap::new(),
            broadcasts: DashMap::new(),
            reader: Mutex::new(FrameReader::new(decoder)),
        }
    }

    /// Claim the next outgoing sequence number.
    ///
    /// Never yields [`BROADCAST_SEQUENCE`]; the counter wraps past it.
    pub fn next_sequence(&self) -> u32 {
        loop {
            let sequence = self
                .sequence
                .fetch_add(1, Ordering::Relaxed)
                .wrapping_add(1);
            if sequence != BROADCAST_SEQUENCE {
                return sequence;
            }
        }
    }

    /// Send `message` with a fresh sequence and await its correlated
    /// response.
    ///
    /// # Errors
    ///
    /// Returns a [`CallError`] if encoding or the transport write fails, or
    /// if the connection closes while the call is outstanding.
    pub async fn call<M: WireMessage>(
        &self,
        message: &M,
    ) -> Result<Inbound<P::Message>, CallError> {
        let sequence = self.next_sequence();
        self.call_with_sequence(message, sequence).await
    }

    /// Send `message` under an explicit sequence and await its response.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::DuplicateSequence`] without any I/O if the
    /// sequence already has an outstanding entry, otherwise behaves as
    /// [`Connection::call`].
    pub async fn call_with_sequence<M: WireMessage>(
        &self,
        message: &M,
        sequence: u32,
    ) -> Result<Inbound<P::Message>, CallError> {
        let frame = pack(message, P::SIGNATURE, sequence)?;
        let (tx, rx) = oneshot::channel();
        match self.pending.entry(sequence) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(CallError::DuplicateSequence(sequence));
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(tx);
            }
        }
        debug!(sequence, id = M::MESSAGE_ID, "request sent");
        if let Err(e) = self.transport.send(frame).await {
            self.pending.remove(&sequence);
            return Err(e.into());
        }
        rx.await.map_err(|_| CallError::ConnectionClosed)
    }

    /// Send `message` as fire-and-forget under the reserved broadcast
    /// sequence.
    ///
    /// # Errors
    ///
    /// Returns a [`CallError`] if encoding or the transport write fails.
    pub async fn send_oneway<M: WireMessage>(&self, message: &M) -> Result<(), CallError> {
        let frame = pack(message, P::SIGNATURE, BROADCAST_SEQUENCE)?;
        self.transport.send(frame).await?;
        Ok(())
    }

    /// Subscribe to unsolicited frames carrying message-type `id`.
    pub fn subscribe(&self, id: u32) -> broadcast::Receiver<Inbound<P::Message>> {
        self.broadcasts
            .entry(id)
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .subscribe()
    }

    /// Feed raw inbound bytes from the transport.
    ///
    /// Synchronous and non-blocking: every complete frame is decoded and
    /// dispatched before this returns, and per-frame errors are returned in
    /// stream order without stopping later frames.
    pub fn handle_data(&self, chunk: &[u8]) -> Vec<FrameError> {
        let mut reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let errors = reader.push(chunk);
        while let Some(inbound) = reader.next() {
            self.route(inbound);
        }
        errors
    }

    /// React to a transport lifecycle event.
    ///
    /// Disconnection and transport errors fail every outstanding call with
    /// [`CallError::ConnectionClosed`].
    pub fn handle_event(&self, event: &TransportEvent) {
        match event {
            TransportEvent::Connected => debug!("transport connected"),
            TransportEvent::Disconnected => {
                debug!("transport disconnected; failing pending calls");
                self.fail_pending();
            }
            TransportEvent::Error(e) => {
                warn!(error = %e, "transport error; failing pending calls");
                self.fail_pending();
            }
        }
    }

    /// Number of calls awaiting responses.
    #[must_use]
    pub fn outstanding(&self) -> usize { self.pending.len() }

    fn route(&self, inbound: Inbound<P::Message>) {
        let header = inbound.header;
        if header.sequence != BROADCAST_SEQUENCE {
            if let Some((_, tx)) = self.pending.remove(&header.sequence) {
                if tx.send(inbound).is_err() {
                    debug!(
                        sequence = header.sequence,
                        "caller gone; response discarded"
                    );
                }
                return;
            }
        }
        match self.broadcasts.get(&header.id) {
            Some(tx) => {
                if tx.send(inbound).is_err() {
                    debug!(id = header.id, "no live subscribers for broadcast");
                }
            }
            None => debug!(
                id = header.id,
                sequence = header.sequence,
                "unrouted inbound frame dropped"
            ),
        }
    }

    fn fail_pending(&self) {
        // Dropping the senders rejects every receiver with ConnectionClosed.
        self.pending.clear();
    }
}
