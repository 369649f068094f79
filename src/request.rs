//! Single-shot request lifecycle: `Ready → Pending → Ready`, terminal
//! `Destroyed`.
//!
//! A [`Request`] wraps one typed exchange against a shared
//! [`Connection`]: it enforces at-most-one in-flight call on itself,
//! classifies the correlated response into the exchange's
//! accepted/denied/failed union, and guarantees a response arriving after
//! [`Request::destroy`] is discarded rather than delivered. Two different
//! request instances may be pending simultaneously; the guard applies per
//! object, not per connection.
//!
//! No timeout exists here: a request whose response never arrives waits
//! until the connection reports closure or the request is destroyed.
//! Dropping an in-flight [`Request::send`] future releases the pending
//! state, so the request can send again afterwards.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::{
    connection::{CallError, Connection},
    message::WireMessage,
    protocol::Protocol,
    reader::Inbound,
};

/// Outcome union of a finished exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply<A, D, E> {
    /// The peer accepted the request.
    Accepted(A),
    /// The peer refused the request with a typed denial.
    Denied(D),
    /// The peer reported a protocol-level failure.
    Failed(E),
}

/// One request/response exchange of a protocol.
///
/// `classify` names which variants of the protocol's message enum form
/// this exchange's expected response group. A response outside the group
/// maps to `None` and surfaces as [`RequestError::UnexpectedReply`].
pub trait Exchange: Send + Sync + 'static {
    /// Protocol this exchange belongs to.
    type Proto: Protocol;
    /// Outgoing request message.
    type Request: WireMessage + Send + Sync;
    /// Acceptance payload.
    type Accept: Send;
    /// Denial payload.
    type Deny: Send;
    /// Failure payload.
    type Fail: Send;

    /// Sort a correlated response into the expected response group.
    fn classify(
        message: <Self::Proto as Protocol>::Message,
    ) -> Option<Reply<Self::Accept, Self::Deny, Self::Fail>>;
}

/// Request lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Ready,
    Pending,
    Destroyed,
}

/// Failure of a [`Request::send`] call.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A previous `send` on this instance has not finished.
    #[error("previous request not finished")]
    Busy,

    /// The request was destroyed; it can never send again.
    #[error("request destroyed")]
    Destroyed,

    /// The request was destroyed while in flight; the response was
    /// discarded, not delivered.
    #[error("request destroyed, response discarded")]
    DestroyedInFlight,

    /// The correlated response carried no message from the expected group.
    #[error("no message in expected group (got message id {id})")]
    UnexpectedReply {
        /// Message-type id actually received.
        id: u32,
    },

    /// The underlying connection call failed.
    #[error(transparent)]
    Call(#[from] CallError),
}

type Callback<T> = Mutex<Option<Box<dyn FnMut(&T) + Send>>>;

/// Stateful handle for one exchange against a connection.
pub struct Request<X: Exchange> {
    connection: Arc<Connection<X::Proto>>,
    state: Mutex<State>,
    on_accept: Callback<X::Accept>,
    on_deny: Callback<X::Deny>,
    on_fail: Callback<X::Fail>,
}

impl<X: Exchange> Request<X>
where
    <X::Proto as Protocol>::Message: Clone,
{
    /// Construct a request bound to an explicit connection handle.
    #[must_use]
    pub fn new(connection: Arc<Connection<X::Proto>>) -> Self {
        Self {
            connection,
            state: Mutex::new(State::Ready),
            on_accept: Mutex::new(None),
            on_deny: Mutex::new(None),
            on_fail: Mutex::new(None),
        }
    }

    /// Register a callback invoked when the peer accepts.
    #[must_use]
    pub fn on_accept(self, callback: impl FnMut(&X::Accept) + Send + 'static) -> Self {
        *lock(&self.on_accept) = Some(Box::new(callback));
        self
    }

    /// Register a callback invoked when the peer denies.
    #[must_use]
    pub fn on_deny(self, callback: impl FnMut(&X::Deny) + Send + 'static) -> Self {
        *lock(&self.on_deny) = Some(Box::new(callback));
        self
    }

    /// Register a callback invoked when the peer reports a failure.
    #[must_use]
    pub fn on_fail(self, callback: impl FnMut(&X::Fail) + Send + 'static) -> Self {
        *lock(&self.on_fail) = Some(Box::new(callback));
        self
    }

    /// Send the request and await its classified reply.
    ///
    /// # Errors
    ///
    /// Rejects synchronously with [`RequestError::Busy`] while a previous
    /// send is pending and with [`RequestError::Destroyed`] after
    /// [`Request::destroy`]; no I/O happens in either case. Otherwise
    /// returns connection-call failures, [`RequestError::UnexpectedReply`]
    /// for a response outside the expected group, and
    /// [`RequestError::DestroyedInFlight`] if the request was destroyed
    /// while awaiting.
    pub async fn send(
        &self,
        request: &X::Request,
    ) -> Result<Reply<X::Accept, X::Deny, X::Fail>, RequestError> {
        {
            let mut state = lock(&self.state);
            match *state {
                State::Pending => return Err(RequestError::Busy),
                State::Destroyed => return Err(RequestError::Destroyed),
                State::Ready => *state = State::Pending,
            }
        }

        // If this future is dropped mid-await, the guard releases the
        // pending state so the request stays usable.
        let mut guard = PendingGuard {
            state: &self.state,
            armed: true,
        };
        let outcome = self.connection.call(request).await;
        guard.armed = false;
        self.complete(outcome)
    }

    /// Mark the request destroyed; terminal and irreversible.
    ///
    /// An in-flight network write is not cancelled, but the eventual
    /// response is guaranteed to be discarded.
    pub fn destroy(&self) { *lock(&self.state) = State::Destroyed; }

    /// True once [`Request::destroy`] has been called.
    #[must_use]
    pub fn is_destroyed(&self) -> bool { *lock(&self.state) == State::Destroyed }

    fn complete(
        &self,
        outcome: Result<Inbound<<X::Proto as Protocol>::Message>, CallError>,
    ) -> Result<Reply<X::Accept, X::Deny, X::Fail>, RequestError> {
        {
            let mut state = lock(&self.state);
            if *state == State::Destroyed {
                log::debug!("request destroyed while in flight; response discarded");
                return Err(RequestError::DestroyedInFlight);
            }
            *state = State::Ready;
        }

        let inbound = outcome?;
        let id = inbound.header.id;
        let Some(reply) = X::classify(inbound.message) else {
            return Err(RequestError::UnexpectedReply { id });
        };
        match &reply {
            Reply::Accepted(payload) => invoke(&self.on_accept, payload),
            Reply::Denied(payload) => invoke(&self.on_deny, payload),
            Reply::Failed(payload) => invoke(&self.on_fail, payload),
        }
        Ok(reply)
    }
}

/// Restores `Ready` if a pending send is cancelled before completion.
struct PendingGuard<'a> {
    state: &'a Mutex<State>,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = lock(self.state);
            if *state == State::Pending {
                *state = State::Ready;
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn invoke<T>(slot: &Callback<T>, payload: &T) {
    if let Some(callback) = lock(slot).as_mut() {
        callback(payload);
    }
}
