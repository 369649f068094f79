//! Chat workflow protocol built on the generic codec and request layers.
//!
//! This module declares the concrete message set, the [`Protocol`]
//! dispatch for inbound frames, and the typed exchanges the application
//! drives. It is also the reference for how a new workflow plugs into the
//! SDK: define structs in `messages`, add enum variants and dispatch arms
//! here, and declare one [`Exchange`] per request/response pair.

pub mod consumer;
pub mod messages;

pub use consumer::{AssignError, Consumer};
pub use messages::{
    AssignAccepted,
    AssignDenied,
    AssignRequest,
    ChatUpdate,
    Failure,
    PostAccepted,
    PostDenied,
    PostRequest,
    User,
    UsersRequest,
    UsersResponse,
};

use crate::{
    codec::CodecError,
    message::WireMessage,
    protocol::Protocol,
    request::{Exchange, Reply},
};

/// Every inbound message the chat workflow can deliver.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatMessage {
    /// Assignment granted.
    AssignAccepted(AssignAccepted),
    /// Assignment refused.
    AssignDenied(AssignDenied),
    /// Generic protocol failure.
    Failure(Failure),
    /// Post acknowledged.
    PostAccepted(PostAccepted),
    /// Post refused.
    PostDenied(PostDenied),
    /// Directory listing.
    UsersResponse(UsersResponse),
    /// Broadcast chat update.
    ChatUpdate(ChatUpdate),
}

/// The chat workflow protocol.
pub struct ChatProtocol;

impl Protocol for ChatProtocol {
    type Message = ChatMessage;

    const SIGNATURE: u16 = 0x5157;

    fn decode_body(id: u32, body: &[u8]) -> Result<Self::Message, CodecError> {
        match id {
            AssignAccepted::MESSAGE_ID => {
                Ok(ChatMessage::AssignAccepted(AssignAccepted::decode(body)?))
            }
            AssignDenied::MESSAGE_ID => Ok(ChatMessage::AssignDenied(AssignDenied::decode(body)?)),
            Failure::MESSAGE_ID => Ok(ChatMessage::Failure(Failure::decode(body)?)),
            PostAccepted::MESSAGE_ID => Ok(ChatMessage::PostAccepted(PostAccepted::decode(body)?)),
            PostDenied::MESSAGE_ID => Ok(ChatMessage::PostDenied(PostDenied::decode(body)?)),
            UsersResponse::MESSAGE_ID => {
                Ok(ChatMessage::UsersResponse(UsersResponse::decode(body)?))
            }
            ChatUpdate::MESSAGE_ID => Ok(ChatMessage::ChatUpdate(ChatUpdate::decode(body)?)),
            id => Err(CodecError::UnknownMessage { id }),
        }
    }
}

/// Users-directory exchange: [`UsersRequest`] answered by
/// [`UsersResponse`].
///
/// The server never denies a listing, so the deny arm reuses [`Failure`]
/// and is never produced by [`Exchange::classify`].
pub struct UsersExchange;

impl Exchange for UsersExchange {
    type Proto = ChatProtocol;
    type Request = UsersRequest;
    type Accept = UsersResponse;
    type Deny = Failure;
    type Fail = Failure;

    fn classify(message: ChatMessage) -> Option<Reply<UsersResponse, Failure, Failure>> {
        match message {
            ChatMessage::UsersResponse(response) => Some(Reply::Accepted(response)),
            ChatMessage::Failure(failure) => Some(Reply::Failed(failure)),
            _ => None,
        }
    }
}

/// Post exchange: [`PostRequest`] answered by acceptance, denial, or
/// failure.
pub struct PostExchange;

impl Exchange for PostExchange {
    type Proto = ChatProtocol;
    type Request = PostRequest;
    type Accept = PostAccepted;
    type Deny = PostDenied;
    type Fail = Failure;

    fn classify(message: ChatMessage) -> Option<Reply<PostAccepted, PostDenied, Failure>> {
        match message {
            ChatMessage::PostAccepted(accepted) => Some(Reply::Accepted(accepted)),
            ChatMessage::PostDenied(denied) => Some(Reply::Denied(denied)),
            ChatMessage::Failure(failure) => Some(Reply::Failed(failure)),
            _ => None,
        }
    }
}

/// Assignment exchange: [`AssignRequest`] answered by a granted identity,
/// a denial, or a failure.
pub struct AssignExchange;

impl Exchange for AssignExchange {
    type Proto = ChatProtocol;
    type Request = AssignRequest;
    type Accept = AssignAccepted;
    type Deny = AssignDenied;
    type Fail = Failure;

    fn classify(message: ChatMessage) -> Option<Reply<AssignAccepted, AssignDenied, Failure>> {
        match message {
            ChatMessage::AssignAccepted(accepted) => Some(Reply::Accepted(accepted)),
            ChatMessage::AssignDenied(denied) => Some(Reply::Denied(denied)),
            ChatMessage::Failure(failure) => Some(Reply::Failed(failure)),
            _ => None,
        }
    }
}
