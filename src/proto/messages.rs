//! Wire structs for the chat workflow.
//!
//! Field ids within each struct are part of the wire contract; keep them
//! stable when adding fields, and add new fields as optional so old peers
//! keep decoding.

use crate::{
    codec::CodecError,
    message::{FieldReader, FieldWriter, WireMessage},
};

/// Directory entry describing one connected user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct User {
    /// Display name.
    pub name: String,
    /// Server-assigned identity.
    pub uuid: String,
}

impl WireMessage for User {
    const MESSAGE_ID: u32 = 60;

    fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError> {
        writer.str(1, &self.name)?;
        writer.str(2, &self.uuid)
    }

    fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            name: reader.str(1)?,
            uuid: reader.str(2)?,
        })
    }
}

/// Ask the server for the current user directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UsersRequest;

impl WireMessage for UsersRequest {
    const MESSAGE_ID: u32 = 70;

    fn write_fields(&self, _writer: &mut FieldWriter) -> Result<(), CodecError> { Ok(()) }

    fn read_fields(_reader: &FieldReader<'_>) -> Result<Self, CodecError> { Ok(Self) }
}

/// Directory listing answering a [`UsersRequest`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsersResponse {
    /// Connected users.
    pub users: Vec<User>,
}

impl WireMessage for UsersResponse {
    const MESSAGE_ID: u32 = 71;

    fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError> {
        writer.nested_array(1, &self.users)
    }

    fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            users: reader.nested_array(1)?,
        })
    }
}

/// Claim an identity for a consumer key; the bootstrap handshake.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignRequest {
    /// Application-chosen consumer key.
    pub key: String,
}

impl WireMessage for AssignRequest {
    const MESSAGE_ID: u32 = 10;

    fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError> {
        writer.str(1, &self.key)
    }

    fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            key: reader.str(1)?,
        })
    }
}

/// Successful assignment carrying the granted identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignAccepted {
    /// Server-assigned identity for the key.
    pub uuid: String,
}

impl WireMessage for AssignAccepted {
    const MESSAGE_ID: u32 = 11;

    fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError> {
        writer.str(1, &self.uuid)
    }

    fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            uuid: reader.str(1)?,
        })
    }
}

/// Refused assignment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignDenied {
    /// Human-readable refusal reason.
    pub reason: String,
}

impl WireMessage for AssignDenied {
    const MESSAGE_ID: u32 = 12;

    fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError> {
        writer.str(1, &self.reason)
    }

    fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            reason: reader.str(1)?,
        })
    }
}

/// Post a chat message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostRequest {
    /// Sender identity from [`AssignAccepted`].
    pub uuid: String,
    /// Message text.
    pub message: String,
}

impl WireMessage for PostRequest {
    const MESSAGE_ID: u32 = 30;

    fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError> {
        writer.str(1, &self.uuid)?;
        writer.str(2, &self.message)
    }

    fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            uuid: reader.str(1)?,
            message: reader.str(2)?,
        })
    }
}

/// Acknowledged post.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PostAccepted;

impl WireMessage for PostAccepted {
    const MESSAGE_ID: u32 = 31;

    fn write_fields(&self, _writer: &mut FieldWriter) -> Result<(), CodecError> { Ok(()) }

    fn read_fields(_reader: &FieldReader<'_>) -> Result<Self, CodecError> { Ok(Self) }
}

/// Refused post.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostDenied {
    /// Human-readable refusal reason.
    pub reason: String,
}

impl WireMessage for PostDenied {
    const MESSAGE_ID: u32 = 32;

    fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError> {
        writer.str(1, &self.reason)
    }

    fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            reason: reader.str(1)?,
        })
    }
}

/// Protocol-level failure usable as the error arm of any exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Failure {
    /// Numeric failure code.
    pub code: u32,
    /// Failure description.
    pub message: String,
}

impl WireMessage for Failure {
    const MESSAGE_ID: u32 = 20;

    fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError> {
        writer.scalar(1, self.code)?;
        writer.str(2, &self.message)
    }

    fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            code: reader.scalar(1)?,
            message: reader.str(2)?,
        })
    }
}

/// Broadcast chat update pushed to every consumer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatUpdate {
    /// Display name of the poster.
    pub user: String,
    /// Identity of the poster.
    pub uuid: String,
    /// Message text.
    pub message: String,
    /// Server-side post time, epoch milliseconds; absent for replays from
    /// peers that predate the field.
    pub posted_ms: Option<u64>,
}

impl WireMessage for ChatUpdate {
    const MESSAGE_ID: u32 = 80;

    fn write_fields(&self, writer: &mut FieldWriter) -> Result<(), CodecError> {
        writer.str(1, &self.user)?;
        writer.str(2, &self.uuid)?;
        writer.str(3, &self.message)?;
        writer.opt_scalar(4, self.posted_ms)
    }

    fn read_fields(reader: &FieldReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            user: reader.str(1)?,
            uuid: reader.str(2)?,
            message: reader.str(3)?,
            posted_ms: reader.opt_scalar(4)?,
        })
    }
}
