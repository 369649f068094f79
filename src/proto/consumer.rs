//! Consumer bootstrap: claim an identity before using the chat workflow.
//!
//! The connection handle is passed in explicitly; there is no process-wide
//! "current consumer" singleton. Hosts that want one can hold the
//! [`Consumer`] in their own application context.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    connection::Connection,
    proto::{AssignExchange, AssignRequest, ChatProtocol},
    request::{Reply, Request, RequestError},
};

/// Failure of the assignment handshake.
#[derive(Debug, Error)]
pub enum AssignError {
    /// The server refused the key.
    #[error("assignment denied: {0}")]
    Denied(String),

    /// The server reported a protocol failure.
    #[error("assignment failed: code {code}: {message}")]
    Failed {
        /// Numeric failure code.
        code: u32,
        /// Failure description.
        message: String,
    },

    /// The request layer failed before a classified reply arrived.
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Application-facing handle for the chat workflow bootstrap.
pub struct Consumer {
    connection: Arc<Connection<ChatProtocol>>,
}

impl Consumer {
    /// Bind a consumer to an explicit connection handle.
    #[must_use]
    pub fn new(connection: Arc<Connection<ChatProtocol>>) -> Self { Self { connection } }

    /// The connection this consumer speaks over.
    #[must_use]
    pub fn connection(&self) -> &Arc<Connection<ChatProtocol>> { &self.connection }

    /// Claim an identity for `key`, returning the granted uuid.
    ///
    /// # Errors
    ///
    /// Returns [`AssignError::Denied`] or [`AssignError::Failed`] for a
    /// classified refusal and [`AssignError::Request`] for transport,
    /// codec, or state failures.
    pub async fn assign(&self, key: &str) -> Result<String, AssignError> {
        let request = Request::<AssignExchange>::new(Arc::clone(&self.connection));
        let reply = request
            .send(&AssignRequest {
                key: key.to_owned(),
            })
            .await?;
        match reply {
            Reply::Accepted(accepted) => Ok(accepted.uuid),
            Reply::Denied(denied) => Err(AssignError::Denied(denied.reason)),
            Reply::Failed(failure) => Err(AssignError::Failed {
                code: failure.code,
                message: failure.message,
            }),
        }
    }
}
