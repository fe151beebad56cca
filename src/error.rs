//! Workflow errors
//!
//! Input and timeout errors go straight to the user-visible error slot.
//! Negotiation errors are reported after a compensating reject.
//! Disconnect errors are logged and counted, never surfaced.

use thiserror::Error;

use crate::client::ClientError;
use crate::session::NamespaceError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed user-supplied field (`URI`, `chain`, `account`)
    #[error("Invalid {0}")]
    InvalidInput(&'static str),

    #[error("Timeout waiting for session proposal")]
    Timeout,

    /// Pairing could not get as far as a proposal
    #[error("Failed to pair with dapp: {0}")]
    Approval(#[source] ApprovalError),

    /// Negotiation or approval failed; the proposal was rejected with USER_REJECTED
    #[error("Session proposal {proposal_id} rejected: {source}")]
    Rejection {
        proposal_id: u64,
        #[source]
        source: ApprovalError,
    },

    #[error("Failure emitting events: {0}")]
    Emission(#[source] ClientError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Not available while {actual}, expected {expected}")]
    WrongStep { expected: &'static str, actual: &'static str },
}

#[derive(Error, Debug)]
pub enum ApprovalError {
    #[error(transparent)]
    Namespaces(#[from] NamespaceError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Best-effort disconnect failure; logged only
#[derive(Error, Debug)]
#[error("Failed to disconnect session {topic}: {source}")]
pub struct DisconnectError {
    pub topic: String,
    #[source]
    pub source: ClientError,
}
