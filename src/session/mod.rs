//! Session model - what the session library hands back and forth
//!
//! Types mirror the JSON shapes of the pairing protocol (camelCase on the wire),
//! so an emitted event can be printed exactly as the dapp receives it.
//!
//! | Type | Lifetime |
//! |------|----------|
//! | [`SessionProposal`] | between `pair` and approve/reject, consumed once |
//! | [`Session`] | approval → disconnect |
//! | [`EmittedEvent`] | log record of one pushed notification |

mod namespaces;
mod uri;

pub use namespaces::{build_approved_namespaces, NamespaceError};
pub use uri::{PairingUri, UriError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::core::constants::reasons;

/// Namespace id (`solana`) → approved capabilities
pub type Namespaces = BTreeMap<String, Namespace>;

/// Namespace id (or chain-scoped key) → requested capabilities
pub type ProposalNamespaces = BTreeMap<String, ProposalNamespace>;

/// Application metadata exchanged during pairing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Metadata {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub icons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub public_key: String,
    pub metadata: Metadata,
}

/// Approved capability bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Namespace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<String>>,
    pub accounts: Vec<String>,
    pub methods: Vec<String>,
    pub events: Vec<String>,
}

/// Capabilities a dapp asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProposalNamespace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<String>>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relay {
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalParams {
    pub id: u64,
    pub expiry_timestamp: i64,
    pub pairing_topic: String,
    pub proposer: Peer,
    #[serde(default)]
    pub required_namespaces: ProposalNamespaces,
    #[serde(default)]
    pub optional_namespaces: ProposalNamespaces,
    #[serde(default)]
    pub relays: Vec<Relay>,
}

/// Pending pairing offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProposal {
    pub id: u64,
    pub params: ProposalParams,
}

/// Established wallet ↔ dapp session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub topic: String,
    pub pairing_topic: String,
    pub expiry: i64,
    pub peer: Peer,
    pub namespaces: Namespaces,
}

impl Session {
    pub fn namespace(&self, id: &str) -> Option<&Namespace> {
        self.namespaces.get(id)
    }

    pub fn peer_name(&self) -> &str {
        &self.peer.metadata.name
    }
}

/// Name + payload of a session event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub name: String,
    pub data: Value,
}

/// One notification pushed over a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedEvent {
    pub topic: String,
    pub event: SessionEvent,
    pub chain_id: String,
}

impl EmittedEvent {
    pub fn name(&self) -> &str {
        &self.event.name
    }
}

/// Reason attached to reject/disconnect calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReason {
    pub code: u32,
    pub message: String,
}

impl ErrorReason {
    pub fn user_rejected() -> Self {
        Self { code: reasons::USER_REJECTED, message: reasons::USER_REJECTED_MESSAGE.into() }
    }

    pub fn user_disconnected() -> Self {
        Self { code: reasons::USER_DISCONNECTED, message: reasons::USER_DISCONNECTED_MESSAGE.into() }
    }
}
