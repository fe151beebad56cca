//! Session client - the boundary to the pairing/session library
//!
//! # Architecture
//!
//! ```text
//! WalletKit (explicitly constructed handle)
//!     │
//!     ├── ready() ──→ Connector::connect(config)   (runs once, result shared)
//!     │
//!     └── Arc<dyn SessionClient>
//!           ├── active_sessions / pair / subscribe_proposals
//!           ├── approve_session / reject_session
//!           └── emit_session_event / disconnect_session
//! ```
//!
//! Proposal notifications are a broadcast stream. Holding the receiver is the
//! subscription; dropping it unsubscribes.

mod local;

pub use local::{LocalConnector, LocalWalletKit, LoopbackDapp};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, OnceCell};

use crate::config::AppConfig;
use crate::error::DisconnectError;
use crate::session::{EmittedEvent, ErrorReason, Namespaces, Session, SessionProposal, UriError};

/// Topic → session, in topic order
pub type ActiveSessions = BTreeMap<String, Session>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Failed to initialize session client: {0}")]
    Init(String),

    #[error(transparent)]
    Uri(#[from] UriError),

    #[error("Pairing URI has expired")]
    PairingExpired,

    #[error("Pairing already exists: {0}")]
    PairingExists(String),

    #[error("No matching key. proposal id: {0}")]
    UnknownProposal(u64),

    #[error("No matching key. session topic doesn't exist: {0}")]
    UnknownSession(String),

    #[error("Unsupported chain {chain} for session {topic}")]
    UnsupportedChain { topic: String, chain: String },

    #[error("Unsupported event {event} for session {topic}")]
    UnsupportedEvent { topic: String, event: String },

    #[error("Session proposal stream closed")]
    Closed,

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait SessionClient: Send + Sync {
    async fn active_sessions(&self) -> Result<ActiveSessions, ClientError>;

    /// Start pairing and return the pairing topic. The proposal arrives later on
    /// [`SessionClient::subscribe_proposals`], tagged with that topic.
    async fn pair(&self, uri: &str) -> Result<String, ClientError>;

    fn subscribe_proposals(&self) -> broadcast::Receiver<SessionProposal>;

    async fn approve_session(&self, proposal_id: u64, namespaces: Namespaces) -> Result<Session, ClientError>;

    async fn reject_session(&self, proposal_id: u64, reason: ErrorReason) -> Result<(), ClientError>;

    async fn emit_session_event(&self, event: &EmittedEvent) -> Result<(), ClientError>;

    async fn disconnect_session(&self, topic: &str, reason: ErrorReason) -> Result<(), ClientError>;
}

/// Builds the session client for a configuration
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &AppConfig) -> Result<Arc<dyn SessionClient>, ClientError>;
}

/// Lazily-connected session client handle.
///
/// Every caller of [`WalletKit::ready`] awaits the same initialization. A failed
/// connect is not cached, so the next call retries.
pub struct WalletKit {
    config: AppConfig,
    connector: Arc<dyn Connector>,
    client: OnceCell<Arc<dyn SessionClient>>,
}

impl WalletKit {
    pub fn new(config: AppConfig, connector: Arc<dyn Connector>) -> Self {
        Self { config, connector, client: OnceCell::new() }
    }

    pub async fn ready(&self) -> Result<Arc<dyn SessionClient>, ClientError> {
        let client = self
            .client
            .get_or_try_init(|| async {
                tracing::info!(project_id = %self.config.project_id, app = %self.config.metadata.name, "Initializing session client");
                self.connector.connect(&self.config).await
            })
            .await?;
        Ok(client.clone())
    }

    pub fn is_ready(&self) -> bool {
        self.client.initialized()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Outcome of a best-effort disconnect sweep
#[derive(Debug, Default)]
pub struct DisconnectReport {
    pub disconnected: Vec<String>,
    pub failed: Vec<DisconnectError>,
}

/// Disconnect every active session, one at a time. Failures are logged and
/// collected; they never stop the sweep.
pub async fn disconnect_all_sessions(client: &dyn SessionClient) -> DisconnectReport {
    let mut report = DisconnectReport::default();
    let sessions = match client.active_sessions().await {
        Ok(sessions) => sessions,
        Err(e) => {
            tracing::error!("Failed to list sessions for disconnect: {}", e);
            return report;
        }
    };

    for (topic, session) in sessions {
        match client.disconnect_session(&topic, ErrorReason::user_disconnected()).await {
            Ok(()) => {
                tracing::info!(%topic, peer = %session.peer_name(), "Session disconnected");
                report.disconnected.push(topic);
            }
            Err(source) => {
                let err = DisconnectError { topic, source };
                tracing::error!("{}", err);
                report.failed.push(err);
            }
        }
    }
    report
}
