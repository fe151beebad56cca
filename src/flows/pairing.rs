//! PairingFlow - URI in, approved session out

use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::client::{ClientError, SessionClient};
use crate::core::constants::{chains, events, methods, namespaces, pairing};
use crate::error::{ApprovalError, Error, Result};
use crate::keystore::KeyStore;
use crate::session::{build_approved_namespaces, ErrorReason, Namespace, Namespaces, Session, SessionProposal};

/// Everything the wallet is willing to approve: the `solana` namespace with both
/// chains, both methods, both events and every chain × address account.
pub fn wallet_namespaces(keystore: &KeyStore) -> Namespaces {
    let mut supported = Namespaces::new();
    supported.insert(
        namespaces::SOLANA.into(),
        Namespace {
            chains: Some(chains::ALL.iter().map(|c| c.to_string()).collect()),
            accounts: keystore.accounts_for(chains::ALL),
            methods: methods::ALL.iter().map(|m| m.to_string()).collect(),
            events: events::ALL.iter().map(|e| e.to_string()).collect(),
        },
    );
    supported
}

/// One pairing attempt against a session client.
///
/// Only one attempt should run at a time: the proposal stream is shared, and a
/// concurrent attempt could pick up the other's proposal.
pub struct PairingFlow<'a> {
    client: &'a dyn SessionClient,
    supported: Namespaces,
    timeout: Duration,
}

impl<'a> PairingFlow<'a> {
    pub fn new(client: &'a dyn SessionClient, keystore: &KeyStore) -> Self {
        Self { client, supported: wallet_namespaces(keystore), timeout: pairing::PROPOSAL_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn pair(&self, uri: &str) -> Result<Session> {
        if uri.trim().is_empty() {
            return Err(Error::InvalidInput("URI"));
        }

        let proposal = self.await_proposal(uri).await?;
        tracing::info!(
            proposal_id = proposal.id,
            peer = %proposal.params.proposer.metadata.name,
            "Accepting session proposal"
        );
        self.accept(proposal).await
    }

    /// Subscribe, pair, then wait for this pairing's proposal or the timeout.
    /// The subscription is dropped on every path out of here.
    async fn await_proposal(&self, uri: &str) -> Result<SessionProposal> {
        let mut proposals = self.client.subscribe_proposals();
        let pairing_topic = self.client.pair(uri).await.map_err(|e| Error::Approval(e.into()))?;

        match tokio::time::timeout(self.timeout, next_proposal(&mut proposals, &pairing_topic)).await {
            Ok(proposal) => proposal,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "No session proposal received");
                Err(Error::Timeout)
            }
        }
    }

    async fn accept(&self, proposal: SessionProposal) -> Result<Session> {
        match self.approve(&proposal).await {
            Ok(session) => {
                tracing::info!(topic = %session.topic, peer = %session.peer_name(), "Session approved");
                Ok(session)
            }
            Err(source) => {
                tracing::error!("Failed to approve session proposal: {}", source);
                if let Err(e) = self.client.reject_session(proposal.id, ErrorReason::user_rejected()).await {
                    tracing::warn!(proposal_id = proposal.id, "Failed to reject session proposal: {}", e);
                }
                Err(Error::Rejection { proposal_id: proposal.id, source })
            }
        }
    }

    async fn approve(&self, proposal: &SessionProposal) -> std::result::Result<Session, ApprovalError> {
        let namespaces = build_approved_namespaces(&proposal.params, &self.supported)?;
        Ok(self.client.approve_session(proposal.id, namespaces).await?)
    }
}

/// Proposals from earlier, abandoned pairings share the channel; skip them.
async fn next_proposal(
    proposals: &mut broadcast::Receiver<SessionProposal>,
    pairing_topic: &str,
) -> Result<SessionProposal> {
    loop {
        match proposals.recv().await {
            Ok(proposal) if proposal.params.pairing_topic == pairing_topic => return Ok(proposal),
            Ok(proposal) => tracing::debug!(
                proposal_id = proposal.id,
                pairing_topic = %proposal.params.pairing_topic,
                "Ignoring proposal for another pairing"
            ),
            Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "Session proposals dropped"),
            Err(RecvError::Closed) => return Err(Error::Approval(ClientError::Closed.into())),
        }
    }
}
