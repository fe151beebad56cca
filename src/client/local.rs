//! LocalWalletKit - in-process session library with a loopback dapp
//!
//! Plays both ends of the pairing handshake without a relay: `pair` parses the
//! URI, then the loopback dapp answers with a session proposal after a short
//! delay. Sessions can be persisted to a JSON file so they survive restarts.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;

use super::{ActiveSessions, ClientError, Connector, SessionClient};
use crate::config::AppConfig;
use crate::core::caip;
use crate::core::constants::{chains, events, methods, namespaces, pairing};
use crate::session::{
    EmittedEvent, ErrorReason, Metadata, Namespaces, PairingUri, Peer, ProposalNamespace, ProposalNamespaces,
    ProposalParams, Relay, Session, SessionProposal,
};

const PROPOSAL_CHANNEL_CAPACITY: usize = 16;

/// How the in-process dapp answers a pairing request
#[derive(Debug, Clone)]
pub struct LoopbackDapp {
    pub metadata: Metadata,
    pub public_key: String,
    /// Delay between the pairing call and the proposal
    pub proposal_delay: Duration,
    /// `false` models a dapp that never answers
    pub send_proposal: bool,
    /// Seconds a proposal stays answerable
    pub proposal_ttl_secs: i64,
    pub required_namespaces: ProposalNamespaces,
    pub optional_namespaces: ProposalNamespaces,
}

impl Default for LoopbackDapp {
    fn default() -> Self {
        let to_strings = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();

        let mut required = ProposalNamespaces::new();
        required.insert(
            namespaces::SOLANA.into(),
            ProposalNamespace {
                chains: Some(vec![chains::MAINNET.into()]),
                methods: to_strings(methods::ALL),
                events: to_strings(events::ALL),
            },
        );
        let mut optional = ProposalNamespaces::new();
        optional.insert(
            namespaces::SOLANA.into(),
            ProposalNamespace { chains: Some(vec![chains::DEVNET.into()]), methods: Vec::new(), events: Vec::new() },
        );

        Self {
            metadata: Metadata {
                name: "AppKit Lab".into(),
                description: "Loopback dapp".into(),
                url: "https://appkit-lab.reown.com".into(),
                icons: Vec::new(),
            },
            public_key: hex::encode(Sha256::digest(b"loopback-dapp")),
            proposal_delay: Duration::from_millis(250),
            send_proposal: true,
            proposal_ttl_secs: pairing::PROPOSAL_EXPIRY_SECS,
            required_namespaces: required,
            optional_namespaces: optional,
        }
    }
}

impl LoopbackDapp {
    /// A dapp that never sends a proposal
    pub fn silent() -> Self { Self { send_proposal: false, ..Default::default() } }
    pub fn with_delay(mut self, delay: Duration) -> Self { self.proposal_delay = delay; self }
    pub fn with_proposal_ttl(mut self, secs: i64) -> Self { self.proposal_ttl_secs = secs; self }
    pub fn with_required(mut self, ns: ProposalNamespaces) -> Self { self.required_namespaces = ns; self }
}

#[derive(Debug, Default)]
struct Failures {
    pair: bool,
    approve: bool,
    reject: bool,
    events: HashSet<String>,
    disconnects: HashSet<String>,
}

#[derive(Debug, Default)]
struct Inner {
    sessions: ActiveSessions,
    proposals: HashMap<u64, SessionProposal>,
    pairings: HashSet<String>,
    pair_calls: usize,
    emitted: Vec<EmittedEvent>,
    rejected: Vec<(u64, ErrorReason)>,
    disconnected: Vec<(String, ErrorReason)>,
    failures: Failures,
}

pub struct LocalWalletKit {
    dapp: LoopbackDapp,
    inner: Arc<Mutex<Inner>>,
    proposals_tx: broadcast::Sender<SessionProposal>,
    store_path: Option<PathBuf>,
    next_id: AtomicU64,
}

impl Default for LocalWalletKit {
    fn default() -> Self { Self::new(LoopbackDapp::default()) }
}

impl LocalWalletKit {
    pub fn new(dapp: LoopbackDapp) -> Self {
        let (proposals_tx, _) = broadcast::channel(PROPOSAL_CHANNEL_CAPACITY);
        Self {
            dapp,
            inner: Arc::new(Mutex::new(Inner::default())),
            proposals_tx,
            store_path: None,
            next_id: AtomicU64::new(0),
        }
    }

    /// Persist sessions to `path`, loading any that are already there
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let sessions = load_sessions(&path)?;
        tracing::debug!(path = %path.display(), count = sessions.len(), "Loaded persisted sessions");
        self.state().sessions = sessions;
        self.store_path = Some(path);
        Ok(self)
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, sessions: &ActiveSessions) -> Result<(), ClientError> {
        match &self.store_path {
            Some(path) => save_sessions(path, sessions),
            None => Ok(()),
        }
    }

    fn next_proposal_id(&self) -> u64 {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        millis * 1000 + self.next_id.fetch_add(1, Ordering::Relaxed) % 1000
    }

    fn build_proposal(&self, pairing_topic: &str) -> SessionProposal {
        let id = self.next_proposal_id();
        SessionProposal {
            id,
            params: ProposalParams {
                id,
                expiry_timestamp: chrono::Utc::now().timestamp() + self.dapp.proposal_ttl_secs,
                pairing_topic: pairing_topic.to_string(),
                proposer: Peer { public_key: self.dapp.public_key.clone(), metadata: self.dapp.metadata.clone() },
                required_namespaces: self.dapp.required_namespaces.clone(),
                optional_namespaces: self.dapp.optional_namespaces.clone(),
                relays: vec![Relay { protocol: pairing::RELAY_PROTOCOL.into() }],
            },
        }
    }

    /// Have the dapp send a proposal for `pairing_topic` right now
    pub fn send_proposal(&self, pairing_topic: &str) -> SessionProposal {
        let proposal = self.build_proposal(pairing_topic);
        self.state().proposals.insert(proposal.id, proposal.clone());
        // No receivers is fine: nobody is waiting any more
        let _ = self.proposals_tx.send(proposal.clone());
        proposal
    }

    /// Seed a session directly, as if restored by the library
    pub fn insert_session(&self, session: Session) -> Result<(), ClientError> {
        let mut state = self.state();
        let mut sessions = state.sessions.clone();
        sessions.insert(session.topic.clone(), session);
        self.persist(&sessions)?;
        state.sessions = sessions;
        Ok(())
    }

    pub fn fail_pairing(&self, fail: bool) { self.state().failures.pair = fail; }
    pub fn fail_approvals(&self, fail: bool) { self.state().failures.approve = fail; }
    pub fn fail_rejections(&self, fail: bool) { self.state().failures.reject = fail; }
    pub fn fail_event(&self, name: &str) { self.state().failures.events.insert(name.to_string()); }
    pub fn fail_disconnect(&self, topic: &str) { self.state().failures.disconnects.insert(topic.to_string()); }

    pub fn emitted_events(&self) -> Vec<EmittedEvent> { self.state().emitted.clone() }
    pub fn rejections(&self) -> Vec<(u64, ErrorReason)> { self.state().rejected.clone() }
    pub fn disconnects(&self) -> Vec<(String, ErrorReason)> { self.state().disconnected.clone() }
    pub fn pair_calls(&self) -> usize { self.state().pair_calls }
    pub fn pending_proposals(&self) -> usize { self.state().proposals.len() }

    /// Live proposal subscriptions
    pub fn proposal_listeners(&self) -> usize { self.proposals_tx.receiver_count() }
}

#[async_trait]
impl SessionClient for LocalWalletKit {
    async fn active_sessions(&self) -> Result<ActiveSessions, ClientError> {
        Ok(self.state().sessions.clone())
    }

    async fn pair(&self, uri: &str) -> Result<String, ClientError> {
        let parsed = PairingUri::parse(uri)?;
        {
            let mut state = self.state();
            state.pair_calls += 1;
            prune_expired(&mut state.proposals);
            if state.failures.pair {
                return Err(ClientError::Relay("pairing request failed".into()));
            }
            if parsed.is_expired(chrono::Utc::now().timestamp()) {
                return Err(ClientError::PairingExpired);
            }
            if !state.pairings.insert(parsed.topic.clone()) {
                return Err(ClientError::PairingExists(parsed.topic));
            }
        }
        tracing::debug!(topic = %parsed.topic, "Pairing registered");

        if !self.dapp.send_proposal {
            return Ok(parsed.topic);
        }

        let proposal = self.build_proposal(&parsed.topic);
        self.state().proposals.insert(proposal.id, proposal.clone());
        let tx = self.proposals_tx.clone();
        let delay = self.dapp.proposal_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(proposal).is_err() {
                tracing::debug!("Session proposal dropped: no listener");
            }
        });
        Ok(parsed.topic)
    }

    fn subscribe_proposals(&self) -> broadcast::Receiver<SessionProposal> {
        self.proposals_tx.subscribe()
    }

    async fn approve_session(&self, proposal_id: u64, namespaces: Namespaces) -> Result<Session, ClientError> {
        let mut state = self.state();
        if state.failures.approve {
            return Err(ClientError::Relay("approve request failed".into()));
        }
        prune_expired(&mut state.proposals);
        let proposal = state.proposals.get(&proposal_id).cloned().ok_or(ClientError::UnknownProposal(proposal_id))?;

        let mut hasher = Sha256::new();
        hasher.update(proposal.params.pairing_topic.as_bytes());
        hasher.update(proposal_id.to_be_bytes());
        let session = Session {
            topic: hex::encode(hasher.finalize()),
            pairing_topic: proposal.params.pairing_topic,
            expiry: chrono::Utc::now().timestamp() + pairing::SESSION_EXPIRY_SECS,
            peer: proposal.params.proposer,
            namespaces,
        };
        // Commit only once the store has it; on failure the proposal stays rejectable
        let mut sessions = state.sessions.clone();
        sessions.insert(session.topic.clone(), session.clone());
        self.persist(&sessions)?;
        state.sessions = sessions;
        state.proposals.remove(&proposal_id);
        Ok(session)
    }

    async fn reject_session(&self, proposal_id: u64, reason: ErrorReason) -> Result<(), ClientError> {
        let mut state = self.state();
        if state.failures.reject {
            return Err(ClientError::Relay("reject request failed".into()));
        }
        state.proposals.remove(&proposal_id).ok_or(ClientError::UnknownProposal(proposal_id))?;
        state.rejected.push((proposal_id, reason));
        Ok(())
    }

    async fn emit_session_event(&self, event: &EmittedEvent) -> Result<(), ClientError> {
        let mut state = self.state();
        if state.failures.events.contains(event.name()) {
            return Err(ClientError::Relay(format!("publish of {} failed", event.name())));
        }
        let session = state
            .sessions
            .get(&event.topic)
            .ok_or_else(|| ClientError::UnknownSession(event.topic.clone()))?;

        let namespace = session.namespace(caip::chain_namespace(&event.chain_id));
        let chain_ok = namespace.is_some_and(|ns| match &ns.chains {
            Some(chains) => chains.contains(&event.chain_id),
            None => ns.accounts.iter().any(|a| caip::account_chain(a) == Some(event.chain_id.as_str())),
        });
        if !chain_ok {
            return Err(ClientError::UnsupportedChain { topic: event.topic.clone(), chain: event.chain_id.clone() });
        }
        if !namespace.is_some_and(|ns| ns.events.iter().any(|e| e == event.name())) {
            return Err(ClientError::UnsupportedEvent { topic: event.topic.clone(), event: event.name().to_string() });
        }

        tracing::debug!(payload = %serde_json::to_string(event).unwrap_or_default(), "Session event published");
        state.emitted.push(event.clone());
        Ok(())
    }

    async fn disconnect_session(&self, topic: &str, reason: ErrorReason) -> Result<(), ClientError> {
        let mut state = self.state();
        if state.failures.disconnects.contains(topic) {
            return Err(ClientError::Relay(format!("disconnect of {topic} failed")));
        }
        let mut sessions = state.sessions.clone();
        sessions.remove(topic).ok_or_else(|| ClientError::UnknownSession(topic.to_string()))?;
        self.persist(&sessions)?;
        state.sessions = sessions;
        state.disconnected.push((topic.to_string(), reason));
        Ok(())
    }
}

/// Drop proposals whose expiry has passed
fn prune_expired(proposals: &mut HashMap<u64, SessionProposal>) {
    let now = chrono::Utc::now().timestamp();
    let before = proposals.len();
    proposals.retain(|_, proposal| proposal.params.expiry_timestamp > now);
    if proposals.len() < before {
        tracing::debug!(dropped = before - proposals.len(), "Expired session proposals dropped");
    }
}

fn load_sessions(path: &Path) -> Result<ActiveSessions, ClientError> {
    if !path.exists() {
        return Ok(ActiveSessions::new());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| ClientError::Storage(format!("sessions read: {e}")))?;
    let sessions: Vec<Session> =
        serde_json::from_str(&raw).map_err(|e| ClientError::Storage(format!("sessions json: {e}")))?;
    Ok(sessions.into_iter().map(|s| (s.topic.clone(), s)).collect())
}

fn save_sessions(path: &Path, sessions: &ActiveSessions) -> Result<(), ClientError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ClientError::Storage(format!("sessions mkdir: {e}")))?;
    }
    let list: Vec<&Session> = sessions.values().collect();
    let raw = serde_json::to_string_pretty(&list).map_err(|e| ClientError::Storage(format!("sessions json: {e}")))?;
    std::fs::write(path, raw).map_err(|e| ClientError::Storage(format!("sessions write: {e}")))
}

/// Connector that builds (or hands out) a [`LocalWalletKit`]
pub struct LocalConnector {
    dapp: LoopbackDapp,
    instance: Option<Arc<LocalWalletKit>>,
    connects: AtomicUsize,
}

impl LocalConnector {
    pub fn new(dapp: LoopbackDapp) -> Self {
        Self { dapp, instance: None, connects: AtomicUsize::new(0) }
    }

    /// Always connect to `kit`; used when the caller needs to inspect the client
    pub fn shared(kit: Arc<LocalWalletKit>) -> Self {
        Self { dapp: LoopbackDapp::default(), instance: Some(kit), connects: AtomicUsize::new(0) }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self, config: &AppConfig) -> Result<Arc<dyn SessionClient>, ClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(kit) = &self.instance {
            return Ok(kit.clone());
        }
        let mut kit = LocalWalletKit::new(self.dapp.clone());
        if let Some(path) = config.sessions_path() {
            kit = kit.with_store_path(path)?;
        }
        Ok(Arc::new(kit))
    }
}
