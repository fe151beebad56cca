//! App - the top-level state machine
//!
//! ```text
//!            ┌──────── reset (from any step) ────────┐
//!            ▼                                       │
//!          Init ── active session? ──yes──→ SendEvents(session)
//!            │                                  ▲
//!            no                                 │
//!            ▼                                  │
//!          Pair ──── PairingFlow ok ────────────┘
//!
//!   Reset: disconnect every session (best-effort) → Init
//! ```
//!
//! Failures from a flow land in the error slot; the step stays where it was.

pub mod view;

use crate::client::{disconnect_all_sessions, DisconnectReport, SessionClient, WalletKit};
use crate::error::{Error, Result};
use crate::flows::{EmitterState, EventEmissionFlow, PairingFlow};
use crate::keystore::KeyStore;
use crate::session::{EmittedEvent, Session};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum AppStep {
    Init,
    Pair,
    Reset,
    SendEvents { session: Session, emitter: EmitterState },
}

impl AppStep {
    pub fn name(&self) -> &'static str {
        match self {
            AppStep::Init => "init",
            AppStep::Pair => "pair",
            AppStep::Reset => "reset",
            AppStep::SendEvents { .. } => "sendEvents",
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AppStep::SendEvents { session, .. } => Some(session),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub step: AppStep,
    /// Last user-visible error, empty when none
    pub error: String,
}

impl Default for AppState {
    fn default() -> Self { Self { step: AppStep::Init, error: String::new() } }
}

pub struct AppController {
    wallet_kit: WalletKit,
    keystore: KeyStore,
    state: AppState,
    history: Vec<&'static str>,
}

impl AppController {
    pub fn new(wallet_kit: WalletKit, keystore: KeyStore) -> Self {
        Self { wallet_kit, keystore, state: AppState::default(), history: vec![AppStep::Init.name()] }
    }

    pub fn state(&self) -> &AppState { &self.state }
    pub fn step(&self) -> &AppStep { &self.state.step }
    pub fn error(&self) -> &str { &self.state.error }
    pub fn keystore(&self) -> &KeyStore { &self.keystore }
    pub fn wallet_kit(&self) -> &WalletKit { &self.wallet_kit }

    /// Step names entered so far, oldest first
    pub fn history(&self) -> &[&'static str] { &self.history }

    /// Init check: resume the first active session, otherwise ask for pairing.
    /// Does nothing outside `init`.
    pub async fn load(&mut self) -> Result<()> {
        if self.state.step != AppStep::Init {
            return Ok(());
        }
        let sessions = match self.client().await {
            Ok(client) => client.active_sessions().await.map_err(Error::from),
            Err(e) => Err(e),
        };
        match sessions {
            Ok(sessions) => {
                match sessions.into_values().next() {
                    Some(session) => self.enter_send_events(session),
                    None => self.transition(AppStep::Pair),
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to initialize: {}", e);
                self.fail(e)
            }
        }
    }

    /// Submit the pairing form
    pub async fn pair(&mut self, uri: &str) -> Result<()> {
        if self.state.step != AppStep::Pair {
            return self.fail(self.wrong_step("pair"));
        }
        let client = match self.client().await {
            Ok(client) => client,
            Err(e) => return self.fail(e),
        };
        let timeout = self.wallet_kit.config().proposal_timeout;
        let paired = PairingFlow::new(client.as_ref(), &self.keystore).with_timeout(timeout).pair(uri).await;
        match paired {
            Ok(session) => {
                self.enter_send_events(session);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to pair with dapp: {}", e);
                self.fail(e)
            }
        }
    }

    /// Submit the chain/account form
    pub async fn send_events(&mut self, chain: &str, account: &str) -> Result<[EmittedEvent; 2]> {
        let session = match &mut self.state.step {
            AppStep::SendEvents { session, emitter } => {
                emitter.events.clear();
                session.clone()
            }
            _ => return self.fail(self.wrong_step("sendEvents")),
        };
        let client = match self.client().await {
            Ok(client) => client,
            Err(e) => return self.fail(e),
        };
        match EventEmissionFlow::new(client.as_ref()).emit(&session, chain, account).await {
            Ok(events) => {
                if let AppStep::SendEvents { emitter, .. } = &mut self.state.step {
                    emitter.events = events.to_vec();
                }
                Ok(events)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Disconnect everything and start over. Always ends back at the init check.
    pub async fn reset(&mut self) -> DisconnectReport {
        self.transition(AppStep::Reset);
        let report = match self.client().await {
            Ok(client) => disconnect_all_sessions(client.as_ref()).await,
            Err(e) => {
                tracing::error!("Failed to reach session client during reset: {}", e);
                DisconnectReport::default()
            }
        };
        if !report.failed.is_empty() {
            tracing::warn!(failed = report.failed.len(), "Some sessions could not be disconnected");
        }

        self.transition(AppStep::Init);
        // load() records its own failure in the error slot
        let _ = self.load().await;
        report
    }

    async fn client(&self) -> Result<Arc<dyn SessionClient>> {
        Ok(self.wallet_kit.ready().await?)
    }

    fn enter_send_events(&mut self, session: Session) {
        let emitter = EmitterState::from_session(&session);
        tracing::info!(topic = %session.topic, peer = %session.peer_name(), "Session ready for events");
        self.transition(AppStep::SendEvents { session, emitter });
    }

    fn transition(&mut self, step: AppStep) {
        tracing::debug!(from = self.state.step.name(), to = step.name(), "Step");
        self.history.push(step.name());
        self.state = AppState { step, error: String::new() };
    }

    fn wrong_step(&self, expected: &'static str) -> Error {
        Error::WrongStep { expected, actual: self.state.step.name() }
    }

    fn fail<T>(&mut self, error: Error) -> Result<T> {
        self.state.error = error.to_string();
        Err(error)
    }
}
