//! EventEmissionFlow - push `chainChanged` then `accountsChanged` to the dapp

use serde_json::Value;

use crate::client::SessionClient;
use crate::core::caip;
use crate::core::constants::{chains, events, namespaces};
use crate::error::{Error, Result};
use crate::session::{EmittedEvent, Session, SessionEvent};

/// Selection state for an established session
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterState {
    /// Wallet addresses offered to the dapp, deduplicated
    pub accounts: Vec<String>,
    pub chains: Vec<String>,
    /// Events from the last fully successful submission
    pub events: Vec<EmittedEvent>,
}

impl EmitterState {
    pub fn from_session(session: &Session) -> Self {
        let namespace = session.namespace(namespaces::SOLANA);
        Self {
            accounts: namespace.map(|ns| account_addresses(&ns.accounts)).unwrap_or_default(),
            chains: namespace
                .and_then(|ns| ns.chains.clone())
                .unwrap_or_else(|| chains::ALL.iter().map(|c| c.to_string()).collect()),
            events: Vec::new(),
        }
    }
}

/// Address part of each CAIP-10 account, first occurrence wins.
/// Entries without an address part are skipped.
pub fn account_addresses(accounts: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    accounts
        .iter()
        .filter_map(|account| caip::account_address(account))
        .filter(|address| seen.insert(*address))
        .map(str::to_string)
        .collect()
}

/// The two events for one submission, in emission order
pub fn build_events(topic: &str, chain: &str, account: &str) -> Result<[EmittedEvent; 2]> {
    if chain.trim().is_empty() {
        return Err(Error::InvalidInput("chain"));
    }
    if account.trim().is_empty() {
        return Err(Error::InvalidInput("account"));
    }
    let reference = caip::chain_reference(chain).ok_or(Error::InvalidInput("chain"))?;

    let chain_changed = EmittedEvent {
        topic: topic.to_string(),
        event: SessionEvent { name: events::CHAIN_CHANGED.into(), data: Value::from(reference) },
        chain_id: chain.to_string(),
    };
    let accounts_changed = EmittedEvent {
        topic: topic.to_string(),
        event: SessionEvent { name: events::ACCOUNTS_CHANGED.into(), data: Value::Array(vec![Value::from(account)]) },
        chain_id: chain.to_string(),
    };
    Ok([chain_changed, accounts_changed])
}

pub struct EventEmissionFlow<'a> {
    client: &'a dyn SessionClient,
}

impl<'a> EventEmissionFlow<'a> {
    pub fn new(client: &'a dyn SessionClient) -> Self {
        Self { client }
    }

    /// Emit both events in order. Stops at the first failure; nothing is reported
    /// as sent unless both went out.
    pub async fn emit(&self, session: &Session, chain: &str, account: &str) -> Result<[EmittedEvent; 2]> {
        let emitted = build_events(&session.topic, chain, account)?;
        for event in &emitted {
            self.client.emit_session_event(event).await.map_err(|e| {
                tracing::error!(event = %event.name(), "Failure emitting events: {}", e);
                Error::Emission(e)
            })?;
        }
        tracing::info!(topic = %session.topic, %chain, %account, "Events emitted");
        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::session::{Metadata, Namespace, Namespaces, Peer};

    fn session(chains: Option<Vec<String>>, accounts: &[&str]) -> Session {
        let mut ns = Namespaces::new();
        ns.insert(
            "solana".into(),
            Namespace {
                chains,
                accounts: accounts.iter().map(|a| a.to_string()).collect(),
                methods: Vec::new(),
                events: Vec::new(),
            },
        );
        Session {
            topic: "topic".into(),
            pairing_topic: "pairing".into(),
            expiry: 0,
            peer: Peer { public_key: "pk".into(), metadata: Metadata::default() },
            namespaces: ns,
        }
    }

    #[test]
    fn test_account_addresses_dedup_preserves_order() {
        let accounts = ["solana:a:A1", "solana:b:A2", "solana:b:A1", "broken"].map(String::from);
        assert_eq!(account_addresses(&accounts), vec!["A1", "A2"]);
    }

    #[test]
    fn test_emitter_state_chain_fallback() {
        let state = EmitterState::from_session(&session(None, &["solana:a:A1"]));
        assert_eq!(state.chains, chains::ALL);
        assert_eq!(state.accounts, vec!["A1"]);
        assert!(state.events.is_empty());

        let state = EmitterState::from_session(&session(Some(vec![chains::DEVNET.into()]), &[]));
        assert_eq!(state.chains, vec![chains::DEVNET]);
    }

    #[test]
    fn test_build_events() {
        let [chain_changed, accounts_changed] = build_events("topic", chains::DEVNET, "A1").unwrap();
        assert_eq!(chain_changed.name(), "chainChanged");
        assert_eq!(chain_changed.event.data, json!("EtWTRABZaYq6iMfeYKouRu166VU2xqa1"));
        assert_eq!(accounts_changed.name(), "accountsChanged");
        assert_eq!(accounts_changed.event.data, json!(["A1"]));
        assert_eq!(accounts_changed.chain_id, chains::DEVNET);
        assert_eq!(accounts_changed.topic, "topic");
    }

    #[test]
    fn test_build_events_rejects_bad_input() {
        assert!(matches!(build_events("t", "", "A1"), Err(Error::InvalidInput("chain"))));
        assert!(matches!(build_events("t", "solana", "A1"), Err(Error::InvalidInput("chain"))));
        assert!(matches!(build_events("t", chains::MAINNET, "  "), Err(Error::InvalidInput("account"))));
    }
}
