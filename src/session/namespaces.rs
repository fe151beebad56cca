//! Namespace negotiation: proposal + wallet capabilities → approved namespaces

use std::collections::BTreeSet;
use thiserror::Error;

use super::{Namespace, Namespaces, ProposalNamespace, ProposalParams};
use crate::core::caip;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamespaceError {
    #[error("Unsupported namespace: {0}")]
    UnsupportedNamespace(String),

    #[error("Unsupported chains in {namespace}: {}", missing.join(", "))]
    UnsupportedChains { namespace: String, missing: Vec<String> },

    #[error("Unsupported methods in {namespace}: {}", missing.join(", "))]
    UnsupportedMethods { namespace: String, missing: Vec<String> },

    #[error("Unsupported events in {namespace}: {}", missing.join(", "))]
    UnsupportedEvents { namespace: String, missing: Vec<String> },

    #[error("Supported namespace {namespace} offers account {account} on a chain it does not list")]
    InvalidSupportedAccount { namespace: String, account: String },

    #[error("No requested namespace matches the wallet's namespaces")]
    NoMatchingNamespace,
}

/// Validate the proposal against `supported` and return what to approve.
///
/// Required namespaces must be fully covered (chains, methods, events). Every
/// supported namespace the dapp asks for, required or optional, is approved with
/// the wallet's complete capability set.
pub fn build_approved_namespaces(
    params: &ProposalParams,
    supported: &Namespaces,
) -> Result<Namespaces, NamespaceError> {
    for (id, namespace) in supported {
        let chains = namespace.chains.as_deref().unwrap_or_default();
        if let Some(account) = namespace
            .accounts
            .iter()
            .find(|a| caip::account_chain(a).map_or(true, |c| !chains.iter().any(|s| s == c)))
        {
            return Err(NamespaceError::InvalidSupportedAccount { namespace: id.clone(), account: account.clone() });
        }
    }

    for (key, required) in &params.required_namespaces {
        let id = caip::chain_namespace(key);
        let offered = supported.get(id).ok_or_else(|| NamespaceError::UnsupportedNamespace(id.to_string()))?;

        let missing = not_offered(&requested_chains(key, required), offered.chains.as_deref().unwrap_or_default());
        if !missing.is_empty() {
            return Err(NamespaceError::UnsupportedChains { namespace: id.to_string(), missing });
        }
        let missing = not_offered(&required.methods, &offered.methods);
        if !missing.is_empty() {
            return Err(NamespaceError::UnsupportedMethods { namespace: id.to_string(), missing });
        }
        let missing = not_offered(&required.events, &offered.events);
        if !missing.is_empty() {
            return Err(NamespaceError::UnsupportedEvents { namespace: id.to_string(), missing });
        }
    }

    let requested: BTreeSet<&str> = params
        .required_namespaces
        .keys()
        .chain(params.optional_namespaces.keys())
        .map(|key| caip::chain_namespace(key))
        .collect();

    let approved: Namespaces = supported
        .iter()
        .filter(|(id, _)| requested.contains(id.as_str()))
        .map(|(id, namespace)| (id.clone(), namespace.clone()))
        .collect();

    if approved.is_empty() {
        return Err(NamespaceError::NoMatchingNamespace);
    }
    Ok(approved)
}

/// Chains a namespace entry asks for; a chain-scoped key (`solana:5eyk...`) is its own chain
fn requested_chains(key: &str, namespace: &ProposalNamespace) -> Vec<String> {
    match &namespace.chains {
        Some(chains) => chains.clone(),
        None if caip::chain_reference(key).is_some() => vec![key.to_string()],
        None => Vec::new(),
    }
}

fn not_offered(wanted: &[String], offered: &[String]) -> Vec<String> {
    wanted.iter().filter(|w| !offered.contains(w)).cloned().collect()
}
