//! Pairing URI: `wc:{topic}@{version}?relay-protocol=irn&symKey={hex}&expiryTimestamp={secs}`

use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

use crate::core::constants::pairing;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    #[error("Invalid pairing URI: {0}")]
    Malformed(String),

    #[error("Unsupported URI scheme: {0}")]
    Scheme(String),

    #[error("Pairing URI is missing {0}")]
    Missing(&'static str),

    #[error("Invalid symKey: expected 32 hex-encoded bytes")]
    SymKey,

    #[error("Unsupported pairing version: {0}")]
    Version(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingUri {
    pub topic: String,
    pub version: u32,
    pub relay_protocol: String,
    pub sym_key: String,
    pub expiry_timestamp: Option<i64>,
}

impl PairingUri {
    pub fn parse(raw: &str) -> Result<Self, UriError> {
        let url = Url::parse(raw.trim()).map_err(|e| UriError::Malformed(e.to_string()))?;
        if url.scheme() != pairing::URI_SCHEME {
            return Err(UriError::Scheme(url.scheme().to_string()));
        }

        let (topic, version) = url.path().split_once('@').ok_or(UriError::Missing("version"))?;
        if topic.is_empty() {
            return Err(UriError::Missing("topic"));
        }
        let version: u32 = version.parse().map_err(|_| UriError::Version(version.to_string()))?;
        if version != 2 {
            return Err(UriError::Version(version.to_string()));
        }

        let mut relay_protocol = None;
        let mut sym_key = None;
        let mut expiry_timestamp = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "relay-protocol" => relay_protocol = Some(value.into_owned()),
                "symKey" => sym_key = Some(value.into_owned()),
                "expiryTimestamp" => expiry_timestamp = value.parse().ok(),
                _ => {}
            }
        }

        let relay_protocol = relay_protocol.ok_or(UriError::Missing("relay-protocol"))?;
        let sym_key = sym_key.ok_or(UriError::Missing("symKey"))?;
        if hex::decode(&sym_key).map(|k| k.len()) != Ok(32) {
            return Err(UriError::SymKey);
        }

        Ok(Self { topic: topic.to_string(), version, relay_protocol, sym_key, expiry_timestamp })
    }

    /// Fresh URI for the loopback dapp. `entropy` only has to differ between calls.
    pub fn generate(entropy: &[u8], now_secs: i64) -> Self {
        let topic = hex::encode(Sha256::digest(entropy));
        let sym_key = hex::encode(Sha256::digest(topic.as_bytes()));
        Self {
            topic,
            version: 2,
            relay_protocol: pairing::RELAY_PROTOCOL.to_string(),
            sym_key,
            expiry_timestamp: Some(now_secs + pairing::PROPOSAL_EXPIRY_SECS),
        }
    }

    pub fn is_expired(&self, now_secs: i64) -> bool {
        self.expiry_timestamp.is_some_and(|expiry| expiry <= now_secs)
    }
}

impl std::fmt::Display for PairingUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}@{}?relay-protocol={}&symKey={}",
            pairing::URI_SCHEME,
            self.topic,
            self.version,
            self.relay_protocol,
            self.sym_key
        )?;
        if let Some(expiry) = self.expiry_timestamp {
            write!(f, "&expiryTimestamp={expiry}")?;
        }
        Ok(())
    }
}
