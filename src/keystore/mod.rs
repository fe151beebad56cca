//! Wallet key store
//!
//! Holds the three fixed Solana keypairs the wallet offers to a dapp. Keys are
//! ed25519 secret seeds embedded in the binary; addresses are the base58 encoding
//! of the matching public keys.
//!
//! ## Key Layout
//!
//! ```text
//! Embedded seed (32 bytes)
//!     │
//!     └── ed25519 ──→ public key (32 bytes) ──→ base58 address
//! ```
//!
//! These keys exist only to be advertised in session accounts. They hold no funds
//! and never sign anything.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use missing_events::KeyStore;
//!
//! let keystore = KeyStore::embedded()?;
//! for address in keystore.addresses() {
//!     println!("{address}");
//! }
//! ```

use ed25519_dalek::SigningKey;
use thiserror::Error;
use zeroize::Zeroize;

use crate::core::caip;

/// Key store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyStoreError {
    #[error("Key store is empty")]
    Empty,
}

const EMBEDDED_SEEDS: [[u8; 32]; 3] = [
    [
        117, 44, 198, 153, 148, 155, 41, 135, 108, 141, 72, 150, 244, 77, 137, 193, 25, 84,
        225, 56, 13, 44, 222, 225, 140, 7, 87, 27, 32, 167, 244, 190,
    ],
    [
        222, 191, 29, 157, 151, 120, 208, 211, 179, 231, 175, 93, 66, 50, 196, 201, 80, 234,
        69, 135, 243, 214, 231, 80, 149, 15, 26, 136, 205, 32, 19, 247,
    ],
    [
        33, 151, 197, 87, 145, 179, 193, 86, 254, 193, 130, 125, 73, 14, 176, 124, 5, 245,
        194, 173, 41, 70, 118, 232, 121, 194, 48, 2, 211, 133, 114, 202,
    ],
];

/// Solana keypair (ed25519)
#[derive(Clone)]
pub struct KeyPair {
    seed: [u8; 32],
    public_key: [u8; 32],
    address: String,
}

impl KeyPair {
    /// Derive from a 32-byte ed25519 secret seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let public_key = derive_public_key(&seed);
        let address = public_key_to_base58(&public_key);
        Self { seed, public_key, address }
    }

    pub fn public_key(&self) -> &[u8; 32] { &self.public_key }

    /// Base58 public address
    pub fn address(&self) -> &str { &self.address }
}

impl Zeroize for KeyPair {
    fn zeroize(&mut self) {
        self.seed.zeroize();
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair").field("address", &self.address).finish_non_exhaustive()
    }
}

/// Fixed, ordered set of wallet keypairs
#[derive(Debug, Clone)]
pub struct KeyStore {
    keypairs: Vec<KeyPair>,
}

impl KeyStore {
    /// The three keypairs baked into the wallet
    pub fn embedded() -> Result<Self, KeyStoreError> {
        Self::from_seeds(&EMBEDDED_SEEDS)
    }

    pub fn from_seeds(seeds: &[[u8; 32]]) -> Result<Self, KeyStoreError> {
        if seeds.is_empty() {
            return Err(KeyStoreError::Empty);
        }
        Ok(Self { keypairs: seeds.iter().copied().map(KeyPair::from_seed).collect() })
    }

    pub fn keypairs(&self) -> &[KeyPair] { &self.keypairs }

    /// Public addresses, in seed order
    pub fn addresses(&self) -> Vec<String> {
        self.keypairs.iter().map(|k| k.address().to_string()).collect()
    }

    /// Every `chain:address` pair, chains outermost
    pub fn accounts_for(&self, chains: &[&str]) -> Vec<String> {
        chains
            .iter()
            .flat_map(|chain| self.keypairs.iter().map(move |k| caip::format_account(chain, k.address())))
            .collect()
    }
}

/// Derive an ed25519 public key from a secret seed
pub fn derive_public_key(seed: &[u8; 32]) -> [u8; 32] {
    SigningKey::from_bytes(seed).verifying_key().to_bytes()
}

pub fn public_key_to_base58(key: &[u8; 32]) -> String {
    bs58::encode(key).into_string()
}
