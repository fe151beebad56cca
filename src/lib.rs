//! missing-events: wallet-side client that pairs with a dapp and pushes
//! `chainChanged` + `accountsChanged` session events.
//!
//! # Architecture
//!
//! ```text
//! AppController (init → pair → sendEvents, reset from anywhere)
//!   │
//!   ├── PairingFlow        URI → proposal (10 s timeout) → approved Session
//!   │     └── build_approved_namespaces (solana: 2 chains × 3 addresses)
//!   │
//!   ├── EventEmissionFlow  chainChanged, then accountsChanged
//!   │
//!   └── WalletKit (lazy, connects once)
//!         └── Arc<dyn SessionClient>
//!               └── LocalWalletKit + LoopbackDapp (in-process)
//!
//! KeyStore: three embedded ed25519 seeds → base58 addresses
//! ```
//!
//! # Features
//!
//! - `native` - CLI binary (logging subscriber, signal handling, data directory)
//!
//! # Usage
//!
//! ```ignore
//! use missing_events::{AppConfig, AppController, KeyStore, LocalConnector, LoopbackDapp, WalletKit};
//! use std::sync::Arc;
//!
//! let wallet_kit = WalletKit::new(AppConfig::default(), Arc::new(LocalConnector::new(LoopbackDapp::default())));
//! let mut app = AppController::new(wallet_kit, KeyStore::embedded()?);
//!
//! app.load().await?;
//! app.pair("wc:7f6e...@2?relay-protocol=irn&symKey=587d...").await?;
//! app.send_events("solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1", "BjD2DwVvVAfXW89XbARmJMRFfTN7XFKz9PraUuZQrLxX").await?;
//! ```

// =============================================================================
// Shared modules
// =============================================================================
pub mod app;
pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod flows;
pub mod keystore;
pub mod session;

// =============================================================================
// Native-only modules (CLI)
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod runtime;

// =============================================================================
// Re-exports
// =============================================================================
pub use app::{AppController, AppState, AppStep};
pub use client::{
    disconnect_all_sessions, ActiveSessions, ClientError, Connector, DisconnectReport, LocalConnector,
    LocalWalletKit, LoopbackDapp, SessionClient, WalletKit,
};
pub use config::AppConfig;
pub use error::{ApprovalError, DisconnectError, Error, Result};
pub use flows::{EmitterState, EventEmissionFlow, PairingFlow};
pub use keystore::{KeyPair, KeyStore, KeyStoreError};
pub use session::{EmittedEvent, ErrorReason, PairingUri, Session, SessionProposal};

#[cfg(feature = "native")]
pub use runtime::{install_signal_handlers, Shutdown};
