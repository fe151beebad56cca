//! Chain, method, event and reason-code constants
//!
//! Centralized registry for every identifier the wallet advertises to a dapp.

/// Solana chains (CAIP-2)
pub mod chains {
    pub const MAINNET: &str = "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp";
    pub const DEVNET: &str = "solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1";

    /// Supported chains, in the order they are offered to the dapp
    pub const ALL: &[&str] = &[MAINNET, DEVNET];
}

/// Namespace identifiers
pub mod namespaces {
    pub const SOLANA: &str = "solana";
}

/// JSON-RPC methods the wallet claims to handle
pub mod methods {
    pub const SIGN_TRANSACTION: &str = "solana_signTransaction";
    pub const SIGN_MESSAGE: &str = "solana_signMessage";

    pub const ALL: &[&str] = &[SIGN_TRANSACTION, SIGN_MESSAGE];
}

/// Session events the wallet may emit
pub mod events {
    pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
    pub const CHAIN_CHANGED: &str = "chainChanged";

    pub const ALL: &[&str] = &[ACCOUNTS_CHANGED, CHAIN_CHANGED];
}

/// SDK reason codes sent with reject/disconnect
pub mod reasons {
    pub const USER_REJECTED: u32 = 5000;
    pub const USER_REJECTED_MESSAGE: &str = "User rejected.";

    pub const USER_DISCONNECTED: u32 = 6000;
    pub const USER_DISCONNECTED_MESSAGE: &str = "User disconnected.";
}

/// Pairing defaults
pub mod pairing {
    use std::time::Duration;

    /// How long to wait for a session proposal after the pairing call returns
    pub const PROPOSAL_TIMEOUT: Duration = Duration::from_secs(10);

    /// Session lifetime granted on approval (7 days)
    pub const SESSION_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

    /// Proposal lifetime (5 minutes)
    pub const PROPOSAL_EXPIRY_SECS: i64 = 5 * 60;

    pub const URI_SCHEME: &str = "wc";
    pub const RELAY_PROTOCOL: &str = "irn";
}
