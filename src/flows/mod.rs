//! Flows - the two async workflows the controller drives
//!
//! | Flow | Input | Output |
//! |------|-------|--------|
//! | [`PairingFlow`] | pairing URI | approved [`Session`](crate::session::Session) |
//! | [`EventEmissionFlow`] | session + chain + account | `[chainChanged, accountsChanged]` |

mod emission;
mod pairing;

pub use emission::{account_addresses, build_events, EmitterState, EventEmissionFlow};
pub use pairing::{wallet_namespaces, PairingFlow};
