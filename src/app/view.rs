//! Text projection of the app state. No I/O; the CLI prints what this returns.

use std::fmt::Write;

use super::{AppState, AppStep};
use crate::core::constants::chains;
use crate::flows::EmitterState;
use crate::session::Session;

pub const TITLE: &str = "WalletConnectProvider Missing accountsChanged Events";

/// Human name for the fixed chains, raw id otherwise
pub fn chain_name(chain: &str) -> &str {
    match chain {
        chains::MAINNET => "Mainnet",
        chains::DEVNET => "Devnet",
        other => other,
    }
}

/// `BjD2…ZQrLxX`. Addresses too short to shorten are returned unchanged.
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{head}…{tail}")
}

pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out, "[{}]", state.step.name());
    if !state.error.is_empty() {
        let _ = writeln!(out, "Error: {}", state.error);
    }

    match &state.step {
        AppStep::Init => {
            let _ = writeln!(out, "Loading...");
        }
        AppStep::Reset => {
            let _ = writeln!(out, "Disconnecting sessions...");
        }
        AppStep::Pair => {
            let _ = writeln!(out, "Paste a pairing URI (wc:...) from the dapp to connect.");
        }
        AppStep::SendEvents { session, emitter } => render_emitter(&mut out, session, emitter),
    }
    out
}

fn render_emitter(out: &mut String, session: &Session, emitter: &EmitterState) {
    let _ = writeln!(out, "Connected to {}", session.peer_name());
    let _ = writeln!(out, "Chains:");
    for (i, chain) in emitter.chains.iter().enumerate() {
        let _ = writeln!(out, "  {}) {} ({})", i + 1, chain_name(chain), chain);
    }
    let _ = writeln!(out, "Accounts:");
    for (i, account) in emitter.accounts.iter().enumerate() {
        let _ = writeln!(out, "  {}) {}", i + 1, shorten_address(account));
    }

    if emitter.events.is_empty() {
        let _ = writeln!(out, "Events: none sent");
        return;
    }
    let _ = writeln!(out, "Events:");
    for event in &emitter.events {
        let _ = writeln!(out, "  {} {} on {}", event.name(), event.event.data, chain_name(&event.chain_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_name() {
        assert_eq!(chain_name(chains::MAINNET), "Mainnet");
        assert_eq!(chain_name(chains::DEVNET), "Devnet");
        assert_eq!(chain_name("solana:other"), "solana:other");
    }

    #[test]
    fn test_shorten_address() {
        assert_eq!(shorten_address("BjD2DwVvVAfXW89XbARmJMRFfTN7XFKz9PraUuZQrLxX"), "BjD2…ZQrLxX");
        assert_eq!(shorten_address("short"), "short");
    }

    #[test]
    fn test_render_pair_with_error() {
        let state = AppState { step: AppStep::Pair, error: "Timeout waiting for session proposal".into() };
        let text = render(&state);
        assert!(text.contains("[pair]"));
        assert!(text.contains("Error: Timeout waiting for session proposal"));
        assert!(text.contains("pairing URI"));
    }

    #[test]
    fn test_render_init_has_no_error_line() {
        let text = render(&AppState::default());
        assert!(text.contains("Loading..."));
        assert!(!text.contains("Error:"));
    }
}
