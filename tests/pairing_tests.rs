//! Pairing Integration Tests
//!
//! ## Test Categories
//!
//! 1. **Golden Tests** - Approved accounts are the known chain × address set
//! 2. **Timeout** - No proposal in time, subscription released, late proposals ignored
//! 3. **Input Validation** - Blank URIs never reach the session library
//! 4. **Rejection** - Failed approval rejects the proposal with USER_REJECTED

use missing_events::core::constants::{chains, reasons};
use missing_events::session::{ProposalNamespace, ProposalNamespaces};
use missing_events::{
    ApprovalError, ClientError, Error, KeyStore, LocalWalletKit, LoopbackDapp, PairingFlow, SessionClient,
};
use std::time::Duration;

const SYM_KEY: &str = "587d5484ce2a2a6ee3ba1962fdd7e8588e06200c46823bd18fbd67def96ad303";

const ADDRESSES: [&str; 3] = [
    "BjD2DwVvVAfXW89XbARmJMRFfTN7XFKz9PraUuZQrLxX",
    "6Aa4mcPw31Q47xHdr5jh4WZdGGPNJdrsvxfxoDaoy6Dp",
    "6GkwtbDUTfunYoUebC1A2a8jnP1hGEtxsabKCZvafnJA",
];

fn uri(topic: &str) -> String {
    format!("wc:{topic}@2?relay-protocol=irn&symKey={SYM_KEY}")
}

fn keystore() -> KeyStore {
    KeyStore::embedded().expect("embedded keys")
}

// ============================================================================
// 1. GOLDEN TESTS
// ============================================================================

mod golden_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn golden_session_accounts_cover_both_chains() {
        let kit = LocalWalletKit::default();
        let session = PairingFlow::new(&kit, &keystore()).pair(&uri("golden")).await.expect("pair");

        let mut expected = Vec::new();
        for chain in [chains::MAINNET, chains::DEVNET] {
            for address in ADDRESSES {
                expected.push(format!("{chain}:{address}"));
            }
        }
        let solana = &session.namespaces["solana"];
        assert_eq!(solana.accounts, expected);
        assert_eq!(solana.chains.as_deref(), Some(&[chains::MAINNET.to_string(), chains::DEVNET.to_string()][..]));
        assert_eq!(session.peer_name(), "AppKit Lab");
    }

    #[tokio::test(start_paused = true)]
    async fn session_is_listed_after_approval() {
        let kit = LocalWalletKit::default();
        let session = PairingFlow::new(&kit, &keystore()).pair(&uri("listed")).await.expect("pair");
        let active = kit.active_sessions().await.expect("sessions");
        assert_eq!(active.len(), 1);
        assert_eq!(active[&session.topic], session);
        assert_eq!(kit.pending_proposals(), 0);
    }
}

// ============================================================================
// 2. TIMEOUT
// ============================================================================

mod timeout_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn no_proposal_times_out() {
        let kit = LocalWalletKit::new(LoopbackDapp::silent());
        let started = tokio::time::Instant::now();

        let err = PairingFlow::new(&kit, &keystore()).pair(&uri("quiet")).await.unwrap_err();

        assert!(matches!(err, Error::Timeout));
        assert_eq!(err.to_string(), "Timeout waiting for session proposal");
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert_eq!(kit.proposal_listeners(), 0, "subscription must be released");
    }

    #[tokio::test(start_paused = true)]
    async fn custom_timeout_is_honored() {
        let kit = LocalWalletKit::new(LoopbackDapp::silent());
        let started = tokio::time::Instant::now();

        let err = PairingFlow::new(&kit, &keystore())
            .with_timeout(Duration::from_secs(2))
            .pair(&uri("short"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn late_proposal_has_no_effect() {
        let kit = LocalWalletKit::new(LoopbackDapp::default().with_delay(Duration::from_secs(20)));

        let err = PairingFlow::new(&kit, &keystore()).pair(&uri("late")).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));

        // Let the dapp's proposal go out after the wait was abandoned
        tokio::time::sleep(Duration::from_secs(15)).await;

        assert_eq!(kit.proposal_listeners(), 0);
        assert!(kit.active_sessions().await.expect("sessions").is_empty());
        assert!(kit.rejections().is_empty());
        assert_eq!(kit.pending_proposals(), 1, "late proposal stays unanswered");
    }

    #[tokio::test(start_paused = true)]
    async fn late_proposal_is_not_approved_for_next_pairing() {
        let kit = LocalWalletKit::new(LoopbackDapp::default().with_delay(Duration::from_secs(15)));

        let err = PairingFlow::new(&kit, &keystore()).pair(&uri("first")).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));

        // "first" answers at t=15 while "second" is waiting; only "second" may be approved
        let session = PairingFlow::new(&kit, &keystore())
            .with_timeout(Duration::from_secs(20))
            .pair(&uri("second"))
            .await
            .expect("pair");

        assert_eq!(session.pairing_topic, "second");
        let active = kit.active_sessions().await.expect("sessions");
        assert_eq!(active.len(), 1);
        assert_eq!(kit.pending_proposals(), 1, "the stale proposal stays unanswered");
    }

    #[tokio::test(start_paused = true)]
    async fn proposal_just_inside_timeout_is_accepted() {
        let kit = LocalWalletKit::new(LoopbackDapp::default().with_delay(Duration::from_millis(9_900)));
        let session = PairingFlow::new(&kit, &keystore()).pair(&uri("edge")).await.expect("pair");
        assert_eq!(session.pairing_topic, "edge");
    }
}

// ============================================================================
// 3. INPUT VALIDATION
// ============================================================================

mod input_tests {
    use super::*;

    #[tokio::test]
    async fn blank_uri_makes_no_pairing_call() {
        let kit = LocalWalletKit::default();
        for blank in ["", "   ", "\n\t"] {
            let err = PairingFlow::new(&kit, &keystore()).pair(blank).await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput("URI")));
        }
        assert_eq!(kit.pair_calls(), 0);
        assert_eq!(kit.proposal_listeners(), 0);
    }

    #[tokio::test]
    async fn pairing_failure_is_approval_error() {
        let kit = LocalWalletKit::default();
        kit.fail_pairing(true);

        let err = PairingFlow::new(&kit, &keystore()).pair(&uri("down")).await.unwrap_err();

        assert!(matches!(err, Error::Approval(ApprovalError::Client(ClientError::Relay(_)))));
        assert_eq!(kit.pair_calls(), 1);
        assert_eq!(kit.proposal_listeners(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reused_pairing_topic_is_refused() {
        let kit = LocalWalletKit::default();
        PairingFlow::new(&kit, &keystore()).pair(&uri("once")).await.expect("first pair");

        let err = PairingFlow::new(&kit, &keystore()).pair(&uri("once")).await.unwrap_err();
        assert!(matches!(err, Error::Approval(ApprovalError::Client(ClientError::PairingExists(_)))));
    }
}

// ============================================================================
// 4. REJECTION
// ============================================================================

mod rejection_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn approval_failure_rejects_with_user_rejected() {
        let kit = LocalWalletKit::default();
        kit.fail_approvals(true);

        let err = PairingFlow::new(&kit, &keystore()).pair(&uri("refused")).await.unwrap_err();

        let Error::Rejection { proposal_id, source } = err else {
            panic!("expected a rejection");
        };
        assert!(matches!(source, ApprovalError::Client(ClientError::Relay(_))));
        let rejections = kit.rejections();
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].0, proposal_id);
        assert_eq!(rejections[0].1.code, reasons::USER_REJECTED);
        assert_eq!(rejections[0].1.code, 5000);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reject_keeps_approval_error() {
        let kit = LocalWalletKit::default();
        kit.fail_approvals(true);
        kit.fail_rejections(true);

        let err = PairingFlow::new(&kit, &keystore()).pair(&uri("double")).await.unwrap_err();

        assert!(matches!(err, Error::Rejection { source: ApprovalError::Client(ClientError::Relay(_)), .. }));
        assert!(kit.rejections().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unsaved_session_is_rejected_not_kept() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("sessions.json");
        let kit = LocalWalletKit::default().with_store_path(&path).expect("store");
        std::fs::create_dir(&path).expect("block the store file");

        let err = PairingFlow::new(&kit, &keystore()).pair(&uri("unsaved")).await.unwrap_err();

        assert!(matches!(err, Error::Rejection { source: ApprovalError::Client(ClientError::Storage(_)), .. }));
        assert!(kit.active_sessions().await.expect("sessions").is_empty());
        assert_eq!(kit.rejections().len(), 1);
        assert_eq!(kit.pending_proposals(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_required_chain_is_rejected() {
        let mut required = ProposalNamespaces::new();
        required.insert(
            "solana".into(),
            ProposalNamespace {
                chains: Some(vec!["solana:4uhcVJyU9pJkvQyS88uRDiswHXSCkY3z".into()]),
                methods: Vec::new(),
                events: Vec::new(),
            },
        );
        let kit = LocalWalletKit::new(LoopbackDapp::default().with_required(required));

        let err = PairingFlow::new(&kit, &keystore()).pair(&uri("testnet")).await.unwrap_err();

        assert!(matches!(err, Error::Rejection { source: ApprovalError::Namespaces(_), .. }));
        assert_eq!(kit.rejections().len(), 1);
        assert!(kit.active_sessions().await.expect("sessions").is_empty());
    }
}
