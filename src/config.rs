//! App configuration - passed in by the binary (or tests)

use std::path::PathBuf;
use std::time::Duration;

use crate::core::constants::pairing;
use crate::session::Metadata;

pub const DEFAULT_PROJECT_ID: &str = "bfd1f46736a52cc8f1c97198f4e22885";

/// Wallet metadata shown to the dapp
pub fn default_metadata() -> Metadata {
    Metadata {
        name: "accountsChanged Bug Repro".into(),
        description: "Missing accountsChanged events bug repro".into(),
        url: "http://localhost:5173".into(),
        icons: vec!["https://assets.reown.com/reown-profile-pic.png".into()],
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub project_id: String,
    pub metadata: Metadata,
    pub proposal_timeout: Duration,
    /// Where the local session store keeps `sessions.json`; `None` keeps sessions in memory
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.into(),
            metadata: default_metadata(),
            proposal_timeout: pairing::PROPOSAL_TIMEOUT,
            data_dir: None,
        }
    }
}

impl AppConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self { project_id: project_id.into(), ..Default::default() }
    }
    pub fn with_metadata(mut self, metadata: Metadata) -> Self { self.metadata = metadata; self }
    pub fn with_proposal_timeout(mut self, timeout: Duration) -> Self { self.proposal_timeout = timeout; self }
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self { self.data_dir = Some(path.into()); self }

    pub fn sessions_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("sessions.json"))
    }
}
