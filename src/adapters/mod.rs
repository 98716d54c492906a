//! Remote read/write clients. Every call made through the traits here is
//! infallible from the caller's point of view: failures degrade to sentinels.

pub mod cooldown;
pub mod leaderboard;

pub use cooldown::{ClaimResponse, CooldownClient};
pub use leaderboard::LeaderboardClient;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::domain::{CooldownState, Identity, LeaderboardSnapshot};
use crate::error::{ClaimerError, Result};

/// Source of the identity's last claim time.
#[async_trait]
pub trait CooldownOracle: Send + Sync {
    /// Never fails: transport or parse problems yield `CooldownState::Unknown`.
    async fn fetch_last_open(&self, identity: &Identity) -> CooldownState;
}

/// Source of the identity's rank and points.
#[async_trait]
pub trait StandingSource: Send + Sync {
    /// Never fails: problems yield `LeaderboardSnapshot::unknown()`.
    async fn fetch_standing(&self, identity: &Identity) -> LeaderboardSnapshot;
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("box-claimer/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| ClaimerError::Validation(format!("failed to build HTTP client: {}", e)))
}

/// Accept both JSON numbers and numeric strings.
pub(crate) fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
