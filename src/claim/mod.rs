//! Claim execution strategies.

pub mod factory;
pub mod offchain;
pub mod onchain;

pub use factory::build_claim_strategy;
pub use offchain::OffchainClaimer;
pub use onchain::OnchainClaimer;

use async_trait::async_trait;

use crate::config::StrategyKind;
use crate::domain::{ClaimOutcome, Identity};

/// One way of claiming the box.
///
/// Each call performs exactly one remote write. Calling again before the
/// cooldown elapsed is expected to come back `Rejected`; there is no
/// client-side deduplication.
#[async_trait]
pub trait ClaimStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Never fails: errors are folded into `ClaimOutcome`.
    async fn attempt_claim(&self, identity: &Identity) -> ClaimOutcome;
}
