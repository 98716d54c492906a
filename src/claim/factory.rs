use std::sync::Arc;

use super::{ClaimStrategy, OffchainClaimer, OnchainClaimer};
use crate::config::{AppConfig, StrategyKind};
use crate::error::Result;

/// Create the claim strategy selected by `claim.strategy`.
///
/// Construction errors (bad key, bad address) are startup errors.
pub fn build_claim_strategy(config: &AppConfig) -> Result<Arc<dyn ClaimStrategy>> {
    match config.claim.strategy {
        StrategyKind::Offchain => Ok(Arc::new(OffchainClaimer::from_config(config)?)),
        StrategyKind::Onchain => Ok(Arc::new(OnchainClaimer::from_config(config)?)),
    }
}
