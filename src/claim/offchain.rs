//! Off-chain claim: sign `<fid>:<timestamp>` and POST it to the cooldown service.
//!
//! The service does not say *why* it refused, so "already claimed" and any
//! other refusal both land in `Rejected`. A reply that arrives but cannot be
//! read is also `Rejected`; `TransportFailure` is kept for attempts that got
//! no reply at all.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use super::ClaimStrategy;
use crate::adapters::CooldownClient;
use crate::config::{AppConfig, StrategyKind};
use crate::domain::{ClaimOutcome, Identity};
use crate::error::{ClaimerError, Result};
use crate::signing::{ClaimMessage, Wallet};

pub struct OffchainClaimer {
    client: CooldownClient,
    wallet: Wallet,
}

impl OffchainClaimer {
    pub fn new(client: CooldownClient, wallet: Wallet) -> Self {
        Self { client, wallet }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let key = config.wallet.private_key.as_deref().ok_or_else(|| {
            ClaimerError::Wallet("wallet.private_key (PRIVATE_KEY) is required".to_string())
        })?;
        let wallet = Wallet::from_private_key(key, config.wallet.chain_id)?;
        Ok(Self::new(CooldownClient::from_config(config)?, wallet))
    }
}

#[async_trait]
impl ClaimStrategy for OffchainClaimer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Offchain
    }

    async fn attempt_claim(&self, identity: &Identity) -> ClaimOutcome {
        let signed = match ClaimMessage::new(identity.clone(), Utc::now())
            .sign(&self.wallet)
            .await
        {
            Ok(signed) => signed,
            Err(e) => {
                // Nothing was sent.
                return ClaimOutcome::TransportFailure {
                    reason: e.to_string(),
                };
            }
        };
        debug!("Submitting off-chain claim for fid {} at {}", identity, signed.timestamp);

        match self.client.submit_claim(&signed).await {
            Ok(resp) if resp.accepted() => ClaimOutcome::Success { reference: None },
            Ok(resp) => ClaimOutcome::Rejected {
                reason: resp
                    .message
                    .unwrap_or_else(|| "claim not accepted".to_string()),
            },
            Err(e) if e.is_transport() => {
                warn!("Off-chain claim request failed: {}", e);
                ClaimOutcome::TransportFailure {
                    reason: e.to_string(),
                }
            }
            // A reply arrived but could not be read; indistinguishable from a refusal.
            Err(e) => ClaimOutcome::Rejected {
                reason: e.to_string(),
            },
        }
    }
}
