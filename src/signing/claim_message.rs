//! Signed claim payload for the off-chain claim endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Identity;
use crate::error::Result;
use crate::signing::Wallet;

/// Message binding an identity to the moment of the claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimMessage {
    pub identity: Identity,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl ClaimMessage {
    pub fn new(identity: Identity, at: DateTime<Utc>) -> Self {
        Self {
            identity,
            timestamp: at.timestamp_millis(),
        }
    }

    /// Canonical text that gets signed: `<fid>:<timestamp_ms>`.
    pub fn signing_text(&self) -> String {
        format!("{}:{}", self.identity, self.timestamp)
    }

    /// Sign with EIP-191 personal_sign and produce the POST body.
    pub async fn sign(self, wallet: &Wallet) -> Result<SignedClaim> {
        let signature = wallet.sign_message(self.signing_text()).await?;
        Ok(SignedClaim {
            fid: self.identity,
            timestamp: self.timestamp,
            address: format!("{:?}", wallet.address()),
            signature: format!("0x{}", hex::encode(signature.to_vec())),
        })
    }
}

/// Body of `POST <cooldown-service>`.
#[derive(Debug, Clone, Serialize)]
pub struct SignedClaim {
    pub fid: Identity,
    pub timestamp: i64,
    pub address: String,
    pub signature: String,
}
