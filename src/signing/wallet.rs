use crate::error::{ClaimerError, Result};
use ethers::signers::{LocalWallet, Signer as EthersSigner};
use ethers::types::{Address, Signature};
use tracing::info;
use zeroize::Zeroize;

/// Wallet holding the claimant's signing key
///
/// # Security
/// The hex key is only used while building the wallet and is zeroized
/// right after. It is never stored in the struct.
#[derive(Clone)]
pub struct Wallet {
    inner: LocalWallet,
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a private key hex string
    pub fn from_private_key(private_key: &str, chain_id: u64) -> Result<Self> {
        // Remove 0x prefix if present
        let mut secure_key = private_key.trim().trim_start_matches("0x").to_string();

        let parsed = secure_key.parse::<LocalWallet>();
        secure_key.zeroize();

        let wallet = parsed
            .map_err(|e| ClaimerError::Wallet(format!("Invalid private key: {}", e)))?
            .with_chain_id(chain_id);

        info!("Wallet initialized: {:?}", wallet.address());

        Ok(Self {
            inner: wallet,
            chain_id,
        })
    }

    /// Get the wallet address
    pub fn address(&self) -> Address {
        self.inner.address()
    }

    /// Get the chain ID
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a message (will be prefixed with Ethereum signed message)
    pub async fn sign_message<S: AsRef<[u8]> + Send + Sync>(&self, message: S) -> Result<Signature> {
        self.inner
            .sign_message(message)
            .await
            .map_err(|e| ClaimerError::Signature(format!("Failed to sign message: {}", e)))
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}
