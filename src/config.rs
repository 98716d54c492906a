use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::Identity;

/// Monad testnet
pub const DEFAULT_CHAIN_ID: u64 = 10143;
pub const DEFAULT_COOLDOWN_URL: &str = "https://monadbox.vercel.app/api/box-cooldown";
pub const DEFAULT_LEADERBOARD_URL: &str = "https://evolved-macaw-13512.upstash.io/pipeline";

/// Main configuration structure, built once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub identity: IdentityConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    pub cooldown: CooldownConfig,
    pub leaderboard: LeaderboardConfig,
    pub claim: ClaimConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct IdentityConfig {
    /// Claimant FID
    #[serde(default)]
    pub fid: Option<String>,
}

#[derive(Clone, Deserialize)]
pub struct WalletConfig {
    /// Hex private key, with or without 0x prefix
    #[serde(default)]
    pub private_key: Option<String>,
    pub chain_id: u64,
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CooldownConfig {
    /// Cooldown read (GET) and off-chain claim (POST) endpoint
    pub base_url: String,
}

#[derive(Clone, Deserialize)]
pub struct LeaderboardConfig {
    /// Pipeline endpoint of the sorted-set store
    pub url: String,
    /// Sorted-set key holding the scores
    pub key: String,
    /// Bearer credential for the store
    #[serde(default)]
    pub auth: Option<String>,
}

impl fmt::Debug for LeaderboardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaderboardConfig")
            .field("url", &self.url)
            .field("key", &self.key)
            .field("auth", &self.auth.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Offchain,
    Onchain,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offchain => "offchain",
            Self::Onchain => "onchain",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "offchain" | "off-chain" | "http" => Ok(Self::Offchain),
            "onchain" | "on-chain" | "contract" => Ok(Self::Onchain),
            other => Err(format!(
                "invalid claim strategy '{}'; expected offchain|onchain",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimConfig {
    pub strategy: StrategyKind,
    /// Box contract, required for the on-chain strategy
    #[serde(default)]
    pub contract_address: Option<String>,
    /// Upper bound on waiting for a mined receipt
    pub receipt_timeout_secs: u64,
}

impl ClaimConfig {
    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout for every HTTP call
    pub timeout_ms: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("wallet.chain_id", DEFAULT_CHAIN_ID as i64)?
            .set_default("cooldown.base_url", DEFAULT_COOLDOWN_URL)?
            .set_default("leaderboard.url", DEFAULT_LEADERBOARD_URL)?
            .set_default("leaderboard.key", "leaderboard")?
            .set_default("claim.strategy", "offchain")?
            .set_default("claim.receipt_timeout_secs", 180)?
            .set_default("http.timeout_ms", 15_000)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("BOX_CLAIMER_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (BOX_CLAIMER_CLAIM__STRATEGY, etc.)
            .add_source(
                Environment::with_prefix("BOX_CLAIMER")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain variables used by existing .env files
            .set_override_option("wallet.private_key", non_empty_env("PRIVATE_KEY"))?
            .set_override_option("rpc.url", non_empty_env("PROVIDER_URL"))?
            .set_override_option("identity.fid", non_empty_env("FID"))?
            .set_override_option("leaderboard.auth", non_empty_env("UPSTASH_AUTH"))?
            .set_override_option("claim.contract_address", non_empty_env("CONTRACT_ADDRESS"))?;

        builder.build()?.try_deserialize()
    }

    /// The claimant identity. Only meaningful after `validate` succeeded.
    pub fn identity(&self) -> Identity {
        Identity::new(self.identity.fid.clone().unwrap_or_default())
    }

    /// Validate configuration values. Every missing required value is
    /// reported, not just the first one.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        fn blank(v: &Option<String>) -> bool {
            v.as_deref().map(str::trim).unwrap_or_default().is_empty()
        }

        if blank(&self.wallet.private_key) {
            errors.push("wallet.private_key (PRIVATE_KEY) is required".to_string());
        }
        if blank(&self.rpc.url) {
            errors.push("rpc.url (PROVIDER_URL) is required".to_string());
        }
        if blank(&self.identity.fid) {
            errors.push("identity.fid (FID) is required".to_string());
        }
        if blank(&self.leaderboard.auth) {
            errors.push("leaderboard.auth (UPSTASH_AUTH) is required".to_string());
        }

        if self.claim.strategy == StrategyKind::Onchain {
            if blank(&self.claim.contract_address) {
                errors.push(
                    "claim.contract_address (CONTRACT_ADDRESS) is required for the onchain strategy"
                        .to_string(),
                );
            }
            if !blank(&self.identity.fid) && self.identity().as_u64().is_none() {
                errors.push("identity.fid must be numeric for the onchain strategy".to_string());
            }
        }

        if self.http.timeout_ms == 0 {
            errors.push("http.timeout_ms must be positive".to_string());
        }
        if self.claim.receipt_timeout_secs == 0 {
            errors.push("claim.receipt_timeout_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Fully populated configuration for tests.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            identity: IdentityConfig {
                fid: Some("4242".to_string()),
            },
            wallet: WalletConfig {
                private_key: Some(
                    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
                ),
                chain_id: DEFAULT_CHAIN_ID,
            },
            rpc: RpcConfig {
                url: Some("http://127.0.0.1:8545".to_string()),
            },
            cooldown: CooldownConfig {
                base_url: DEFAULT_COOLDOWN_URL.to_string(),
            },
            leaderboard: LeaderboardConfig {
                url: DEFAULT_LEADERBOARD_URL.to_string(),
                key: "leaderboard".to_string(),
                auth: Some("Bearer token".to_string()),
            },
            claim: ClaimConfig {
                strategy: StrategyKind::Offchain,
                contract_address: None,
                receipt_timeout_secs: 180,
            },
            http: HttpConfig { timeout_ms: 15_000 },
            logging: LoggingConfig::default(),
        }
    }
}
