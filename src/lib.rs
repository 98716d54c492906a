pub mod adapters;
pub mod claim;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod scheduler;
pub mod signing;

pub use adapters::{CooldownClient, CooldownOracle, LeaderboardClient, StandingSource};
pub use claim::{build_claim_strategy, ClaimStrategy, OffchainClaimer, OnchainClaimer};
pub use config::{AppConfig, StrategyKind};
pub use domain::{
    format_remaining_time, ClaimOutcome, CooldownState, Identity, LeaderboardSnapshot,
    CLAIM_INTERVAL,
};
pub use error::{ClaimerError, Result};
pub use scheduler::{Clock, Decision, IterationReport, Scheduler, SystemClock};
pub use signing::Wallet;
