use clap::{Parser, Subcommand};

use crate::config::StrategyKind;

#[derive(Parser, Debug)]
#[command(name = "box-claimer")]
#[command(version)]
#[command(about = "Claims the cooldown-gated box for one FID and reports leaderboard standing", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml and environment overlays
    #[arg(short, long, env = "BOX_CLAIMER_CONFIG_DIR", default_value = "config")]
    pub config_dir: String,

    /// Claim strategy, overrides claim.strategy
    #[arg(short, long, value_parser = parse_strategy)]
    pub strategy: Option<StrategyKind>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the claim loop until interrupted (default)
    Run,
    /// Show cooldown and leaderboard standing, do not claim
    Status,
    /// Attempt one claim now, then report standing
    Claim,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }
}

fn parse_strategy(raw: &str) -> Result<StrategyKind, String> {
    raw.parse()
}
