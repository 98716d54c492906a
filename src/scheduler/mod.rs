//! Claim scheduling loop.
//!
//! ```text
//! QueryingCooldown -> Waiting  -> ReportingStanding -> Sleeping(until eligible)  -> QueryingCooldown
//!                  -> Claiming -> ReportingStanding -> Sleeping(CLAIM_INTERVAL) -> QueryingCooldown
//! ```
//!
//! A wait always goes back to `QueryingCooldown`, never straight to
//! `Claiming`: the remote state may have moved while we slept. After a claim
//! attempt, whatever its outcome, the loop sleeps the full interval.

pub mod clock;
pub mod plan;

pub use clock::{Clock, SystemClock};
pub use plan::{plan, ClaimReason, Decision};

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::adapters::{CooldownOracle, StandingSource};
use crate::claim::ClaimStrategy;
use crate::domain::{
    format_remaining_time, format_timestamp, ClaimOutcome, CooldownState, Identity,
    LeaderboardSnapshot, CLAIM_INTERVAL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    QueryingCooldown,
    Waiting,
    Claiming,
    ReportingStanding,
    Sleeping,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::QueryingCooldown => write!(f, "querying_cooldown"),
            Self::Waiting => write!(f, "waiting"),
            Self::Claiming => write!(f, "claiming"),
            Self::ReportingStanding => write!(f, "reporting_standing"),
            Self::Sleeping => write!(f, "sleeping"),
        }
    }
}

/// Everything one pass of the loop observed and decided.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub decision: Decision,
    /// Present only when a claim was attempted
    pub outcome: Option<ClaimOutcome>,
    pub standing: LeaderboardSnapshot,
    /// When the loop should query the cooldown again
    pub wake_at: DateTime<Utc>,
}

pub struct Scheduler {
    identity: Identity,
    oracle: Arc<dyn CooldownOracle>,
    leaderboard: Arc<dyn StandingSource>,
    strategy: Arc<dyn ClaimStrategy>,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(
        identity: Identity,
        oracle: Arc<dyn CooldownOracle>,
        leaderboard: Arc<dyn StandingSource>,
        strategy: Arc<dyn ClaimStrategy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            oracle,
            leaderboard,
            strategy,
            clock,
        }
    }

    fn transition(&self, from: SchedulerState, to: SchedulerState) {
        debug!(fid = %self.identity, "scheduler {} -> {}", from, to);
    }

    /// One pass: query cooldown, wait-or-claim, report standing.
    /// Computes when to wake up but does not sleep.
    pub async fn run_iteration(&self) -> IterationReport {
        let cooldown = self.oracle.fetch_last_open(&self.identity).await;
        let decision = plan(cooldown, self.clock.now());

        match decision {
            Decision::Wait {
                last_open_at,
                next_eligible_at,
                remaining,
            } => {
                self.transition(SchedulerState::QueryingCooldown, SchedulerState::Waiting);
                info!("Last open at: {}", format_timestamp(last_open_at));
                info!("Next claim at: {}", format_timestamp(next_eligible_at));
                info!("Cooldown remaining: {}", format_remaining_time(remaining));

                self.transition(SchedulerState::Waiting, SchedulerState::ReportingStanding);
                let standing = self.report_standing().await;

                IterationReport {
                    decision,
                    outcome: None,
                    standing,
                    wake_at: next_eligible_at,
                }
            }
            Decision::Claim(reason) => {
                self.transition(SchedulerState::QueryingCooldown, SchedulerState::Claiming);
                match reason {
                    ClaimReason::CooldownUnknown => {
                        warn!("Cooldown unavailable, attempting claim now");
                    }
                    ClaimReason::CooldownElapsed {
                        last_open_at,
                        next_eligible_at,
                    } => {
                        info!("Last open at: {}", format_timestamp(last_open_at));
                        info!("Next claim at: {}", format_timestamp(next_eligible_at));
                    }
                }

                let outcome = self.claim().await;

                self.transition(SchedulerState::Claiming, SchedulerState::ReportingStanding);
                let standing = self.report_standing().await;
                let wake_at = self.clock.now() + interval();

                IterationReport {
                    decision,
                    outcome: Some(outcome),
                    standing,
                    wake_at,
                }
            }
        }
    }

    /// Run until `shutdown` flips to true. Returns the number of completed
    /// iterations.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        info!(
            fid = %self.identity,
            strategy = %self.strategy.kind(),
            "Box claimer started"
        );
        self.transition(SchedulerState::Idle, SchedulerState::QueryingCooldown);

        let mut iterations = 0u64;
        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.run_iteration().await;
            iterations += 1;

            self.transition(SchedulerState::ReportingStanding, SchedulerState::Sleeping);
            debug!("Sleeping until {}", format_timestamp(report.wake_at));

            tokio::select! {
                _ = self.clock.sleep_until(report.wake_at) => {}
                changed = shutdown.changed() => {
                    // Sender gone: no further signal can arrive.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
            self.transition(SchedulerState::Sleeping, SchedulerState::QueryingCooldown);
        }

        info!("Box claimer stopped after {} iteration(s)", iterations);
        iterations
    }

    /// Cooldown and standing without claiming.
    pub async fn status(&self) -> (CooldownState, LeaderboardSnapshot) {
        let cooldown = self.oracle.fetch_last_open(&self.identity).await;
        match plan(cooldown, self.clock.now()) {
            Decision::Wait {
                last_open_at,
                next_eligible_at,
                remaining,
            } => {
                info!("Last open at: {}", format_timestamp(last_open_at));
                info!("Next claim at: {}", format_timestamp(next_eligible_at));
                info!("Cooldown remaining: {}", format_remaining_time(remaining));
            }
            Decision::Claim(ClaimReason::CooldownElapsed { last_open_at, .. }) => {
                info!("Last open at: {}", format_timestamp(last_open_at));
                info!("Box is claimable now");
            }
            Decision::Claim(ClaimReason::CooldownUnknown) => {
                warn!("Cooldown unavailable");
            }
        }
        let standing = self.report_standing().await;
        (cooldown, standing)
    }

    /// A single claim attempt followed by a standing report, ignoring the cooldown.
    pub async fn claim_once(&self) -> (ClaimOutcome, LeaderboardSnapshot) {
        let outcome = self.claim().await;
        let standing = self.report_standing().await;
        (outcome, standing)
    }

    async fn claim(&self) -> ClaimOutcome {
        let outcome = self.strategy.attempt_claim(&self.identity).await;
        match &outcome {
            ClaimOutcome::Success { reference } => match reference {
                Some(r) => info!(outcome = %outcome, "Claim succeeded ({})", r),
                None => info!(outcome = %outcome, "Claim succeeded"),
            },
            ClaimOutcome::Rejected { reason } | ClaimOutcome::TransportFailure { reason } => {
                error!(outcome = %outcome, "Claim failed or already claimed: {}", reason);
            }
        }
        outcome
    }

    async fn report_standing(&self) -> LeaderboardSnapshot {
        let standing = self.leaderboard.fetch_standing(&self.identity).await;
        info!(
            "Rank: {} | Points: {}",
            standing.rank_display(),
            standing.points_display()
        );
        standing
    }
}

fn interval() -> chrono::Duration {
    chrono::Duration::milliseconds(CLAIM_INTERVAL.as_millis() as i64)
}
