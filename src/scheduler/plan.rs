use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::domain::CooldownState;

/// Why a claim is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimReason {
    /// Oracle gave no answer; attempt rather than assume ineligible
    CooldownUnknown,
    CooldownElapsed {
        last_open_at: DateTime<Utc>,
        next_eligible_at: DateTime<Utc>,
    },
}

/// What the scheduler does after querying the cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Claim(ClaimReason),
    Wait {
        last_open_at: DateTime<Utc>,
        next_eligible_at: DateTime<Utc>,
        remaining: Duration,
    },
}

impl Decision {
    pub fn is_claim(&self) -> bool {
        matches!(self, Self::Claim(_))
    }
}

/// Decide between claiming and waiting.
///
/// `remaining` is `next_eligible_at - now` and is only produced when
/// `now < next_eligible_at`, so it is strictly positive.
pub fn plan(cooldown: CooldownState, now: DateTime<Utc>) -> Decision {
    let (Some(last_open_at), Some(next_eligible_at)) =
        (cooldown.last_open_at(), cooldown.next_eligible_at())
    else {
        return Decision::Claim(ClaimReason::CooldownUnknown);
    };

    if now < next_eligible_at {
        let remaining = (next_eligible_at - now).to_std().unwrap_or(Duration::ZERO);
        Decision::Wait {
            last_open_at,
            next_eligible_at,
            remaining,
        }
    } else {
        Decision::Claim(ClaimReason::CooldownElapsed {
            last_open_at,
            next_eligible_at,
        })
    }
}
