//! Core domain types shared by the clients, claim strategies and the scheduler.

use chrono::{DateTime, Local, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Fixed cooldown between eligible claims, mirrored from the remote policy.
pub const CLAIM_INTERVAL: Duration = Duration::from_secs(3 * 60 * 60);

/// Claimant handle (FID) passed to every remote call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric form, when the handle is a plain unsigned integer.
    pub fn as_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Numeric FIDs go over the wire as JSON numbers.
impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.as_u64() {
            Some(n) => serializer.serialize_u64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

/// Last successful claim as reported by the cooldown oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    /// Oracle unavailable, or no claim ever observed
    Unknown,
    LastOpenAt(DateTime<Utc>),
}

impl CooldownState {
    /// Build from the oracle's epoch-millisecond field. Zero and negative
    /// values carry no information and map to `Unknown`, as do instants whose
    /// next eligible time falls outside the representable range.
    pub fn from_epoch_millis(ms: Option<i64>) -> Self {
        ms.filter(|ms| *ms > 0)
            .and_then(DateTime::from_timestamp_millis)
            .filter(|at| eligible_after(*at).is_some())
            .map(Self::LastOpenAt)
            .unwrap_or(Self::Unknown)
    }

    pub fn last_open_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Unknown => None,
            Self::LastOpenAt(at) => Some(*at),
        }
    }

    /// `last_open_at + CLAIM_INTERVAL`, only when the last open is known and
    /// the sum is representable.
    pub fn next_eligible_at(&self) -> Option<DateTime<Utc>> {
        self.last_open_at().and_then(eligible_after)
    }
}

fn eligible_after(at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let interval = chrono::Duration::from_std(CLAIM_INTERVAL).ok()?;
    at.checked_add_signed(interval)
}

/// Outcome of a single claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Remote accepted the claim (ok flag, or successful receipt)
    Success { reference: Option<String> },
    /// Remote refused the claim
    Rejected { reason: String },
    /// The write could not be completed
    TransportFailure { reason: String },
}

impl ClaimOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Rejected { .. } => "rejected",
            Self::TransportFailure { .. } => "transport_failure",
        }
    }
}

impl fmt::Display for ClaimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank and points for the identity. Either half may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LeaderboardSnapshot {
    /// 1-based rank
    pub rank: Option<u64>,
    pub points: Option<f64>,
}

impl LeaderboardSnapshot {
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Convert the store's 0-based reverse rank into a 1-based rank.
    pub fn from_raw(reverse_rank: Option<u64>, points: Option<f64>) -> Self {
        Self {
            rank: reverse_rank.map(|r| r + 1),
            points,
        }
    }

    pub fn rank_display(&self) -> String {
        self.rank.map(|r| r.to_string()).unwrap_or_else(unknown_label)
    }

    pub fn points_display(&self) -> String {
        match self.points {
            Some(p) if p.fract() == 0.0 && p.abs() < 1e15 => format!("{}", p as i64),
            Some(p) => p.to_string(),
            None => unknown_label(),
        }
    }
}

fn unknown_label() -> String {
    "unknown".to_string()
}

/// Render a duration as `Hh Mm Ss`, truncating sub-second precision.
pub fn format_remaining_time(remaining: Duration) -> String {
    let total_seconds = remaining.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

/// Local wall-clock rendering used in status lines.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_remaining_time_zero() {
        assert_eq!(format_remaining_time(Duration::ZERO), "0h 0m 0s");
    }

    #[test]
    fn format_remaining_time_hours_minutes_seconds() {
        let d = Duration::from_millis(3 * 3600 * 1000 + 61 * 1000);
        assert_eq!(format_remaining_time(d), "3h 1m 1s");
        assert_eq!(format_remaining_time(Duration::from_millis(999)), "0h 0m 0s");
    }

    #[test]
    fn reverse_rank_is_shifted_to_one_based() {
        for (raw, expected) in [(0, 1), (1, 2), (41, 42)] {
            let snap = LeaderboardSnapshot::from_raw(Some(raw), Some(10.0));
            assert_eq!(snap.rank, Some(expected));
        }
        let snap = LeaderboardSnapshot::from_raw(None, None);
        assert_eq!(snap.rank, None);
        assert_eq!(snap.rank_display(), "unknown");
        assert_eq!(snap.points_display(), "unknown");
    }

    #[test]
    fn points_display_drops_integral_fraction() {
        let snap = LeaderboardSnapshot::from_raw(Some(3), Some(1250.0));
        assert_eq!(snap.points_display(), "1250");
        let snap = LeaderboardSnapshot::from_raw(Some(3), Some(12.5));
        assert_eq!(snap.points_display(), "12.5");
    }

    #[test]
    fn cooldown_from_millis() {
        assert_eq!(CooldownState::from_epoch_millis(None), CooldownState::Unknown);
        assert_eq!(CooldownState::from_epoch_millis(Some(0)), CooldownState::Unknown);

        let state = CooldownState::from_epoch_millis(Some(1_700_000_000_000));
        let last = state.last_open_at().unwrap();
        assert_eq!(last.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(
            state.next_eligible_at().unwrap().timestamp_millis(),
            1_700_000_000_000 + 3 * 3600 * 1000
        );
    }

    #[test]
    fn cooldown_near_the_end_of_time_is_unknown() {
        let max = DateTime::<Utc>::MAX_UTC.timestamp_millis();
        assert_eq!(
            CooldownState::from_epoch_millis(Some(max)),
            CooldownState::Unknown
        );
        assert_eq!(
            CooldownState::from_epoch_millis(Some(8_210_266_876_799_999)),
            CooldownState::Unknown
        );
        assert_eq!(
            CooldownState::LastOpenAt(DateTime::<Utc>::MAX_UTC).next_eligible_at(),
            None
        );

        let last_ok = max - 3 * 3600 * 1000;
        assert!(CooldownState::from_epoch_millis(Some(last_ok))
            .next_eligible_at()
            .is_some());
    }

    #[test]
    fn identity_serializes_numeric_fid_as_number() {
        let json = serde_json::to_value(Identity::new(" 4242 ")).unwrap();
        assert_eq!(json, serde_json::json!(4242));
        let json = serde_json::to_value(Identity::new("alice")).unwrap();
        assert_eq!(json, serde_json::json!("alice"));
    }
}
