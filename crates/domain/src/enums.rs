use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How often a strategy executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Hourly,
    Daily,
    Weekly,
}

impl Cadence {
    /// Minimum interval between two successive executions.
    pub fn period(&self) -> Duration {
        match self {
            Cadence::Hourly => Duration::hours(1),
            Cadence::Daily => Duration::hours(24),
            Cadence::Weekly => Duration::days(7),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Hourly => "hourly",
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
        }
    }
}

impl FromStr for Cadence {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(Cadence::Hourly),
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            other => Err(ValidationError::UnknownCadence(other.to_string())),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyStatus {
    Active,
    Paused,
    Completed,
}

impl StrategyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyStatus::Active => "active",
            StrategyStatus::Paused => "paused",
            StrategyStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(StrategyStatus::Active),
            "paused" => Some(StrategyStatus::Paused),
            "completed" => Some(StrategyStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for StrategyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one execution attempt, as recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionOutcome {
    /// Guard approved and the signing gateway confirmed execution.
    ApprovedExecuted,
    /// Guard approved but the downstream signing call failed or timed out.
    ApprovedFailedDownstream,
    /// Guard rejected the attempt.
    Rejected,
}

impl ExecutionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionOutcome::ApprovedExecuted => "approved-executed",
            ExecutionOutcome::ApprovedFailedDownstream => "approved-failed-downstream",
            ExecutionOutcome::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approved-executed" => Some(ExecutionOutcome::ApprovedExecuted),
            "approved-failed-downstream" => Some(ExecutionOutcome::ApprovedFailedDownstream),
            "rejected" => Some(ExecutionOutcome::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_periods() {
        assert_eq!(Cadence::Hourly.period(), Duration::hours(1));
        assert_eq!(Cadence::Daily.period(), Duration::hours(24));
        assert_eq!(Cadence::Weekly.period(), Duration::days(7));
    }

    #[test]
    fn test_cadence_round_trip() {
        for cadence in [Cadence::Hourly, Cadence::Daily, Cadence::Weekly] {
            assert_eq!(cadence.as_str().parse::<Cadence>().unwrap(), cadence);
        }
    }

    #[test]
    fn test_cadence_rejects_unknown() {
        assert!(matches!(
            "fortnightly".parse::<Cadence>(),
            Err(ValidationError::UnknownCadence(_))
        ));
    }

    #[test]
    fn test_outcome_round_trip() {
        for outcome in [
            ExecutionOutcome::ApprovedExecuted,
            ExecutionOutcome::ApprovedFailedDownstream,
            ExecutionOutcome::Rejected,
        ] {
            assert_eq!(ExecutionOutcome::parse(outcome.as_str()), Some(outcome));
        }
    }
}
