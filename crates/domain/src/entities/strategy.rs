use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{Cadence, StrategyStatus};
use crate::error::ValidationError;
use crate::value_objects::{Slippage, TokenPair};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrategyId(pub Uuid);

impl StrategyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StrategyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Immutable configuration of a recurring trade strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    /// Target network, as understood by the custody service.
    pub network: String,
    /// Custodial wallet the trades execute against.
    pub wallet_address: String,
    pub pair: TokenPair,
    /// Per-execution trade size, in source-token units.
    pub amount: Decimal,
    pub cadence: Cadence,
    /// Gas price ceiling, in base units.
    pub max_gas_price: u64,
    pub slippage: Slippage,
    /// Lifetime spend ceiling, same unit as `amount`.
    pub total_budget: Decimal,
}

impl StrategyConfig {
    /// Checks the creation-time rules.
    ///
    /// # Errors
    /// Returns the first violated rule; the cadence and token pair carry
    /// their own validation in their constructors.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.network.trim().is_empty() {
            return Err(ValidationError::EmptyNetwork);
        }
        if self.wallet_address.trim().is_empty() {
            return Err(ValidationError::EmptyWalletAddress);
        }
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }
        if self.total_budget < self.amount {
            return Err(ValidationError::BudgetBelowAmount {
                budget: self.total_budget,
                amount: self.amount,
            });
        }
        if self.max_gas_price == 0 {
            return Err(ValidationError::NonPositiveGasPrice);
        }
        Ok(())
    }
}

/// A recurring trade strategy and its mutable execution counters.
///
/// Counters move through a single mutation path: `apply_execution` after a
/// confirmed execution, and `set_status` for explicit pause/resume.
/// `executed_amount <= config.total_budget` holds at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    pub config: StrategyConfig,
    pub executed_amount: Decimal,
    pub execution_count: u32,
    pub last_execution: Option<DateTime<Utc>>,
    pub next_execution: DateTime<Utc>,
    pub status: StrategyStatus,
    /// Rule identifiers returned by the remote policy registrar. Best
    /// effort: an empty list changes nothing about guard behavior.
    pub policy_rule_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Strategy {
    /// Validates the configuration and builds a fresh active strategy with
    /// zeroed counters. The first execution is due one cadence period from
    /// creation.
    pub fn new(config: StrategyConfig, created_at: DateTime<Utc>) -> Result<Self, ValidationError> {
        config.validate()?;
        let next_execution = created_at + config.cadence.period();
        Ok(Self {
            id: StrategyId::new(),
            config,
            executed_amount: Decimal::ZERO,
            execution_count: 0,
            last_execution: None,
            next_execution,
            status: StrategyStatus::Active,
            policy_rule_ids: Vec::new(),
            created_at,
        })
    }

    /// Budget still available for future executions.
    pub fn remaining_budget(&self) -> Decimal {
        self.config.total_budget - self.executed_amount
    }

    /// Whether the strategy is due for a scheduled execution.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == StrategyStatus::Active && self.next_execution <= now
    }

    /// Applies a confirmed execution to the counters.
    ///
    /// Recomputes the next due time from the execution timestamp and
    /// transitions to `Completed` once the remaining budget cannot
    /// accommodate another full per-execution amount.
    pub fn apply_execution(&mut self, executed_amount: Decimal, timestamp: DateTime<Utc>) {
        self.executed_amount += executed_amount;
        self.execution_count += 1;
        self.last_execution = Some(timestamp);
        self.next_execution = timestamp + self.config.cadence.period();
        if self.remaining_budget() < self.config.amount {
            self.status = StrategyStatus::Completed;
        }
    }

    /// Sets the lifecycle status. Completed strategies cannot be
    /// reactivated; returns whether the status changed.
    pub fn set_status(&mut self, status: StrategyStatus) -> bool {
        if self.status == StrategyStatus::Completed {
            return false;
        }
        if self.status == status {
            return false;
        }
        self.status = status;
        true
    }
}
