//! The execution guard.
//!
//! `evaluate` is the single decision point for whether an execution
//! attempt may proceed. It is pure and deterministic: every input arrives
//! as an argument (time included, carried by the attempt), so the same
//! `(attempt, strategy)` state always yields the same decision. Checks run
//! cheap-and-local first and short-circuit on the first failure, so a
//! rejected attempt never comes near the ledger's executed path.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::{ExecutionAttempt, Strategy};
use crate::enums::StrategyStatus;

/// Why the guard refused an execution attempt.
///
/// Rejections are ordinary decision outcomes, not errors; they are
/// recorded in the ledger with these enumerated codes so callers can tell
/// a transient blocker from one that needs reconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuardReason {
    #[error("strategy is not active")]
    StrategyNotActive,

    #[error("attempt token pair does not match the strategy configuration")]
    TokenPairMismatch,

    #[error("attempt amount exceeds the per-execution limit")]
    AmountExceedsPerExecutionLimit,

    #[error("gas price is above the configured ceiling")]
    GasPriceTooHigh,

    #[error("cadence interval has not elapsed since the last execution")]
    CadenceNotElapsed,

    #[error("attempt would exceed the lifetime budget")]
    BudgetExhausted,
}

impl GuardReason {
    /// Stable wire/storage code for the reason.
    pub fn code(&self) -> &'static str {
        match self {
            GuardReason::StrategyNotActive => "strategy-not-active",
            GuardReason::TokenPairMismatch => "token-pair-mismatch",
            GuardReason::AmountExceedsPerExecutionLimit => "amount-exceeds-per-execution-limit",
            GuardReason::GasPriceTooHigh => "gas-price-too-high",
            GuardReason::CadenceNotElapsed => "cadence-not-elapsed",
            GuardReason::BudgetExhausted => "budget-exhausted",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "strategy-not-active" => Some(GuardReason::StrategyNotActive),
            "token-pair-mismatch" => Some(GuardReason::TokenPairMismatch),
            "amount-exceeds-per-execution-limit" => {
                Some(GuardReason::AmountExceedsPerExecutionLimit)
            }
            "gas-price-too-high" => Some(GuardReason::GasPriceTooHigh),
            "cadence-not-elapsed" => Some(GuardReason::CadenceNotElapsed),
            "budget-exhausted" => Some(GuardReason::BudgetExhausted),
            _ => None,
        }
    }

    /// Whether an identical attempt can succeed later without the user
    /// reconfiguring the strategy. Cadence resolves on its own; everything
    /// else needs an adjusted attempt or strategy.
    pub fn resolves_on_retry(&self) -> bool {
        matches!(self, GuardReason::CadenceNotElapsed)
    }
}

/// The guard's verdict on one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Approved,
    Rejected(GuardReason),
}

impl GuardDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, GuardDecision::Approved)
    }

    pub fn reason(&self) -> Option<GuardReason> {
        match self {
            GuardDecision::Approved => None,
            GuardDecision::Rejected(reason) => Some(*reason),
        }
    }
}

/// Evaluates an execution attempt against its strategy.
///
/// The check order is part of the contract: first failing check wins.
/// 1. strategy status
/// 2. token pair
/// 3. per-execution amount
/// 4. gas price ceiling
/// 5. cadence elapsed (never-executed strategies pass)
/// 6. lifetime budget
pub fn evaluate(attempt: &ExecutionAttempt, strategy: &Strategy) -> GuardDecision {
    if strategy.status != StrategyStatus::Active {
        return GuardDecision::Rejected(GuardReason::StrategyNotActive);
    }

    if attempt.pair != strategy.config.pair {
        return GuardDecision::Rejected(GuardReason::TokenPairMismatch);
    }

    if attempt.amount > strategy.config.amount {
        return GuardDecision::Rejected(GuardReason::AmountExceedsPerExecutionLimit);
    }

    if attempt.max_gas_price > strategy.config.max_gas_price {
        return GuardDecision::Rejected(GuardReason::GasPriceTooHigh);
    }

    if let Some(last) = strategy.last_execution {
        let elapsed = attempt.requested_at - last;
        if elapsed < strategy.config.cadence.period() {
            return GuardDecision::Rejected(GuardReason::CadenceNotElapsed);
        }
    }

    if strategy.executed_amount + attempt.amount > strategy.config.total_budget {
        return GuardDecision::Rejected(GuardReason::BudgetExhausted);
    }

    GuardDecision::Approved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Cadence;
    use crate::value_objects::{Slippage, TokenPair};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn strategy() -> Strategy {
        let config = crate::entities::StrategyConfig {
            name: "daily eth".to_string(),
            network: "ethereum".to_string(),
            wallet_address: "0xabc".to_string(),
            pair: TokenPair::new("USDC", "ETH").unwrap(),
            amount: dec!(100),
            cadence: Cadence::Daily,
            max_gas_price: 50_000_000_000,
            slippage: Slippage::from_bps(50).unwrap(),
            total_budget: dec!(250),
        };
        Strategy::new(config, epoch()).unwrap()
    }

    fn attempt(strategy: &Strategy, at: DateTime<Utc>) -> ExecutionAttempt {
        ExecutionAttempt::scheduled(strategy, at)
    }

    #[test]
    fn test_fresh_strategy_is_approved() {
        let strategy = strategy();
        let decision = evaluate(&attempt(&strategy, epoch()), &strategy);
        assert_eq!(decision, GuardDecision::Approved);
    }

    #[test]
    fn test_paused_strategy_rejected() {
        let mut strategy = strategy();
        strategy.set_status(StrategyStatus::Paused);
        assert_eq!(
            evaluate(&attempt(&strategy, epoch()), &strategy),
            GuardDecision::Rejected(GuardReason::StrategyNotActive)
        );
    }

    #[test]
    fn test_token_pair_mismatch_rejected() {
        let strategy = strategy();
        let mut wrong = attempt(&strategy, epoch());
        wrong.pair = TokenPair::new("USDC", "WBTC").unwrap();
        assert_eq!(
            evaluate(&wrong, &strategy),
            GuardDecision::Rejected(GuardReason::TokenPairMismatch)
        );
    }

    #[test]
    fn test_amount_above_limit_rejected() {
        let strategy = strategy();
        let mut oversized = attempt(&strategy, epoch());
        oversized.amount = dec!(100.01);
        assert_eq!(
            evaluate(&oversized, &strategy),
            GuardDecision::Rejected(GuardReason::AmountExceedsPerExecutionLimit)
        );
    }

    #[test]
    fn test_gas_above_ceiling_rejected_regardless_of_state() {
        // Scenario B: the gas check fires whatever the amount or cadence
        // state looks like.
        let mut strategy = strategy();
        strategy.apply_execution(dec!(100), epoch());

        let mut expensive = ExecutionAttempt::manual(&strategy, Some(dec!(1)), epoch());
        expensive.max_gas_price = strategy.config.max_gas_price + 1;
        assert_eq!(
            evaluate(&expensive, &strategy),
            GuardDecision::Rejected(GuardReason::GasPriceTooHigh)
        );
    }

    #[test]
    fn test_cadence_not_elapsed_rejected() {
        let mut strategy = strategy();
        strategy.apply_execution(dec!(100), epoch());

        let same_day = attempt(&strategy, epoch() + Duration::hours(3));
        assert_eq!(
            evaluate(&same_day, &strategy),
            GuardDecision::Rejected(GuardReason::CadenceNotElapsed)
        );

        let next_day = attempt(&strategy, epoch() + Duration::hours(24));
        assert_eq!(evaluate(&next_day, &strategy), GuardDecision::Approved);
    }

    #[test]
    fn test_never_executed_strategy_skips_cadence() {
        // A strategy that has never executed passes the cadence check even
        // when triggered before its first scheduled slot.
        let strategy = strategy();
        assert!(strategy.last_execution.is_none());
        let early = attempt(&strategy, epoch() - Duration::hours(12));
        assert_eq!(evaluate(&early, &strategy), GuardDecision::Approved);
    }

    #[test]
    fn test_budget_boundary() {
        // Remaining budget of exactly the attempt amount is approved; one
        // cent over is rejected.
        let mut strategy = strategy();
        strategy.executed_amount = dec!(150);

        let exact = ExecutionAttempt::manual(&strategy, Some(dec!(100)), epoch());
        assert_eq!(evaluate(&exact, &strategy), GuardDecision::Approved);

        strategy.executed_amount = dec!(150.01);
        let over = ExecutionAttempt::manual(&strategy, Some(dec!(100)), epoch());
        assert_eq!(
            evaluate(&over, &strategy),
            GuardDecision::Rejected(GuardReason::BudgetExhausted)
        );
    }

    #[test]
    fn test_scenario_a_budget_lifecycle() {
        // amount=100, budget=250, daily cadence.
        let mut strategy = strategy();

        // First execution approved.
        let first = attempt(&strategy, epoch());
        assert_eq!(evaluate(&first, &strategy), GuardDecision::Approved);
        strategy.apply_execution(first.amount, first.requested_at);

        // Immediate manual retry the same day: cadence blocks it.
        let retry = ExecutionAttempt::manual(&strategy, None, epoch() + Duration::hours(1));
        assert_eq!(
            evaluate(&retry, &strategy),
            GuardDecision::Rejected(GuardReason::CadenceNotElapsed)
        );

        // Next day: approved, 200/250 spent.
        let second = attempt(&strategy, epoch() + Duration::hours(24));
        assert_eq!(evaluate(&second, &strategy), GuardDecision::Approved);
        strategy.apply_execution(second.amount, second.requested_at);
        assert_eq!(strategy.executed_amount, dec!(200));
        assert_eq!(strategy.status, StrategyStatus::Active);

        // A third full execution would reach 300: budget-exhausted.
        let third = attempt(&strategy, epoch() + Duration::hours(48));
        assert_eq!(
            evaluate(&third, &strategy),
            GuardDecision::Rejected(GuardReason::BudgetExhausted)
        );

        // A partial 50 fits, and completes the strategy.
        let partial = ExecutionAttempt::manual(
            &strategy,
            Some(dec!(50)),
            epoch() + Duration::hours(48),
        );
        assert_eq!(evaluate(&partial, &strategy), GuardDecision::Approved);
        strategy.apply_execution(partial.amount, partial.requested_at);
        assert_eq!(strategy.status, StrategyStatus::Completed);
        assert_eq!(strategy.executed_amount, strategy.config.total_budget);
    }

    #[test]
    fn test_check_order_first_failure_wins() {
        // Every check would fail here; the status check must win.
        let mut strategy = strategy();
        strategy.set_status(StrategyStatus::Paused);
        strategy.executed_amount = strategy.config.total_budget;
        strategy.last_execution = Some(epoch());

        let mut worst = attempt(&strategy, epoch());
        worst.pair = TokenPair::new("DAI", "WBTC").unwrap();
        worst.amount = dec!(10_000);
        worst.max_gas_price = u64::MAX;

        assert_eq!(
            evaluate(&worst, &strategy),
            GuardDecision::Rejected(GuardReason::StrategyNotActive)
        );
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let strategy = strategy();
        let probe = attempt(&strategy, epoch());
        let first = evaluate(&probe, &strategy);
        let second = evaluate(&probe, &strategy);
        assert_eq!(first, second);
    }

    #[test]
    fn test_reason_codes_round_trip() {
        for reason in [
            GuardReason::StrategyNotActive,
            GuardReason::TokenPairMismatch,
            GuardReason::AmountExceedsPerExecutionLimit,
            GuardReason::GasPriceTooHigh,
            GuardReason::CadenceNotElapsed,
            GuardReason::BudgetExhausted,
        ] {
            assert_eq!(GuardReason::from_code(reason.code()), Some(reason));
        }
        assert!(GuardReason::from_code("something-else").is_none());
    }
}
