use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::strategy::{Strategy, StrategyId};
use crate::value_objects::TokenPair;

/// One scheduled or manual execution trigger.
///
/// Attempts reference their strategy but do not own it: they are appended
/// to the ledger even if the strategy is later archived. Time is captured
/// at construction so the guard never reads a clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionAttempt {
    pub strategy_id: StrategyId,
    pub pair: TokenPair,
    pub amount: Decimal,
    /// Gas price the attempt is willing to pay, in base units.
    pub max_gas_price: u64,
    pub wallet_address: String,
    pub requested_at: DateTime<Utc>,
}

impl ExecutionAttempt {
    /// The attempt a sweep tick issues for a due strategy: everything comes
    /// from the configuration.
    pub fn scheduled(strategy: &Strategy, now: DateTime<Utc>) -> Self {
        Self {
            strategy_id: strategy.id,
            pair: strategy.config.pair.clone(),
            amount: strategy.config.amount,
            max_gas_price: strategy.config.max_gas_price,
            wallet_address: strategy.config.wallet_address.clone(),
            requested_at: now,
        }
    }

    /// A user-initiated "execute now". The amount may be overridden, e.g.
    /// a partial fill of the remaining budget; pair and gas ceiling always
    /// come from the configuration.
    pub fn manual(strategy: &Strategy, amount: Option<Decimal>, now: DateTime<Utc>) -> Self {
        let mut attempt = Self::scheduled(strategy, now);
        if let Some(amount) = amount {
            attempt.amount = amount;
        }
        attempt
    }
}
