use rust_decimal::Decimal;
use thiserror::Error;

/// Rejections raised while validating a strategy configuration.
///
/// These are synchronous creation-time failures; a strategy that fails
/// validation is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("per-execution amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("total budget {budget} is smaller than the per-execution amount {amount}")]
    BudgetBelowAmount { budget: Decimal, amount: Decimal },

    #[error("unknown cadence '{0}', expected hourly, daily or weekly")]
    UnknownCadence(String),

    #[error("token symbol cannot be empty")]
    EmptyTokenSymbol,

    #[error("source and destination tokens must differ, both are '{0}'")]
    IdenticalTokens(String),

    #[error("max gas price must be positive")]
    NonPositiveGasPrice,

    #[error("slippage must be positive")]
    NonPositiveSlippage,

    #[error("slippage {0} bps exceeds the {1} bps ceiling")]
    SlippageAboveCeiling(u16, u16),

    #[error("wallet address cannot be empty")]
    EmptyWalletAddress,

    #[error("strategy name cannot be empty")]
    EmptyName,

    #[error("network cannot be empty")]
    EmptyNetwork,
}
