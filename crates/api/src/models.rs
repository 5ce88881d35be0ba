//! API request/response models.
//!
//! Numeric user input arrives as decimal strings and is validated here,
//! before anything reaches the store: every numeric field must parse as a
//! positive decimal, and the cadence must be one of the enumerated values.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dca_domain::entities::{LedgerEntry, Strategy, StrategyConfig};
use dca_domain::enums::{Cadence, ExecutionOutcome, StrategyStatus};
use dca_domain::value_objects::gas_price;
use dca_domain::value_objects::{Slippage, TokenPair};
use dca_engine::pipeline::ExecutionReport;
use dca_engine::provisioning::{PolicyRegistration, ProvisionedStrategy};
use dca_engine::reconciler::ReconcileReport;

use crate::error::ApiError;

fn parse_positive_decimal(field: &str, raw: &str) -> Result<Decimal, ApiError> {
    let value: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation(format!("{field} must be a decimal number")))?;
    if value <= Decimal::ZERO {
        return Err(ApiError::Validation(format!("{field} must be positive")));
    }
    Ok(value)
}

/// Body of `POST /strategies`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStrategyRequest {
    pub name: String,
    pub network: String,
    pub wallet_address: String,
    pub source_token: String,
    pub destination_token: String,
    /// Per-execution amount, positive decimal string.
    pub amount: String,
    /// One of `hourly`, `daily`, `weekly`.
    pub cadence: String,
    /// Gas ceiling in gwei; normalized to base units before storage.
    pub max_gas_price_gwei: u64,
    pub slippage_bps: u16,
    /// Lifetime budget, positive decimal string.
    pub total_budget: String,
}

impl CreateStrategyRequest {
    pub fn into_config(self) -> Result<StrategyConfig, ApiError> {
        let amount = parse_positive_decimal("amount", &self.amount)?;
        let total_budget = parse_positive_decimal("total_budget", &self.total_budget)?;
        let cadence: Cadence = self
            .cadence
            .parse()
            .map_err(|err: dca_domain::error::ValidationError| {
                ApiError::Validation(err.to_string())
            })?;
        let pair = TokenPair::new(self.source_token, self.destination_token)
            .map_err(|err| ApiError::Validation(err.to_string()))?;
        let slippage = Slippage::from_bps(self.slippage_bps)
            .map_err(|err| ApiError::Validation(err.to_string()))?;
        if self.max_gas_price_gwei == 0 {
            return Err(ApiError::Validation(
                "max_gas_price_gwei must be positive".to_string(),
            ));
        }

        Ok(StrategyConfig {
            name: self.name,
            network: self.network,
            wallet_address: self.wallet_address,
            pair,
            amount,
            cadence,
            max_gas_price: gas_price::gwei_to_base(self.max_gas_price_gwei),
            slippage,
            total_budget,
        })
    }
}

/// Body of `POST /strategies/{id}/execute`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteRequest {
    /// Optional override for the attempt amount, positive decimal string.
    #[serde(default)]
    pub amount: Option<String>,
}

impl ExecuteRequest {
    pub fn parse_amount(&self) -> Result<Option<Decimal>, ApiError> {
        self.amount
            .as_deref()
            .map(|raw| parse_positive_decimal("amount", raw))
            .transpose()
    }
}

/// A strategy as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyResponse {
    pub id: Uuid,
    pub name: String,
    pub network: String,
    pub wallet_address: String,
    pub source_token: String,
    pub destination_token: String,
    pub amount: Decimal,
    pub cadence: Cadence,
    pub max_gas_price: u64,
    pub slippage_bps: u16,
    pub total_budget: Decimal,
    pub executed_amount: Decimal,
    pub execution_count: u32,
    pub last_execution: Option<DateTime<Utc>>,
    pub next_execution: DateTime<Utc>,
    pub status: StrategyStatus,
    pub policy_rule_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Strategy> for StrategyResponse {
    fn from(strategy: Strategy) -> Self {
        Self {
            id: strategy.id.0,
            name: strategy.config.name,
            network: strategy.config.network,
            wallet_address: strategy.config.wallet_address,
            source_token: strategy.config.pair.source,
            destination_token: strategy.config.pair.destination,
            amount: strategy.config.amount,
            cadence: strategy.config.cadence,
            max_gas_price: strategy.config.max_gas_price,
            slippage_bps: strategy.config.slippage.bps(),
            total_budget: strategy.config.total_budget,
            executed_amount: strategy.executed_amount,
            execution_count: strategy.execution_count,
            last_execution: strategy.last_execution,
            next_execution: strategy.next_execution,
            status: strategy.status,
            policy_rule_ids: strategy.policy_rule_ids,
            created_at: strategy.created_at,
        }
    }
}

/// Response of `POST /strategies`: the strategy plus any registration
/// warning. A warning does not stop activation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateStrategyResponse {
    #[serde(flatten)]
    pub strategy: StrategyResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_warning: Option<String>,
}

impl From<ProvisionedStrategy> for CreateStrategyResponse {
    fn from(provisioned: ProvisionedStrategy) -> Self {
        let policy_warning = match provisioned.registration {
            PolicyRegistration::Registered { .. } => None,
            PolicyRegistration::Failed { warning } => Some(warning),
        };
        Self {
            strategy: provisioned.strategy.into(),
            policy_warning,
        }
    }
}

/// Outcome of a manual execution trigger.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResponse {
    pub outcome: ExecutionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Whether the sweep will retry this on its own.
    pub will_retry: bool,
}

impl From<ExecutionReport> for ExecutionResponse {
    fn from(report: ExecutionReport) -> Self {
        match report {
            ExecutionReport::Executed {
                transaction_ref, ..
            } => Self {
                outcome: ExecutionOutcome::ApprovedExecuted,
                transaction_ref: Some(transaction_ref),
                reason: None,
                detail: None,
                will_retry: false,
            },
            ExecutionReport::Rejected { reason } => Self {
                outcome: ExecutionOutcome::Rejected,
                transaction_ref: None,
                reason: Some(reason.code()),
                detail: None,
                will_retry: reason.resolves_on_retry(),
            },
            ExecutionReport::FailedDownstream { detail } => Self {
                outcome: ExecutionOutcome::ApprovedFailedDownstream,
                transaction_ref: None,
                reason: None,
                detail: Some(detail),
                will_retry: true,
            },
        }
    }
}

/// A ledger entry as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntryResponse {
    pub id: Uuid,
    pub strategy_id: Uuid,
    pub amount: Decimal,
    pub outcome: ExecutionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl From<LedgerEntry> for LedgerEntryResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id.0,
            strategy_id: entry.strategy_id.0,
            amount: entry.amount,
            outcome: entry.outcome,
            rejection_reason: entry.rejection_reason.map(|r| r.code()),
            failure_detail: entry.failure_detail,
            transaction_ref: entry.transaction_ref,
            recorded_at: entry.recorded_at,
        }
    }
}

/// Drift report for one strategy.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResponse {
    pub strategy_id: Uuid,
    pub counter_amount: Decimal,
    pub ledger_amount: Decimal,
    pub drift: Decimal,
    pub in_sync: bool,
}

impl From<ReconcileReport> for ReconciliationResponse {
    fn from(report: ReconcileReport) -> Self {
        Self {
            strategy_id: report.strategy_id.0,
            drift: report.drift(),
            counter_amount: report.counter_amount,
            ledger_amount: report.ledger_amount,
            in_sync: report.in_sync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> CreateStrategyRequest {
        CreateStrategyRequest {
            name: "daily eth".to_string(),
            network: "ethereum".to_string(),
            wallet_address: "0xabc".to_string(),
            source_token: "USDC".to_string(),
            destination_token: "ETH".to_string(),
            amount: "100".to_string(),
            cadence: "daily".to_string(),
            max_gas_price_gwei: 50,
            slippage_bps: 50,
            total_budget: "250".to_string(),
        }
    }

    #[test]
    fn test_request_converts_and_normalizes_gas() {
        let config = request().into_config().unwrap();
        assert_eq!(config.amount, dec!(100));
        assert_eq!(config.cadence, Cadence::Daily);
        assert_eq!(config.max_gas_price, 50_000_000_000);
    }

    #[test]
    fn test_request_rejects_non_positive_decimals() {
        let mut bad = request();
        bad.amount = "0".to_string();
        assert!(matches!(
            bad.into_config(),
            Err(ApiError::Validation(message)) if message.contains("amount")
        ));

        let mut bad = request();
        bad.total_budget = "-5".to_string();
        assert!(bad.into_config().is_err());

        let mut bad = request();
        bad.amount = "a lot".to_string();
        assert!(bad.into_config().is_err());
    }

    #[test]
    fn test_request_rejects_unknown_cadence() {
        let mut bad = request();
        bad.cadence = "sometimes".to_string();
        assert!(matches!(
            bad.into_config(),
            Err(ApiError::Validation(message)) if message.contains("cadence")
        ));
    }

    #[test]
    fn test_request_rejects_zero_gas() {
        let mut bad = request();
        bad.max_gas_price_gwei = 0;
        assert!(bad.into_config().is_err());
    }

    #[test]
    fn test_execute_request_amount_parsing() {
        let none = ExecuteRequest::default();
        assert_eq!(none.parse_amount().unwrap(), None);

        let some = ExecuteRequest {
            amount: Some("50".to_string()),
        };
        assert_eq!(some.parse_amount().unwrap(), Some(dec!(50)));

        let bad = ExecuteRequest {
            amount: Some("-50".to_string()),
        };
        assert!(bad.parse_amount().is_err());
    }
}
