//! Strategy repository for durable configuration and counters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

use dca_domain::entities::{Strategy, StrategyConfig, StrategyId};
use dca_domain::enums::{Cadence, StrategyStatus};
use dca_domain::value_objects::{Slippage, TokenPair};

use crate::store::{StoreError, StrategyStore};

/// Database record for a strategy row.
#[derive(Debug, Clone)]
struct StrategyRecord {
    id: Uuid,
    name: String,
    network: String,
    wallet_address: String,
    source_token: String,
    destination_token: String,
    amount: Decimal,
    cadence: String,
    max_gas_price: i64,
    slippage_bps: i32,
    total_budget: Decimal,
    executed_amount: Decimal,
    execution_count: i32,
    last_execution: Option<DateTime<Utc>>,
    next_execution: DateTime<Utc>,
    status: String,
    policy_rule_ids: Vec<String>,
    created_at: DateTime<Utc>,
}

impl StrategyRecord {
    /// Creates a StrategyRecord from a database row.
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            network: row.try_get("network")?,
            wallet_address: row.try_get("wallet_address")?,
            source_token: row.try_get("source_token")?,
            destination_token: row.try_get("destination_token")?,
            amount: row.try_get("amount")?,
            cadence: row.try_get("cadence")?,
            max_gas_price: row.try_get("max_gas_price")?,
            slippage_bps: row.try_get("slippage_bps")?,
            total_budget: row.try_get("total_budget")?,
            executed_amount: row.try_get("executed_amount")?,
            execution_count: row.try_get("execution_count")?,
            last_execution: row.try_get("last_execution")?,
            next_execution: row.try_get("next_execution")?,
            status: row.try_get("status")?,
            policy_rule_ids: row.try_get("policy_rule_ids")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Rebuilds the domain strategy from the raw record.
    fn into_strategy(self) -> Result<Strategy, StoreError> {
        let cadence: Cadence = self
            .cadence
            .parse()
            .map_err(|_| StoreError::CorruptRecord(format!("cadence '{}'", self.cadence)))?;
        let status = StrategyStatus::parse(&self.status)
            .ok_or_else(|| StoreError::CorruptRecord(format!("status '{}'", self.status)))?;
        let pair = TokenPair::new(self.source_token, self.destination_token)
            .map_err(|e| StoreError::CorruptRecord(format!("token pair: {e}")))?;
        let slippage_bps = u16::try_from(self.slippage_bps)
            .map_err(|_| StoreError::CorruptRecord(format!("slippage {} bps", self.slippage_bps)))?;
        let slippage = Slippage::from_bps(slippage_bps)
            .map_err(|e| StoreError::CorruptRecord(format!("slippage: {e}")))?;
        let max_gas_price = u64::try_from(self.max_gas_price)
            .map_err(|_| StoreError::CorruptRecord(format!("gas price {}", self.max_gas_price)))?;
        let execution_count = u32::try_from(self.execution_count).map_err(|_| {
            StoreError::CorruptRecord(format!("execution count {}", self.execution_count))
        })?;

        Ok(Strategy {
            id: StrategyId(self.id),
            config: StrategyConfig {
                name: self.name,
                network: self.network,
                wallet_address: self.wallet_address,
                pair,
                amount: self.amount,
                cadence,
                max_gas_price,
                slippage,
                total_budget: self.total_budget,
            },
            executed_amount: self.executed_amount,
            execution_count,
            last_execution: self.last_execution,
            next_execution: self.next_execution,
            status,
            policy_rule_ids: self.policy_rule_ids,
            created_at: self.created_at,
        })
    }
}

fn strategy_from_row(row: &PgRow) -> Result<Strategy, StoreError> {
    StrategyRecord::from_row(row)?.into_strategy()
}

/// Repository for strategy persistence.
#[derive(Clone)]
pub struct StrategyRepository {
    pool: Arc<PgPool>,
}

impl StrategyRepository {
    /// Creates a new StrategyRepository.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn gas_price_param(value: u64) -> Result<i64, StoreError> {
        i64::try_from(value)
            .map_err(|_| StoreError::CorruptRecord(format!("gas price {value} exceeds range")))
    }
}

#[async_trait]
impl StrategyStore for StrategyRepository {
    async fn create(
        &self,
        config: StrategyConfig,
        now: DateTime<Utc>,
    ) -> Result<Strategy, StoreError> {
        let strategy = Strategy::new(config, now)?;
        let max_gas_price = Self::gas_price_param(strategy.config.max_gas_price)?;

        let row = sqlx::query(
            r#"
            INSERT INTO strategies (id, name, network, wallet_address, source_token,
                                    destination_token, amount, cadence, max_gas_price,
                                    slippage_bps, total_budget, executed_amount,
                                    execution_count, last_execution, next_execution,
                                    status, policy_rule_ids, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(strategy.id.0)
        .bind(&strategy.config.name)
        .bind(&strategy.config.network)
        .bind(&strategy.config.wallet_address)
        .bind(&strategy.config.pair.source)
        .bind(&strategy.config.pair.destination)
        .bind(strategy.config.amount)
        .bind(strategy.config.cadence.as_str())
        .bind(max_gas_price)
        .bind(i32::from(strategy.config.slippage.bps()))
        .bind(strategy.config.total_budget)
        .bind(strategy.executed_amount)
        .bind(i32::try_from(strategy.execution_count).unwrap_or(0))
        .bind(strategy.last_execution)
        .bind(strategy.next_execution)
        .bind(strategy.status.as_str())
        .bind(&strategy.policy_rule_ids)
        .bind(strategy.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        strategy_from_row(&row)
    }

    async fn get(&self, id: StrategyId) -> Result<Option<Strategy>, StoreError> {
        let row = sqlx::query("SELECT * FROM strategies WHERE id = $1")
            .bind(id.0)
            .fetch_optional(self.pool.as_ref())
            .await?;
        row.as_ref().map(strategy_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Strategy>, StoreError> {
        let rows = sqlx::query("SELECT * FROM strategies ORDER BY created_at DESC")
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(strategy_from_row).collect()
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Strategy>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM strategies
            WHERE status = 'active' AND next_execution <= $1
            ORDER BY next_execution ASC
            "#,
        )
        .bind(now)
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.iter().map(strategy_from_row).collect()
    }

    async fn apply_execution_result(
        &self,
        id: StrategyId,
        executed_amount: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Strategy, StoreError> {
        // Single statement: counters, schedule and the completion
        // transition move together or not at all.
        let row = sqlx::query(
            r#"
            UPDATE strategies
            SET executed_amount = executed_amount + $2,
                execution_count = execution_count + 1,
                last_execution = $3,
                next_execution = $3 + CASE cadence
                    WHEN 'hourly' THEN interval '1 hour'
                    WHEN 'daily' THEN interval '24 hours'
                    ELSE interval '7 days'
                END,
                status = CASE
                    WHEN total_budget - (executed_amount + $2) < amount THEN 'completed'
                    ELSE status
                END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.0)
        .bind(executed_amount)
        .bind(timestamp)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(StoreError::NotFound(id))?;

        strategy_from_row(&row)
    }

    async fn set_status(
        &self,
        id: StrategyId,
        status: StrategyStatus,
    ) -> Result<Strategy, StoreError> {
        // Completed strategies cannot be reactivated; the WHERE clause
        // turns the update into a no-op and we return the row as-is.
        let row = sqlx::query(
            r#"
            UPDATE strategies
            SET status = $2
            WHERE id = $1 AND status <> 'completed'
            RETURNING *
            "#,
        )
        .bind(id.0)
        .bind(status.as_str())
        .fetch_optional(self.pool.as_ref())
        .await?;

        match row {
            Some(row) => strategy_from_row(&row),
            None => self.get(id).await?.ok_or(StoreError::NotFound(id)),
        }
    }

    async fn record_policy_rule(&self, id: StrategyId, rule_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE strategies SET policy_rule_ids = array_append(policy_rule_ids, $2) WHERE id = $1",
        )
        .bind(id.0)
        .bind(rule_id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
