//! Ledger repository for the append-only execution audit trail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

use dca_domain::entities::{LedgerEntry, LedgerEntryId, NewLedgerEntry, StrategyId};
use dca_domain::enums::ExecutionOutcome;
use dca_domain::guard::GuardReason;

use crate::store::{ExecutionLedger, StoreError};

/// Database record for a ledger row.
#[derive(Debug, Clone)]
struct LedgerRecord {
    id: Uuid,
    strategy_id: Uuid,
    amount: Decimal,
    outcome: String,
    rejection_reason: Option<String>,
    failure_detail: Option<String>,
    transaction_ref: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl LedgerRecord {
    /// Creates a LedgerRecord from a database row.
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            strategy_id: row.try_get("strategy_id")?,
            amount: row.try_get("amount")?,
            outcome: row.try_get("outcome")?,
            rejection_reason: row.try_get("rejection_reason")?,
            failure_detail: row.try_get("failure_detail")?,
            transaction_ref: row.try_get("transaction_ref")?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }

    fn into_entry(self) -> Result<LedgerEntry, StoreError> {
        let outcome = ExecutionOutcome::parse(&self.outcome)
            .ok_or_else(|| StoreError::CorruptRecord(format!("outcome '{}'", self.outcome)))?;
        let rejection_reason = match self.rejection_reason {
            Some(code) => Some(
                GuardReason::from_code(&code)
                    .ok_or_else(|| StoreError::CorruptRecord(format!("guard reason '{code}'")))?,
            ),
            None => None,
        };

        Ok(LedgerEntry {
            id: LedgerEntryId(self.id),
            strategy_id: StrategyId(self.strategy_id),
            amount: self.amount,
            outcome,
            rejection_reason,
            failure_detail: self.failure_detail,
            transaction_ref: self.transaction_ref,
            recorded_at: self.recorded_at,
        })
    }
}

fn entry_from_row(row: &PgRow) -> Result<LedgerEntry, StoreError> {
    LedgerRecord::from_row(row)?.into_entry()
}

/// Repository for the execution ledger. Insert-only by construction:
/// there is no update or delete path.
#[derive(Clone)]
pub struct LedgerRepository {
    pool: Arc<PgPool>,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionLedger for LedgerRepository {
    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        if entry.strategy_id.0.is_nil() {
            return Err(StoreError::InvalidEntry(
                "missing strategy reference".to_string(),
            ));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO ledger_entries (id, strategy_id, amount, outcome,
                                        rejection_reason, failure_detail,
                                        transaction_ref, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(LedgerEntryId::new().0)
        .bind(entry.strategy_id.0)
        .bind(entry.amount)
        .bind(entry.outcome.as_str())
        .bind(entry.rejection_reason.map(|r| r.code()))
        .bind(&entry.failure_detail)
        .bind(&entry.transaction_ref)
        .bind(entry.recorded_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        entry_from_row(&row)
    }

    async fn list_by_strategy(&self, id: StrategyId) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM ledger_entries
            WHERE strategy_id = $1
            ORDER BY recorded_at ASC, id ASC
            "#,
        )
        .bind(id.0)
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn executed_total(&self, id: StrategyId) -> Result<Decimal, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount), 0) AS total
            FROM ledger_entries
            WHERE strategy_id = $1 AND outcome = 'approved-executed'
            "#,
        )
        .bind(id.0)
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(row.try_get("total")?)
    }
}
