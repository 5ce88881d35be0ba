//! In-memory storage backends.
//!
//! Used by the engine test-suite and by dry-run operation. They carry the
//! same counter semantics as the SQL repositories: one mutation path per
//! strategy, applied under a write lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use dca_domain::entities::{
    LedgerEntry, LedgerEntryId, NewLedgerEntry, Strategy, StrategyConfig, StrategyId,
};
use dca_domain::enums::StrategyStatus;

use crate::store::{ExecutionLedger, StoreError, StrategyStore};

/// Strategy store backed by a process-local map.
#[derive(Clone, Default)]
pub struct MemoryStrategyStore {
    strategies: Arc<RwLock<HashMap<StrategyId, Strategy>>>,
}

impl MemoryStrategyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StrategyStore for MemoryStrategyStore {
    async fn create(
        &self,
        config: StrategyConfig,
        now: DateTime<Utc>,
    ) -> Result<Strategy, StoreError> {
        let strategy = Strategy::new(config, now)?;
        self.strategies
            .write()
            .await
            .insert(strategy.id, strategy.clone());
        Ok(strategy)
    }

    async fn get(&self, id: StrategyId) -> Result<Option<Strategy>, StoreError> {
        Ok(self.strategies.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Strategy>, StoreError> {
        let mut all: Vec<Strategy> = self.strategies.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Strategy>, StoreError> {
        let mut due: Vec<Strategy> = self
            .strategies
            .read()
            .await
            .values()
            .filter(|s| s.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|s| s.next_execution);
        Ok(due)
    }

    async fn apply_execution_result(
        &self,
        id: StrategyId,
        executed_amount: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Strategy, StoreError> {
        let mut strategies = self.strategies.write().await;
        let strategy = strategies.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        strategy.apply_execution(executed_amount, timestamp);
        Ok(strategy.clone())
    }

    async fn set_status(
        &self,
        id: StrategyId,
        status: StrategyStatus,
    ) -> Result<Strategy, StoreError> {
        let mut strategies = self.strategies.write().await;
        let strategy = strategies.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        strategy.set_status(status);
        Ok(strategy.clone())
    }

    async fn record_policy_rule(&self, id: StrategyId, rule_id: &str) -> Result<(), StoreError> {
        let mut strategies = self.strategies.write().await;
        let strategy = strategies.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        strategy.policy_rule_ids.push(rule_id.to_string());
        Ok(())
    }
}

/// Execution ledger backed by a process-local vector, append order
/// preserved.
#[derive(Clone, Default)]
pub struct MemoryExecutionLedger {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl MemoryExecutionLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionLedger for MemoryExecutionLedger {
    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        if entry.strategy_id.0.is_nil() {
            return Err(StoreError::InvalidEntry(
                "missing strategy reference".to_string(),
            ));
        }
        let entry = LedgerEntry::from_new(LedgerEntryId::new(), entry);
        self.entries.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn list_by_strategy(&self, id: StrategyId) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.strategy_id == id)
            .cloned()
            .collect())
    }

    async fn executed_total(&self, id: StrategyId) -> Result<Decimal, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.strategy_id == id && e.counts_toward_spend())
            .map(|e| e.amount)
            .sum())
    }
}
