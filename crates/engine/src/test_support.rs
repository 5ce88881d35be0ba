//! Shared fixtures for the engine test-suite.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use dca_data::memory::{MemoryExecutionLedger, MemoryStrategyStore};
use dca_domain::entities::StrategyConfig;
use dca_domain::enums::Cadence;
use dca_domain::value_objects::{Slippage, TokenPair};
use dca_gateway::{
    GatewayError, PolicyRegistrar, RuleReceipt, RuleSubmission, SignedExecution, SigningGateway,
    TradeIntent,
};

use crate::pipeline::{ExecutionPipeline, PipelineConfig};

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// amount=100, budget=250, daily cadence: the shape most scenarios use.
pub fn config() -> StrategyConfig {
    StrategyConfig {
        name: "daily eth".to_string(),
        network: "ethereum".to_string(),
        wallet_address: "0xabc".to_string(),
        pair: TokenPair::new("USDC", "ETH").unwrap(),
        amount: dec!(100),
        cadence: Cadence::Daily,
        max_gas_price: 50_000_000_000,
        slippage: Slippage::from_bps(50).unwrap(),
        total_budget: dec!(250),
    }
}

/// Memory-backed store, ledger and pipeline around the given signer.
pub fn setup<S: SigningGateway + 'static>(
    signer: S,
) -> (
    Arc<MemoryStrategyStore>,
    Arc<MemoryExecutionLedger>,
    ExecutionPipeline,
) {
    let store = Arc::new(MemoryStrategyStore::new());
    let ledger = Arc::new(MemoryExecutionLedger::new());
    let pipeline = ExecutionPipeline::new(
        store.clone(),
        ledger.clone(),
        Arc::new(signer),
        PipelineConfig {
            signing_timeout: Duration::from_secs(30),
        },
    );
    (store, ledger, pipeline)
}

/// Signer that always confirms with a fixed transaction reference.
pub struct StaticSigner {
    transaction_ref: String,
}

impl StaticSigner {
    pub fn new(transaction_ref: impl Into<String>) -> Self {
        Self {
            transaction_ref: transaction_ref.into(),
        }
    }
}

#[async_trait]
impl SigningGateway for StaticSigner {
    async fn sign(&self, _intent: TradeIntent) -> Result<SignedExecution, GatewayError> {
        Ok(SignedExecution {
            transaction_ref: self.transaction_ref.clone(),
        })
    }
}

/// Signer that always rejects.
pub struct FailingSigner {
    reason: String,
}

impl FailingSigner {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SigningGateway for FailingSigner {
    async fn sign(&self, _intent: TradeIntent) -> Result<SignedExecution, GatewayError> {
        Err(GatewayError::Rejected {
            reason: self.reason.clone(),
        })
    }
}

/// Signer that never answers; exercises the pipeline timeout.
pub struct HangingSigner;

#[async_trait]
impl SigningGateway for HangingSigner {
    async fn sign(&self, _intent: TradeIntent) -> Result<SignedExecution, GatewayError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        unreachable!("the pipeline timeout fires first");
    }
}

/// Signer that fails a set number of times before confirming.
pub struct FlakySigner {
    failures_left: AtomicU32,
    transaction_ref: String,
}

impl FlakySigner {
    pub fn new(failures: u32, transaction_ref: impl Into<String>) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            transaction_ref: transaction_ref.into(),
        }
    }
}

#[async_trait]
impl SigningGateway for FlakySigner {
    async fn sign(&self, _intent: TradeIntent) -> Result<SignedExecution, GatewayError> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(GatewayError::Rejected {
                reason: "custody temporarily unavailable".to_string(),
            });
        }
        Ok(SignedExecution {
            transaction_ref: self.transaction_ref.clone(),
        })
    }
}

/// Registrar that always returns a fixed rule id.
pub struct StaticRegistrar {
    rule_id: String,
}

impl StaticRegistrar {
    pub fn new(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
        }
    }
}

#[async_trait]
impl PolicyRegistrar for StaticRegistrar {
    async fn register(&self, _submission: RuleSubmission) -> Result<RuleReceipt, GatewayError> {
        Ok(RuleReceipt {
            rule_id: self.rule_id.clone(),
        })
    }
}

/// Registrar that always fails.
pub struct FailingRegistrar;

#[async_trait]
impl PolicyRegistrar for FailingRegistrar {
    async fn register(&self, _submission: RuleSubmission) -> Result<RuleReceipt, GatewayError> {
        Err(GatewayError::Rejected {
            reason: "rule language rejected".to_string(),
        })
    }
}

/// Registrar that never answers; exercises the provisioning timeout.
pub struct HangingRegistrar;

#[async_trait]
impl PolicyRegistrar for HangingRegistrar {
    async fn register(&self, _submission: RuleSubmission) -> Result<RuleReceipt, GatewayError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        unreachable!("the provisioning timeout fires first");
    }
}
