//! Strategy provisioning.
//!
//! Creation validates and persists the strategy, then mirrors its gas
//! ceiling as a declarative rule with the policy registrar. Registration
//! is best effort: the local guard is the authoritative gate, the remote
//! rule is a second layer of enforcement, and a strategy activates whether
//! or not the rule lands.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{info, warn};

use dca_data::store::StrategyStore;
use dca_domain::entities::{Strategy, StrategyConfig, StrategyId};
use dca_domain::enums::StrategyStatus;
use dca_gateway::{PolicyRegistrar, RuleKind, RuleSubmission};

use crate::error::EngineError;

/// Outcome of the policy registration attempted at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyRegistration {
    Registered { rule_ids: Vec<String> },
    /// Registration failed; the strategy is active regardless and the
    /// warning is surfaced to the caller.
    Failed { warning: String },
}

/// A freshly created strategy plus its registration outcome.
#[derive(Debug, Clone)]
pub struct ProvisionedStrategy {
    pub strategy: Strategy,
    pub registration: PolicyRegistration,
}

/// Configuration for provisioning.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Ceiling on how long a registrar call may block.
    pub registrar_timeout: Duration,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            registrar_timeout: Duration::from_secs(10),
        }
    }
}

/// Creates strategies and manages their lifecycle status.
pub struct StrategyProvisioner {
    store: Arc<dyn StrategyStore>,
    registrar: Arc<dyn PolicyRegistrar>,
    config: ProvisionerConfig,
}

impl StrategyProvisioner {
    pub fn new(
        store: Arc<dyn StrategyStore>,
        registrar: Arc<dyn PolicyRegistrar>,
        config: ProvisionerConfig,
    ) -> Self {
        Self {
            store,
            registrar,
            config,
        }
    }

    /// Validates, persists and activates a strategy, then registers its
    /// gas-ceiling rule with the custody service.
    pub async fn create(
        &self,
        config: StrategyConfig,
        now: DateTime<Utc>,
    ) -> Result<ProvisionedStrategy, EngineError> {
        let mut strategy = self.store.create(config, now).await?;
        info!(
            strategy = %strategy.id,
            pair = %strategy.config.pair,
            cadence = %strategy.config.cadence,
            "strategy created"
        );

        let submission = RuleSubmission {
            network: strategy.config.network.clone(),
            kind: RuleKind::MaxGasPrice,
            threshold: strategy.config.max_gas_price,
        };

        let registration = match timeout(
            self.config.registrar_timeout,
            self.registrar.register(submission),
        )
        .await
        {
            Ok(Ok(receipt)) => {
                self.store
                    .record_policy_rule(strategy.id, &receipt.rule_id)
                    .await?;
                strategy.policy_rule_ids.push(receipt.rule_id.clone());
                info!(strategy = %strategy.id, rule = %receipt.rule_id, "policy rule registered");
                PolicyRegistration::Registered {
                    rule_ids: vec![receipt.rule_id],
                }
            }
            Ok(Err(err)) => {
                warn!(
                    strategy = %strategy.id,
                    error = %err,
                    "policy registration failed; strategy active without remote rule"
                );
                PolicyRegistration::Failed {
                    warning: err.to_string(),
                }
            }
            Err(_) => {
                let warning = format!(
                    "policy registrar timed out after {}s",
                    self.config.registrar_timeout.as_secs()
                );
                warn!(strategy = %strategy.id, "{warning}; strategy active without remote rule");
                PolicyRegistration::Failed { warning }
            }
        };

        Ok(ProvisionedStrategy {
            strategy,
            registration,
        })
    }

    /// Pauses a strategy; takes effect before its next sweep tick.
    pub async fn pause(&self, id: StrategyId) -> Result<Strategy, EngineError> {
        Ok(self.store.set_status(id, StrategyStatus::Paused).await?)
    }

    /// Resumes a paused strategy. Completed strategies stay completed.
    pub async fn resume(&self, id: StrategyId) -> Result<Strategy, EngineError> {
        Ok(self.store.set_status(id, StrategyStatus::Active).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ExecutionPipeline, ExecutionReport, PipelineConfig};
    use crate::test_support::{
        config, epoch, FailingRegistrar, HangingRegistrar, StaticRegistrar, StaticSigner,
    };
    use dca_data::memory::{MemoryExecutionLedger, MemoryStrategyStore};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn provisioner<R: PolicyRegistrar + 'static>(
        store: Arc<MemoryStrategyStore>,
        registrar: R,
    ) -> StrategyProvisioner {
        StrategyProvisioner::new(store, Arc::new(registrar), ProvisionerConfig::default())
    }

    #[tokio::test]
    async fn test_create_registers_rule() {
        let store = Arc::new(MemoryStrategyStore::new());
        let provisioner = provisioner(store.clone(), StaticRegistrar::new("rule-77"));

        let provisioned = provisioner.create(config(), epoch()).await.unwrap();
        assert_eq!(
            provisioned.registration,
            PolicyRegistration::Registered {
                rule_ids: vec!["rule-77".to_string()]
            }
        );
        assert_eq!(
            provisioned.strategy.policy_rule_ids,
            vec!["rule-77".to_string()]
        );

        let persisted = store.get(provisioned.strategy.id).await.unwrap().unwrap();
        assert_eq!(persisted.policy_rule_ids, vec!["rule-77".to_string()]);
    }

    #[tokio::test]
    async fn test_registrar_failure_is_non_fatal() {
        // Scenario D: the strategy is created, active and rule-less.
        let store = Arc::new(MemoryStrategyStore::new());
        let provisioner = provisioner(store.clone(), FailingRegistrar);

        let provisioned = provisioner.create(config(), epoch()).await.unwrap();
        assert!(matches!(
            provisioned.registration,
            PolicyRegistration::Failed { ref warning } if warning.contains("rule language")
        ));
        assert_eq!(provisioned.strategy.status, StrategyStatus::Active);
        assert!(provisioned.strategy.policy_rule_ids.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_registrar_timeout_is_non_fatal() {
        let store = Arc::new(MemoryStrategyStore::new());
        let provisioner = provisioner(store.clone(), HangingRegistrar);

        let provisioned = provisioner.create(config(), epoch()).await.unwrap();
        assert!(matches!(
            provisioned.registration,
            PolicyRegistration::Failed { ref warning } if warning.contains("timed out")
        ));
        assert_eq!(provisioned.strategy.status, StrategyStatus::Active);
    }

    #[tokio::test]
    async fn test_guard_behavior_identical_without_remote_rule() {
        // Scenario D, second half: a rule-less strategy executes exactly
        // like one with a registered rule.
        let store = Arc::new(MemoryStrategyStore::new());
        let ledger = Arc::new(MemoryExecutionLedger::new());
        let pipeline = ExecutionPipeline::new(
            store.clone(),
            ledger,
            Arc::new(StaticSigner::new("0xsame")),
            PipelineConfig::default(),
        );

        let with_rule = provisioner(store.clone(), StaticRegistrar::new("rule-1"))
            .create(config(), epoch())
            .await
            .unwrap();
        let without_rule = provisioner(store.clone(), FailingRegistrar)
            .create(config(), epoch())
            .await
            .unwrap();

        let first = pipeline
            .execute_manual(with_rule.strategy.id, None, epoch())
            .await
            .unwrap();
        let second = pipeline
            .execute_manual(without_rule.strategy.id, None, epoch())
            .await
            .unwrap();

        assert!(matches!(first, ExecutionReport::Executed { .. }));
        assert!(matches!(second, ExecutionReport::Executed { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_config() {
        let store = Arc::new(MemoryStrategyStore::new());
        let provisioner = provisioner(store, StaticRegistrar::new("rule-1"));

        let mut bad = config();
        bad.amount = Decimal::ZERO;
        let err = provisioner.create(bad, epoch()).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_pause_resume_lifecycle() {
        let store = Arc::new(MemoryStrategyStore::new());
        let provisioner = provisioner(store.clone(), StaticRegistrar::new("rule-1"));
        let provisioned = provisioner.create(config(), epoch()).await.unwrap();
        let id = provisioned.strategy.id;

        let paused = provisioner.pause(id).await.unwrap();
        assert_eq!(paused.status, StrategyStatus::Paused);

        let resumed = provisioner.resume(id).await.unwrap();
        assert_eq!(resumed.status, StrategyStatus::Active);

        // Completed strategies cannot be resumed.
        store
            .apply_execution_result(id, dec!(250), epoch())
            .await
            .unwrap();
        let still_done = provisioner.resume(id).await.unwrap();
        assert_eq!(still_done.status, StrategyStatus::Completed);
    }
}
