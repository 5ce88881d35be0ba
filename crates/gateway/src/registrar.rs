//! Policy registrar client.
//!
//! At strategy creation the engine mirrors the local gas ceiling as a
//! declarative rule held by the custody service, scoped to the strategy's
//! network. Registration is fire-and-forget: the local guard never depends
//! on the remote rule existing or the registrar being reachable.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::GatewayError;

/// Kind of declarative rule the registrar accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    MaxGasPrice,
}

/// A rule submission, scoped to one network.
#[derive(Debug, Clone, Serialize)]
pub struct RuleSubmission {
    pub network: String,
    pub kind: RuleKind,
    /// Threshold in base units.
    pub threshold: u64,
}

/// Identifier of a registered rule.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleReceipt {
    pub rule_id: String,
}

/// The registrar collaborator, used only at strategy creation.
#[async_trait]
pub trait PolicyRegistrar: Send + Sync {
    async fn register(&self, submission: RuleSubmission) -> Result<RuleReceipt, GatewayError>;
}

/// HTTP client for the policy registrar.
pub struct HttpPolicyRegistrar {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpPolicyRegistrar {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PolicyRegistrar for HttpPolicyRegistrar {
    async fn register(&self, submission: RuleSubmission) -> Result<RuleReceipt, GatewayError> {
        let url = format!("{}/v1/policies", self.base_url);
        debug!(
            network = %submission.network,
            kind = ?submission.kind,
            threshold = submission.threshold,
            "registering policy rule"
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&submission)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GatewayError::Timeout(self.timeout)
                } else {
                    GatewayError::Http(err)
                }
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::Rejected {
                reason: format!("HTTP {}", response.status()),
            });
        }

        let receipt: RuleReceipt = response.json().await?;
        if receipt.rule_id.is_empty() {
            return Err(GatewayError::InvalidResponse("empty rule_id".to_string()));
        }
        Ok(receipt)
    }
}

/// Registrar for dry-run operation: fabricates a local rule id.
#[derive(Debug, Default, Clone)]
pub struct DryRunPolicyRegistrar;

#[async_trait]
impl PolicyRegistrar for DryRunPolicyRegistrar {
    async fn register(&self, submission: RuleSubmission) -> Result<RuleReceipt, GatewayError> {
        let rule_id = format!("dry-run-rule-{}", Uuid::new_v4());
        info!(
            network = %submission.network,
            threshold = submission.threshold,
            rule = %rule_id,
            "dry run: rule not registered"
        );
        Ok(RuleReceipt { rule_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_submission_wire_shape() {
        let submission = RuleSubmission {
            network: "polygon".to_string(),
            kind: RuleKind::MaxGasPrice,
            threshold: 80_000_000_000,
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["kind"], "max-gas-price");
        assert_eq!(json["network"], "polygon");
        assert_eq!(json["threshold"], 80_000_000_000u64);
    }

    #[tokio::test]
    async fn test_dry_run_registrar_returns_local_rule() {
        let registrar = DryRunPolicyRegistrar;
        let receipt = registrar
            .register(RuleSubmission {
                network: "ethereum".to_string(),
                kind: RuleKind::MaxGasPrice,
                threshold: 1,
            })
            .await
            .unwrap();
        assert!(receipt.rule_id.starts_with("dry-run-rule-"));
    }
}
