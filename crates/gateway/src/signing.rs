//! Signing gateway client.
//!
//! The gateway holds the private keys; this side only submits an approved
//! transaction intent and reports the outcome. The request/response shapes
//! here are the entire contract the engine sees.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::GatewayError;

/// An approved transaction intent handed to the custody service.
#[derive(Debug, Clone, Serialize)]
pub struct TradeIntent {
    pub wallet_address: String,
    pub source_token: String,
    pub destination_token: String,
    pub amount: Decimal,
    /// Ceiling in base units.
    pub max_gas_price: u64,
    pub network: String,
}

/// Confirmed execution returned by the custody service.
#[derive(Debug, Clone, Deserialize)]
pub struct SignedExecution {
    /// Opaque execution/transaction reference.
    pub transaction_ref: String,
}

/// The signing collaborator the execution pipeline calls after guard
/// approval.
#[async_trait]
pub trait SigningGateway: Send + Sync {
    async fn sign(&self, intent: TradeIntent) -> Result<SignedExecution, GatewayError>;
}

/// Wire response from the signing endpoint.
#[derive(Debug, Deserialize)]
struct SignResponse {
    success: bool,
    #[serde(default)]
    transaction_ref: Option<String>,
    #[serde(default)]
    failure_reason: Option<String>,
}

/// HTTP client for the signing gateway.
pub struct HttpSigningGateway {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSigningGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl SigningGateway for HttpSigningGateway {
    async fn sign(&self, intent: TradeIntent) -> Result<SignedExecution, GatewayError> {
        let url = format!("{}/v1/executions", self.base_url);
        debug!(
            wallet = %intent.wallet_address,
            network = %intent.network,
            amount = %intent.amount,
            "submitting trade intent"
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&intent)
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

        let body: SignResponse = response.json().await?;
        if !body.success {
            return Err(GatewayError::Rejected {
                reason: body
                    .failure_reason
                    .unwrap_or_else(|| "unspecified".to_string()),
            });
        }

        body.transaction_ref
            .map(|transaction_ref| SignedExecution { transaction_ref })
            .ok_or_else(|| {
                GatewayError::InvalidResponse("missing transaction_ref on success".to_string())
            })
    }
}

/// Signer for dry-run operation: logs the intent and fabricates a local
/// reference without touching any custody service.
#[derive(Debug, Default, Clone)]
pub struct DryRunSigningGateway;

#[async_trait]
impl SigningGateway for DryRunSigningGateway {
    async fn sign(&self, intent: TradeIntent) -> Result<SignedExecution, GatewayError> {
        let transaction_ref = format!("dry-run-{}", Uuid::new_v4());
        info!(
            wallet = %intent.wallet_address,
            pair = format!("{}/{}", intent.source_token, intent.destination_token),
            amount = %intent.amount,
            tx = %transaction_ref,
            "dry run: intent not sent"
        );
        Ok(SignedExecution { transaction_ref })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_trade_intent_wire_shape() {
        let intent = TradeIntent {
            wallet_address: "0xabc".to_string(),
            source_token: "USDC".to_string(),
            destination_token: "ETH".to_string(),
            amount: dec!(100),
            max_gas_price: 50_000_000_000,
            network: "ethereum".to_string(),
        };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["wallet_address"], "0xabc");
        assert_eq!(json["max_gas_price"], 50_000_000_000u64);
        assert_eq!(json["network"], "ethereum");
    }

    #[test]
    fn test_sign_response_tolerates_missing_fields() {
        let ok: SignResponse =
            serde_json::from_str(r#"{"success": true, "transaction_ref": "0xdead"}"#).unwrap();
        assert!(ok.success);
        assert_eq!(ok.transaction_ref.as_deref(), Some("0xdead"));

        let failed: SignResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!failed.success);
        assert!(failed.failure_reason.is_none());
    }

    #[tokio::test]
    async fn test_dry_run_signer_returns_local_ref() {
        let signer = DryRunSigningGateway;
        let result = signer
            .sign(TradeIntent {
                wallet_address: "0xabc".to_string(),
                source_token: "USDC".to_string(),
                destination_token: "ETH".to_string(),
                amount: dec!(1),
                max_gas_price: 1,
                network: "ethereum".to_string(),
            })
            .await
            .unwrap();
        assert!(result.transaction_ref.starts_with("dry-run-"));
    }
}
