use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SquareConfig;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned an unexpected response: {0}")]
    Api(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayLineItem {
    pub name: String,
    pub quantity: u32,
    /// Line amount in minor units.
    pub amount: i64,
}

/// Provider-side order record. Creation is best-effort: a failure here is
/// logged by the caller and never aborts the payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrderRequest {
    pub reference: String,
    pub customer_email: String,
    pub line_items: Vec<GatewayLineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// One-time card token from the client SDK.
    pub source_id: String,
    /// Exact amount in the currency's minor units.
    pub amount: i64,
    pub currency: String,
    /// Guards the provider against double-charging a resubmitted request.
    pub idempotency_key: String,
    pub reference: String,
    pub buyer_email: Option<String>,
}

/// A decline is a domain outcome the customer can retry; only transport and
/// protocol problems surface as `GatewayError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Captured { payment_id: String, status: String },
    Declined { reason: String },
}

pub trait PaymentGateway: Send + Sync {
    fn create_gateway_order<'a>(
        &'a self,
        req: &'a GatewayOrderRequest,
    ) -> BoxFuture<'a, Result<String, GatewayError>>;

    fn charge<'a>(
        &'a self,
        req: &'a ChargeRequest,
    ) -> BoxFuture<'a, Result<ChargeOutcome, GatewayError>>;
}

/// Square REST client. Orders go to /v2/orders, payments to /v2/payments.
pub struct SquareGateway {
    http: reqwest::Client,
    config: SquareConfig,
}

impl SquareGateway {
    pub fn new(config: SquareConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn first_error_detail(body: &serde_json::Value) -> String {
        body.pointer("/errors/0/detail")
            .or_else(|| body.pointer("/errors/0/code"))
            .and_then(|v| v.as_str())
            .unwrap_or("payment was not accepted")
            .to_string()
    }
}

impl PaymentGateway for SquareGateway {
    fn create_gateway_order<'a>(
        &'a self,
        req: &'a GatewayOrderRequest,
    ) -> BoxFuture<'a, Result<String, GatewayError>> {
        Box::pin(async move {
            let url = format!("{}/v2/orders", self.config.base_url);
            let body = serde_json::json!({
                "idempotency_key": Uuid::new_v4(),
                "order": {
                    "location_id": self.config.location_id,
                    "reference_id": req.reference,
                    "line_items": req.line_items.iter().map(|item| {
                        serde_json::json!({
                            "name": item.name,
                            "quantity": item.quantity.to_string(),
                            "base_price_money": { "amount": item.amount, "currency": "USD" }
                        })
                    }).collect::<Vec<_>>(),
                }
            });

            let resp = self
                .http
                .post(&url)
                .bearer_auth(&self.config.access_token)
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            let payload: serde_json::Value = resp.json().await?;
            if !status.is_success() {
                return Err(GatewayError::Api(Self::first_error_detail(&payload)));
            }

            let order_id = payload
                .pointer("/order/id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| GatewayError::Api("order id missing from response".into()))?;
            Ok(order_id.to_string())
        })
    }

    fn charge<'a>(
        &'a self,
        req: &'a ChargeRequest,
    ) -> BoxFuture<'a, Result<ChargeOutcome, GatewayError>> {
        Box::pin(async move {
            let url = format!("{}/v2/payments", self.config.base_url);
            let body = serde_json::json!({
                "source_id": req.source_id,
                "idempotency_key": req.idempotency_key,
                "amount_money": { "amount": req.amount, "currency": req.currency },
                "location_id": self.config.location_id,
                "reference_id": req.reference,
                "buyer_email_address": req.buyer_email,
            });

            let resp = self
                .http
                .post(&url)
                .bearer_auth(&self.config.access_token)
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            let payload: serde_json::Value = resp.json().await?;

            // 4xx carries a structured decline (CARD_DECLINED, CVV_FAILURE, ...);
            // anything else non-2xx is a provider fault.
            if status.is_client_error() {
                return Ok(ChargeOutcome::Declined {
                    reason: Self::first_error_detail(&payload),
                });
            }
            if !status.is_success() {
                return Err(GatewayError::Api(format!("payment endpoint returned {status}")));
            }

            let payment_id = payload
                .pointer("/payment/id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| GatewayError::Api("payment id missing from response".into()))?;
            let payment_status = payload
                .pointer("/payment/status")
                .and_then(|v| v.as_str())
                .unwrap_or("COMPLETED");

            Ok(ChargeOutcome::Captured {
                payment_id: payment_id.to_string(),
                status: payment_status.to_string(),
            })
        })
    }
}

/// Approves everything. Bound when no Square credentials are configured so
/// the full flow stays exercisable in development.
pub struct StubGateway;

impl PaymentGateway for StubGateway {
    fn create_gateway_order<'a>(
        &'a self,
        req: &'a GatewayOrderRequest,
    ) -> BoxFuture<'a, Result<String, GatewayError>> {
        Box::pin(async move { Ok(format!("stub-order-{}", req.reference)) })
    }

    fn charge<'a>(
        &'a self,
        req: &'a ChargeRequest,
    ) -> BoxFuture<'a, Result<ChargeOutcome, GatewayError>> {
        Box::pin(async move {
            Ok(ChargeOutcome::Captured {
                payment_id: format!("stub-payment-{}", req.idempotency_key),
                status: "COMPLETED".to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_gateway_captures_with_idempotency_key_in_id() {
        let gateway = StubGateway;
        let outcome = gateway
            .charge(&ChargeRequest {
                source_id: "cnon:ok".into(),
                amount: 32399,
                currency: "USD".into(),
                idempotency_key: "FAF-1-AAAA-1".into(),
                reference: "FAF-1-AAAA".into(),
                buyer_email: None,
            })
            .await
            .unwrap();

        match outcome {
            ChargeOutcome::Captured { payment_id, status } => {
                assert!(payment_id.contains("FAF-1-AAAA-1"));
                assert_eq!(status, "COMPLETED");
            }
            ChargeOutcome::Declined { .. } => panic!("stub should capture"),
        }
    }
}
