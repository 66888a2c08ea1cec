//! Card-processing gateway boundary.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

const STRIPE_INTENT_URL: &str = "https://api.stripe.com/v1/payment_intents";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway rejected the request (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("gateway response missing client secret")]
    MalformedResponse,
}

/// A created payment intent; `client_secret` goes back to the browser so the
/// card form can confirm the charge directly with the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for `amount_cents` USD cents.
    async fn create_intent(&self, amount_cents: u64) -> Result<PaymentIntent, GatewayError>;
}

/// Stripe-backed gateway.
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    client_secret: Option<String>,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, amount_cents: u64) -> Result<PaymentIntent, GatewayError> {
        let response = self
            .client
            .post(STRIPE_INTENT_URL)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("amount", amount_cents.to_string()),
                ("currency", "usd".to_string()),
                ("automatic_payment_methods[enabled]", "true".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "payment intent creation rejected");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let intent: IntentResponse = response.json().await?;
        let client_secret = intent
            .client_secret
            .ok_or(GatewayError::MalformedResponse)?;

        Ok(PaymentIntent { client_secret })
    }
}

/// Deterministic in-process gateway for tests and local development.
#[derive(Debug, Default, Clone)]
pub struct MockGateway;

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(&self, amount_cents: u64) -> Result<PaymentIntent, GatewayError> {
        Ok(PaymentIntent {
            client_secret: format!("pi_mock_{amount_cents}_secret"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_gateway_is_deterministic() {
        let gateway = MockGateway;
        let a = gateway.create_intent(800).await.unwrap();
        let b = gateway.create_intent(800).await.unwrap();
        assert_eq!(a, b);
        assert!(a.client_secret.contains("800"));
    }
}
