use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{IntentStatus, PaymentProvider, ProviderIntent};

pub struct StripeProvider {
    secret_key: String,
    client: reqwest::Client,
}

impl StripeProvider {
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct StripeIntentResponse {
    id: String,
    client_secret: Option<String>,
    status: String,
}

impl From<StripeIntentResponse> for ProviderIntent {
    fn from(r: StripeIntentResponse) -> Self {
        ProviderIntent {
            id: r.id,
            client_secret: r.client_secret.unwrap_or_default(),
            status: IntentStatus::parse(&r.status),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
        idempotency_key: &str,
    ) -> anyhow::Result<ProviderIntent> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".to_string(), amount_cents.to_string()),
            ("currency".to_string(), currency.to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let response: StripeIntentResponse = self
            .client
            .post("https://api.stripe.com/v1/payment_intents")
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", idempotency_key)
            .form(&form)
            .send()
            .await
            .context("failed to send Stripe request")?
            .error_for_status()
            .context("Stripe API returned error")?
            .json()
            .await
            .context("failed to parse Stripe intent response")?;

        Ok(response.into())
    }

    async fn retrieve_intent(&self, intent_id: &str) -> anyhow::Result<ProviderIntent> {
        let url = format!("https://api.stripe.com/v1/payment_intents/{intent_id}");

        let response: StripeIntentResponse = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .context("failed to send Stripe request")?
            .error_for_status()
            .context("Stripe API returned error")?
            .json()
            .await
            .context("failed to parse Stripe intent response")?;

        Ok(response.into())
    }
}
