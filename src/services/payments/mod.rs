pub mod stripe;

use std::collections::HashMap;

use async_trait::async_trait;

/// Processor-side view of a payment intent.
#[derive(Debug, Clone)]
pub struct ProviderIntent {
    pub id: String,
    pub client_secret: String,
    pub status: IntentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentStatus {
    RequiresPayment,
    Processing,
    Succeeded,
    Canceled,
}

impl IntentStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "succeeded" => IntentStatus::Succeeded,
            "processing" => IntentStatus::Processing,
            "canceled" => IntentStatus::Canceled,
            _ => IntentStatus::RequiresPayment,
        }
    }
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create an intent for `amount_cents`. The idempotency key keeps a
    /// retried call from minting a second intent processor-side.
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
        idempotency_key: &str,
    ) -> anyhow::Result<ProviderIntent>;

    async fn retrieve_intent(&self, intent_id: &str) -> anyhow::Result<ProviderIntent>;
}
