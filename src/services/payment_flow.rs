use serde::{Deserialize, Serialize};

/// Explicit lifecycle for a payment attempt. The client-confirmation
/// handshake only ever moves forward: an intent is created, card details are
/// confirmed (processing), and the attempt either succeeds or fails. A
/// failed attempt may be retried without minting a new intent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFlowState {
    Uninitialized,
    IntentCreated,
    Processing,
    Confirmed,
    Failed,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid payment state transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: PaymentFlowState,
    pub to: PaymentFlowState,
}

impl PaymentFlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFlowState::Uninitialized => "uninitialized",
            PaymentFlowState::IntentCreated => "intent_created",
            PaymentFlowState::Processing => "processing",
            PaymentFlowState::Confirmed => "confirmed",
            PaymentFlowState::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "intent_created" => PaymentFlowState::IntentCreated,
            "processing" => PaymentFlowState::Processing,
            "confirmed" => PaymentFlowState::Confirmed,
            "failed" => PaymentFlowState::Failed,
            _ => PaymentFlowState::Uninitialized,
        }
    }

    pub fn transition(self, to: PaymentFlowState) -> Result<PaymentFlowState, InvalidTransition> {
        use PaymentFlowState::*;
        let allowed = matches!(
            (self, to),
            (Uninitialized, IntentCreated)
                | (IntentCreated, Processing)
                | (Processing, Confirmed)
                | (Processing, Failed)
                | (Failed, Processing)
        );
        if allowed {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentFlowState::Confirmed)
    }
}
