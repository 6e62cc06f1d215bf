use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Payment, PaymentMethod, PaymentRecordStatus, PaymentStatus};
use crate::services::payment_flow::PaymentFlowState;
use crate::services::payments::IntentStatus;
use crate::state::AppState;

// POST /api/stripe/create-payment-intent
#[derive(Deserialize)]
pub struct CreateIntentRequest {
    pub amount: Option<Decimal>,
    pub booking_id: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: String,
}

pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, AppError> {
    let amount = body
        .amount
        .ok_or_else(|| AppError::Validation(vec!["amount".to_string()]))?;
    let booking_id = body
        .booking_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation(vec!["booking_id".to_string()]))?;

    let amount_cents = (amount * Decimal::new(100, 0))
        .round()
        .to_i64()
        .filter(|cents| *cents > 0)
        .ok_or_else(|| AppError::Validation(vec!["amount".to_string()]))?;

    // Reuse any live intent for this booking: a reload of the payment page
    // must not mint a duplicate.
    let (booking, existing) = {
        let db = state.db.lock().unwrap();
        let booking = queries::get_booking_by_id(&db, &booking_id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;
        let existing = queries::find_live_intent_for_booking(&db, &booking_id)?;
        (booking, existing)
    };

    if let Some(intent) = existing {
        return Ok(Json(CreateIntentResponse {
            client_secret: intent.client_secret,
        }));
    }

    let mut metadata = body.metadata.unwrap_or_default();
    metadata.insert("booking_id".to_string(), booking.id.clone());
    metadata.insert("service".to_string(), booking.service.clone());
    metadata.insert("date".to_string(), booking.date.format("%Y-%m-%d").to_string());
    metadata.insert("time".to_string(), booking.time.format("%H:%M").to_string());
    if let Some(team_member_id) = &booking.team_member_id {
        metadata.insert("team_member_id".to_string(), team_member_id.clone());
    }

    let idempotency_key = format!("booking-{}", booking.id);
    let intent = state
        .payments
        .create_intent(amount_cents, "usd", &metadata, &idempotency_key)
        .await
        .map_err(|e| AppError::Payment(e.to_string()))?;

    let stored_state = PaymentFlowState::Uninitialized
        .transition(PaymentFlowState::IntentCreated)
        .map_err(|e| AppError::Payment(e.to_string()))?;

    {
        let db = state.db.lock().unwrap();
        queries::insert_payment_intent(
            &db,
            &queries::StoredIntent {
                intent_id: intent.id.clone(),
                booking_id: booking.id.clone(),
                amount_cents,
                client_secret: intent.client_secret.clone(),
                state: stored_state.as_str().to_string(),
            },
        )?;
    }

    Ok(Json(CreateIntentResponse {
        client_secret: intent.client_secret,
    }))
}

// POST /api/stripe/confirm-payment
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentResponse {
    pub success: bool,
    pub booking_id: String,
}

pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfirmPaymentRequest>,
) -> Result<Json<ConfirmPaymentResponse>, AppError> {
    let intent_id = body
        .payment_intent_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation(vec!["paymentIntentId".to_string()]))?;

    let stored = {
        let db = state.db.lock().unwrap();
        queries::get_payment_intent(&db, &intent_id)?
            .ok_or_else(|| AppError::NotFound(format!("payment intent {intent_id}")))?
    };

    // A repeated confirm for an already-settled intent is a no-op success.
    if PaymentFlowState::parse(&stored.state) == PaymentFlowState::Confirmed {
        return Ok(Json(ConfirmPaymentResponse {
            success: true,
            booking_id: stored.booking_id,
        }));
    }

    // The booking is only mutated on the processor's word, never on the
    // client's say-so.
    let provider_intent = state
        .payments
        .retrieve_intent(&intent_id)
        .await
        .map_err(|e| AppError::Payment(e.to_string()))?;

    let flow = PaymentFlowState::parse(&stored.state)
        .transition(PaymentFlowState::Processing)
        .map_err(|e| AppError::Payment(e.to_string()))?;

    if provider_intent.status != IntentStatus::Succeeded {
        let failed = flow
            .transition(PaymentFlowState::Failed)
            .map_err(|e| AppError::Payment(e.to_string()))?;
        let db = state.db.lock().unwrap();
        queries::set_payment_intent_state(&db, &intent_id, failed.as_str())?;
        return Err(AppError::Payment(
            "payment has not succeeded; booking left unchanged".to_string(),
        ));
    }

    let confirmed = flow
        .transition(PaymentFlowState::Confirmed)
        .map_err(|e| AppError::Payment(e.to_string()))?;

    {
        let db = state.db.lock().unwrap();
        queries::set_payment_intent_state(&db, &intent_id, confirmed.as_str())?;
        queries::set_booking_payment_status(&db, &stored.booking_id, PaymentStatus::Paid)?;

        let now = Utc::now().naive_utc();
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            booking_id: Some(stored.booking_id.clone()),
            customer_id: None,
            amount: Decimal::new(stored.amount_cents, 2),
            method: PaymentMethod::Card,
            status: PaymentRecordStatus::Paid,
            payment_date: Utc::now().date_naive(),
            reference: Some(intent_id.clone()),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        queries::insert_payment(&db, &payment)?;
    }

    tracing::info!(booking_id = %stored.booking_id, intent_id = %intent_id, "payment confirmed");

    Ok(Json(ConfirmPaymentResponse {
        success: true,
        booking_id: stored.booking_id,
    }))
}
