use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    ClinicSettings, Payment, PaymentMethod, PaymentRecordStatus, ServiceDuration, WorkingHour,
};
use crate::services::slots;
use crate::state::AppState;

pub fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// ── Working hours ──

#[derive(Serialize)]
pub struct WorkingHoursResponse {
    pub working_hours: Vec<WorkingHour>,
}

pub async fn get_working_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<WorkingHoursResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let working_hours = {
        let db = state.db.lock().unwrap();
        queries::get_working_hours(&db)?
    };
    Ok(Json(WorkingHoursResponse { working_hours }))
}

#[derive(Deserialize)]
pub struct PutWorkingHoursRequest {
    pub working_hours: Vec<WorkingHour>,
}

pub async fn put_working_hours(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PutWorkingHoursRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    for wh in &body.working_hours {
        wh.validate()
            .map_err(|e| AppError::Validation(vec![e.to_string()]))?;
    }

    {
        let db = state.db.lock().unwrap();
        queries::replace_working_hours(&db, &body.working_hours)?;
    }
    Ok(Json(serde_json::json!({"success": true})))
}

// ── Service durations ──

#[derive(Serialize)]
pub struct ServiceDurationsResponse {
    pub service_durations: Vec<ServiceDuration>,
}

pub async fn get_service_durations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ServiceDurationsResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let service_durations = {
        let db = state.db.lock().unwrap();
        queries::get_service_durations(&db)?
    };
    Ok(Json(ServiceDurationsResponse { service_durations }))
}

#[derive(Deserialize)]
pub struct PutServiceDurationsRequest {
    pub service_durations: Vec<ServiceDuration>,
}

pub async fn put_service_durations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PutServiceDurationsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    for sd in &body.service_durations {
        if sd.service.trim().is_empty() || sd.duration_minutes <= 0 || sd.buffer_minutes < 0 {
            return Err(AppError::Validation(vec![format!(
                "invalid service duration: {}",
                sd.service
            )]));
        }
    }

    {
        let db = state.db.lock().unwrap();
        for sd in &body.service_durations {
            queries::upsert_service_duration(&db, sd)?;
        }
    }
    Ok(Json(serde_json::json!({"success": true})))
}

// ── Time slots ──

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSlotsRequest {
    pub start_date: String,
    pub end_date: String,
    pub service: Option<String>,
}

pub async fn generate_time_slots(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<GenerateSlotsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let start = NaiveDate::parse_from_str(&body.start_date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(vec!["startDate".to_string()]))?;
    let end = NaiveDate::parse_from_str(&body.end_date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(vec!["endDate".to_string()]))?;
    if end < start {
        return Err(AppError::Validation(vec!["endDate".to_string()]));
    }

    let generated = {
        let db = state.db.lock().unwrap();
        let schedule = queries::get_working_hours(&db)?;
        let service = match body.service.as_deref() {
            Some(name) => queries::get_service_duration(&db, name)?,
            None => None,
        };
        let slots = slots::generate_slots(&schedule, service.as_ref(), start, end)?;
        queries::replace_time_slots(&db, start, end, &slots)?
    };

    Ok(Json(serde_json::json!({"success": true, "generated": generated})))
}

// ── Payments ──

#[derive(Deserialize)]
pub struct PaymentsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct PaymentsPageResponse {
    pub payments: Vec<Payment>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PaymentsQuery>,
) -> Result<Json<PaymentsPageResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (payments, total) = {
        let db = state.db.lock().unwrap();
        queries::list_payments(&db, query.status.as_deref().filter(|s| !s.is_empty()), page, limit)?
    };

    Ok(Json(PaymentsPageResponse {
        payments,
        total,
        page,
        limit,
    }))
}

#[derive(Deserialize)]
pub struct PaymentRequest {
    pub booking_id: Option<String>,
    pub customer_id: Option<String>,
    pub amount: Option<Decimal>,
    pub method: Option<String>,
    pub status: Option<String>,
    pub payment_date: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PaymentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let amount = body
        .amount
        .ok_or_else(|| AppError::Validation(vec!["amount".to_string()]))?;
    let payment_date = match body.payment_date.as_deref() {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| AppError::Validation(vec!["payment_date".to_string()]))?,
        None => Utc::now().date_naive(),
    };

    let now = Utc::now().naive_utc();
    let payment = Payment {
        id: Uuid::new_v4().to_string(),
        booking_id: body.booking_id,
        customer_id: body.customer_id,
        amount,
        method: body
            .method
            .as_deref()
            .map(PaymentMethod::parse)
            .unwrap_or(PaymentMethod::Cash),
        status: body
            .status
            .as_deref()
            .map(PaymentRecordStatus::parse)
            .unwrap_or(PaymentRecordStatus::Pending),
        payment_date,
        reference: body.reference,
        notes: body.notes,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::insert_payment(&db, &payment)?;
    }

    Ok(Json(serde_json::json!({"success": true, "payment": payment})))
}

#[derive(Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
    Json(body): Json<PaymentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation(vec!["id".to_string()]))?;

    let updated = {
        let db = state.db.lock().unwrap();
        let mut payment = queries::get_payment_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("payment {id}")))?;

        if let Some(booking_id) = body.booking_id {
            payment.booking_id = Some(booking_id);
        }
        if let Some(customer_id) = body.customer_id {
            payment.customer_id = Some(customer_id);
        }
        if let Some(amount) = body.amount {
            payment.amount = amount;
        }
        if let Some(method) = body.method.as_deref() {
            payment.method = PaymentMethod::parse(method);
        }
        if let Some(status) = body.status.as_deref() {
            payment.status = PaymentRecordStatus::parse(status);
        }
        if let Some(date) = body.payment_date.as_deref() {
            payment.payment_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| AppError::Validation(vec!["payment_date".to_string()]))?;
        }
        if let Some(reference) = body.reference {
            payment.reference = Some(reference);
        }
        if let Some(notes) = body.notes {
            payment.notes = Some(notes);
        }

        queries::update_payment(&db, &payment)?
    };

    if updated {
        Ok(Json(serde_json::json!({"success": true})))
    } else {
        Err(AppError::NotFound(format!("payment {id}")))
    }
}

pub async fn delete_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation(vec!["id".to_string()]))?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_payment(&db, &id)?
    };

    if deleted {
        Ok(Json(serde_json::json!({"success": true})))
    } else {
        Err(AppError::NotFound(format!("payment {id}")))
    }
}

// ── Settings ──

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ClinicSettings>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let settings = {
        let db = state.db.lock().unwrap();
        queries::get_settings(&db)?
    };
    Ok(Json(settings))
}

#[derive(Deserialize)]
pub struct UpdateSettingsRequest {
    pub clinic_name: Option<String>,
    pub admin_email: Option<String>,
    pub site_url: Option<String>,
}

pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    {
        let db = state.db.lock().unwrap();
        let mut settings = queries::get_settings(&db)?;

        if let Some(name) = body.clinic_name {
            settings.clinic_name = name;
        }
        if let Some(email) = body.admin_email {
            settings.admin_email = Some(email);
        }
        if let Some(url) = body.site_url {
            settings.site_url = Some(url);
        }

        queries::save_settings(&db, &settings)?;
    }

    Ok(Json(serde_json::json!({"success": true})))
}
