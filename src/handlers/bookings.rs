use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::working_hours::parse_time;
use crate::models::{Booking, BookingStatus, PaymentStatus};
use crate::services::booking::{self, NewBooking};
use crate::services::notify;
use crate::state::AppState;

// GET /api/bookings
#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct BookingPageResponse {
    pub bookings: Vec<Booking>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BookingPageResponse>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let date_range = match query.date.as_deref().filter(|d| !d.is_empty()) {
        Some(token) => Some(
            queries::resolve_date_token(token, Utc::now().date_naive())
                .ok_or_else(|| AppError::Validation(vec!["date".to_string()]))?,
        ),
        None => None,
    };

    let filter = queries::BookingFilter {
        status: query.status.filter(|s| !s.is_empty()),
        date_range,
        search: query.search.filter(|s| !s.is_empty()),
    };

    let result = {
        let db = state.db.lock().unwrap();
        queries::list_bookings(&db, &filter, page, limit)?
    };

    let total_pages = (result.total + limit - 1) / limit;
    Ok(Json(BookingPageResponse {
        bookings: result.bookings,
        total: result.total,
        page,
        limit,
        total_pages,
    }))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct BookingRequest {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub amount: Option<Decimal>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub team_member_id: Option<String>,
    pub duration_minutes: Option<i32>,
    // accepted on update only; ignored on create
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

impl BookingRequest {
    /// Required-field check plus date/time parsing. A field that is present
    /// but unparseable counts as missing for the 400 field list.
    fn validate(&self) -> Result<NewBooking, AppError> {
        let mut missing = vec![];

        let customer_name = self
            .customer_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if customer_name.is_none() {
            missing.push("customer_name".to_string());
        }

        let service = self
            .service
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if service.is_none() {
            missing.push("service".to_string());
        }

        let date = self
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        if date.is_none() {
            missing.push("date".to_string());
        }

        let time = self.time.as_deref().and_then(|t| parse_time(t).ok());
        if time.is_none() {
            missing.push("time".to_string());
        }

        if self.amount.is_none() {
            missing.push("amount".to_string());
        }

        if !missing.is_empty() {
            return Err(AppError::Validation(missing));
        }

        Ok(NewBooking {
            customer_id: self.customer_id.clone(),
            customer_name: customer_name.unwrap_or_default().to_string(),
            customer_email: self.customer_email.clone(),
            customer_phone: self.customer_phone.clone(),
            service: service.unwrap_or_default().to_string(),
            date: date.unwrap_or_default(),
            time: time.unwrap_or_default(),
            amount: self.amount.unwrap_or_default(),
            address: self.address.clone(),
            notes: self.notes.clone(),
            team_member_id: self.team_member_id.clone(),
            duration_minutes: self.duration_minutes,
        })
    }
}

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    pub success: bool,
    pub booking: Booking,
    pub message: String,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BookingRequest>,
) -> Result<Json<BookingCreatedResponse>, AppError> {
    let new = body.validate()?;

    let (booking, settings) = {
        let db = state.db.lock().unwrap();
        let booking = booking::create_booking(&db, new)?;
        let settings = queries::get_settings(&db)?;
        (booking, settings)
    };

    // Fire-and-forget: e-mail failures must not affect the response.
    let task_state = Arc::clone(&state);
    let task_booking = booking.clone();
    tokio::spawn(async move {
        notify::dispatch_booking_emails(
            task_state.mailer.as_ref(),
            &task_booking,
            &settings,
            &task_state.config.admin_email,
            &task_state.config.site_url,
        )
        .await;
    });

    Ok(Json(BookingCreatedResponse {
        success: true,
        booking,
        message: "Booking created successfully".to_string(),
    }))
}

// PUT /api/bookings?id=
#[derive(Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
    Json(body): Json<BookingRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation(vec!["id".to_string()]))?;
    let new = body.validate()?;

    let updated = {
        let db = state.db.lock().unwrap();
        let existing = queries::get_booking_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

        let booking = Booking {
            id: existing.id,
            customer_id: new.customer_id,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            service: new.service,
            date: new.date,
            time: new.time,
            amount: new.amount,
            address: new.address,
            notes: new.notes,
            team_member_id: new.team_member_id,
            duration_minutes: new.duration_minutes,
            status: body
                .status
                .as_deref()
                .map(BookingStatus::parse)
                .unwrap_or(existing.status),
            payment_status: body
                .payment_status
                .as_deref()
                .map(PaymentStatus::parse)
                .unwrap_or(existing.payment_status),
            created_at: existing.created_at,
            updated_at: existing.updated_at,
        };

        match queries::update_booking(&db, &booking) {
            Ok(updated) => updated,
            Err(e) if booking::is_unique_violation(&e) => {
                let existing = queries::find_active_booking_at(&db, booking.date, booking.time)?
                    .unwrap_or_else(|| "another customer".to_string());
                return Err(AppError::Conflict {
                    existing_customer: existing,
                });
            }
            Err(e) => return Err(AppError::Database(e)),
        }
    };

    if updated {
        Ok(Json(serde_json::json!({"success": true})))
    } else {
        Err(AppError::NotFound(format!("booking {id}")))
    }
}

// DELETE /api/bookings?id=
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation(vec!["id".to_string()]))?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_booking(&db, &id)?
    };

    if deleted {
        Ok(Json(serde_json::json!({"success": true})))
    } else {
        Err(AppError::NotFound(format!("booking {id}")))
    }
}
