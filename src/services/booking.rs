use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, PaymentStatus};

/// Validated input for a booking write. Status fields are not accepted from
/// callers; new bookings always start pending/pending.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub service: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub amount: Decimal,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub team_member_id: Option<String>,
    pub duration_minutes: Option<i32>,
}

/// Conflict-check then insert, both under the same connection borrow. The
/// partial unique index on active (date, time) converts any write that slips
/// past the check into a constraint violation, reported as the same 409.
pub fn create_booking(conn: &Connection, new: NewBooking) -> Result<Booking, AppError> {
    if let Some(existing) = queries::find_active_booking_at(conn, new.date, new.time)? {
        return Err(AppError::Conflict {
            existing_customer: existing,
        });
    }

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
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
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    match queries::insert_booking(conn, &booking) {
        Ok(()) => Ok(booking),
        Err(e) if is_unique_violation(&e) => {
            let existing = queries::find_active_booking_at(conn, booking.date, booking.time)?
                .unwrap_or_else(|| "another customer".to_string());
            Err(AppError::Conflict {
                existing_customer: existing,
            })
        }
        Err(e) => Err(AppError::Database(e)),
    }
}

pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn new_booking(name: &str, date: &str, time: &str) -> NewBooking {
        NewBooking {
            customer_id: None,
            customer_name: name.to_string(),
            customer_email: None,
            customer_phone: None,
            service: "Facial".to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            amount: Decimal::new(150, 0),
            address: None,
            notes: None,
            team_member_id: None,
            duration_minutes: None,
        }
    }

    #[test]
    fn test_create_booking_starts_pending() {
        let conn = setup_db();
        let booking = create_booking(&conn, new_booking("Alice", "2024-06-01", "10:00")).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert!(!booking.id.is_empty());
    }

    #[test]
    fn test_conflict_names_existing_customer() {
        let conn = setup_db();
        create_booking(&conn, new_booking("Alice", "2024-06-01", "10:00")).unwrap();

        let err = create_booking(&conn, new_booking("Bob", "2024-06-01", "10:00")).unwrap_err();
        match err {
            AppError::Conflict { existing_customer } => assert_eq!(existing_customer, "Alice"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_adjacent_slot_is_free() {
        let conn = setup_db();
        create_booking(&conn, new_booking("Alice", "2024-06-01", "10:00")).unwrap();
        create_booking(&conn, new_booking("Bob", "2024-06-01", "10:30")).unwrap();
    }

    #[test]
    fn test_cancelled_booking_frees_slot() {
        let conn = setup_db();
        let booking = create_booking(&conn, new_booking("Alice", "2024-06-01", "10:00")).unwrap();

        let mut cancelled = booking.clone();
        cancelled.status = BookingStatus::Cancelled;
        queries::update_booking(&conn, &cancelled).unwrap();

        create_booking(&conn, new_booking("Bob", "2024-06-01", "10:00")).unwrap();
    }

    #[test]
    fn test_same_time_different_day_is_free() {
        let conn = setup_db();
        create_booking(&conn, new_booking("Alice", "2024-06-01", "10:00")).unwrap();
        create_booking(&conn, new_booking("Bob", "2024-06-02", "10:00")).unwrap();
    }
}
