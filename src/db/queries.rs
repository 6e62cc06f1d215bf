use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::models::{
    Booking, BookingStatus, ClinicSettings, Payment, PaymentMethod, PaymentRecordStatus,
    PaymentStatus, ServiceDuration, WorkingHour,
};

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

fn now_ts() -> String {
    Utc::now().naive_utc().format(TS_FMT).to_string()
}

// ── Bookings ──

/// Filters for the paginated booking listing.
#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub status: Option<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub search: Option<String>,
}

/// Resolve a listing date token against a reference day. Weeks start on
/// Monday. Returns an inclusive range, or None for an unrecognized token.
pub fn resolve_date_token(token: &str, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match token {
        "today" => Some((today, today)),
        "tomorrow" => {
            let d = today + Duration::days(1);
            Some((d, d))
        }
        "this_week" => {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            Some((monday, monday + Duration::days(6)))
        }
        "next_week" => {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64)
                + Duration::days(7);
            Some((monday, monday + Duration::days(6)))
        }
        "this_month" => {
            let first = today.with_day(1)?;
            Some((first, last_day_of_month(first)))
        }
        "next_month" => {
            let first = today.with_day(1)? + chrono::Months::new(1);
            Some((first, last_day_of_month(first)))
        }
        other => {
            let d = NaiveDate::parse_from_str(other, DATE_FMT).ok()?;
            Some((d, d))
        }
    }
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    (first + chrono::Months::new(1)) - Duration::days(1)
}

pub struct BookingPage {
    pub bookings: Vec<Booking>,
    pub total: i64,
}

pub fn list_bookings(
    conn: &Connection,
    filter: &BookingFilter,
    page: i64,
    limit: i64,
) -> anyhow::Result<BookingPage> {
    let mut clauses: Vec<String> = vec![];
    let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(status) = &filter.status {
        args.push(Box::new(status.clone()));
        clauses.push(format!("status = ?{}", args.len()));
    }
    if let Some((start, end)) = filter.date_range {
        args.push(Box::new(start.format(DATE_FMT).to_string()));
        clauses.push(format!("date >= ?{}", args.len()));
        args.push(Box::new(end.format(DATE_FMT).to_string()));
        clauses.push(format!("date <= ?{}", args.len()));
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        args.push(Box::new(pattern));
        let n = args.len();
        clauses.push(format!(
            "(customer_name LIKE ?{n} OR customer_email LIKE ?{n} \
             OR customer_phone LIKE ?{n} OR service LIKE ?{n})"
        ));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let arg_refs: Vec<&dyn rusqlite::types::ToSql> = args.iter().map(|a| a.as_ref()).collect();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM bookings{where_sql}"),
        arg_refs.as_slice(),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings{where_sql} \
         ORDER BY date ASC, time ASC, id ASC LIMIT ?{} OFFSET ?{}",
        args.len() + 1,
        args.len() + 2,
    );
    let offset = (page - 1).max(0) * limit;
    let mut all_args = arg_refs;
    all_args.push(&limit);
    all_args.push(&offset);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(all_args.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(BookingPage { bookings, total })
}

const BOOKING_COLUMNS: &str = "id, customer_id, customer_name, customer_email, customer_phone, \
     service, date, time, amount, address, notes, team_member_id, duration_minutes, \
     status, payment_status, created_at, updated_at";

/// Returns the customer name holding an active booking at the slot, if any.
pub fn find_active_booking_at(
    conn: &Connection,
    date: NaiveDate,
    time: NaiveTime,
) -> anyhow::Result<Option<String>> {
    let result = conn.query_row(
        "SELECT customer_name FROM bookings
         WHERE date = ?1 AND time = ?2 AND status IN ('pending', 'confirmed', 'scheduled')",
        params![
            date.format(DATE_FMT).to_string(),
            time.format(TIME_FMT).to_string()
        ],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(name) => Ok(Some(name)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_booking(conn: &Connection, booking: &Booking) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO bookings (id, customer_id, customer_name, customer_email, customer_phone,
            service, date, time, amount, address, notes, team_member_id, duration_minutes,
            status, payment_status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            booking.id,
            booking.customer_id,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            booking.service,
            booking.date.format(DATE_FMT).to_string(),
            booking.time.format(TIME_FMT).to_string(),
            booking.amount.to_string(),
            booking.address,
            booking.notes,
            booking.team_member_id,
            booking.duration_minutes,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.created_at.format(TS_FMT).to_string(),
            booking.updated_at.format(TS_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_booking(conn: &Connection, booking: &Booking) -> Result<bool, rusqlite::Error> {
    let count = conn.execute(
        "UPDATE bookings SET customer_id = ?1, customer_name = ?2, customer_email = ?3,
            customer_phone = ?4, service = ?5, date = ?6, time = ?7, amount = ?8,
            address = ?9, notes = ?10, team_member_id = ?11, duration_minutes = ?12,
            status = ?13, payment_status = ?14, updated_at = ?15
         WHERE id = ?16",
        params![
            booking.customer_id,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            booking.service,
            booking.date.format(DATE_FMT).to_string(),
            booking.time.format(TIME_FMT).to_string(),
            booking.amount.to_string(),
            booking.address,
            booking.notes,
            booking.team_member_id,
            booking.duration_minutes,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            now_ts(),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn set_booking_payment_status(
    conn: &Connection,
    id: &str,
    payment_status: PaymentStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET payment_status = ?1, updated_at = ?2 WHERE id = ?3",
        params![payment_status.as_str(), now_ts(), id],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date_str: String = row.get(6)?;
    let time_str: String = row.get(7)?;
    let amount_str: String = row.get(8)?;
    let status_str: String = row.get(13)?;
    let payment_status_str: String = row.get(14)?;
    let created_at_str: String = row.get(15)?;
    let updated_at_str: String = row.get(16)?;

    Ok(Booking {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        customer_name: row.get(2)?,
        customer_email: row.get(3)?,
        customer_phone: row.get(4)?,
        service: row.get(5)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FMT)
            .map_err(|_| anyhow::anyhow!("bad date in bookings row: {date_str}"))?,
        time: crate::models::working_hours::parse_time(&time_str)?,
        amount: Decimal::from_str(&amount_str)
            .map_err(|_| anyhow::anyhow!("bad amount in bookings row: {amount_str}"))?,
        address: row.get(9)?,
        notes: row.get(10)?,
        team_member_id: row.get(11)?,
        duration_minutes: row.get(12)?,
        status: BookingStatus::parse(&status_str),
        payment_status: PaymentStatus::parse(&payment_status_str),
        created_at: NaiveDateTime::parse_from_str(&created_at_str, TS_FMT)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
        updated_at: NaiveDateTime::parse_from_str(&updated_at_str, TS_FMT)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
    })
}

// ── Working hours ──

/// All seven weekday records, synthesizing the hard-coded default for any
/// weekday without a stored row.
pub fn get_working_hours(conn: &Connection) -> anyhow::Result<Vec<WorkingHour>> {
    let mut stmt = conn.prepare(
        "SELECT day_of_week, is_working_day, start_time, end_time, buffer_minutes, max_appointments
         FROM working_hours",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(WorkingHour {
            day_of_week: row.get::<_, i64>(0)? as u8,
            is_working_day: row.get::<_, i64>(1)? != 0,
            start_time: row.get(2)?,
            end_time: row.get(3)?,
            buffer_minutes: row.get::<_, i64>(4)? as i32,
            max_appointments: row.get::<_, i64>(5)? as i32,
        })
    })?;

    let mut stored: Vec<WorkingHour> = vec![];
    for row in rows {
        stored.push(row?);
    }

    let mut out = Vec::with_capacity(7);
    for day in 0u8..7 {
        match stored.iter().find(|wh| wh.day_of_week == day) {
            Some(wh) => out.push(wh.clone()),
            None => out.push(WorkingHour::default_for_day(day)),
        }
    }
    Ok(out)
}

/// Wholesale replace: weekdays omitted from `hours` fall back to defaults on
/// the next read.
pub fn replace_working_hours(conn: &Connection, hours: &[WorkingHour]) -> anyhow::Result<()> {
    conn.execute("DELETE FROM working_hours", [])?;
    for wh in hours {
        conn.execute(
            "INSERT INTO working_hours (day_of_week, is_working_day, start_time, end_time, buffer_minutes, max_appointments)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                wh.day_of_week as i64,
                wh.is_working_day as i64,
                wh.start_time,
                wh.end_time,
                wh.buffer_minutes,
                wh.max_appointments,
            ],
        )?;
    }
    Ok(())
}

// ── Service durations ──

pub fn get_service_durations(conn: &Connection) -> anyhow::Result<Vec<ServiceDuration>> {
    let mut stmt = conn.prepare(
        "SELECT service, duration_minutes, buffer_minutes FROM service_durations ORDER BY service",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ServiceDuration {
            service: row.get(0)?,
            duration_minutes: row.get(1)?,
            buffer_minutes: row.get(2)?,
        })
    })?;

    let mut durations = vec![];
    for row in rows {
        durations.push(row?);
    }
    Ok(durations)
}

pub fn get_service_duration(
    conn: &Connection,
    service: &str,
) -> anyhow::Result<Option<ServiceDuration>> {
    let result = conn.query_row(
        "SELECT service, duration_minutes, buffer_minutes FROM service_durations WHERE service = ?1",
        params![service],
        |row| {
            Ok(ServiceDuration {
                service: row.get(0)?,
                duration_minutes: row.get(1)?,
                buffer_minutes: row.get(2)?,
            })
        },
    );

    match result {
        Ok(sd) => Ok(Some(sd)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn upsert_service_duration(conn: &Connection, sd: &ServiceDuration) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO service_durations (service, duration_minutes, buffer_minutes)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(service) DO UPDATE SET
           duration_minutes = excluded.duration_minutes,
           buffer_minutes = excluded.buffer_minutes",
        params![sd.service, sd.duration_minutes, sd.buffer_minutes],
    )?;
    Ok(())
}

// ── Time slots ──

pub fn replace_time_slots(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
    slots: &[(NaiveDate, NaiveTime)],
) -> anyhow::Result<usize> {
    conn.execute(
        "DELETE FROM time_slots WHERE date >= ?1 AND date <= ?2",
        params![
            start.format(DATE_FMT).to_string(),
            end.format(DATE_FMT).to_string()
        ],
    )?;

    for (date, time) in slots {
        conn.execute(
            "INSERT OR IGNORE INTO time_slots (date, time) VALUES (?1, ?2)",
            params![
                date.format(DATE_FMT).to_string(),
                time.format(TIME_FMT).to_string()
            ],
        )?;
    }
    Ok(slots.len())
}

pub fn get_time_slots_for_date(
    conn: &Connection,
    date: NaiveDate,
) -> anyhow::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT time FROM time_slots WHERE date = ?1 ORDER BY time ASC")?;
    let rows = stmt.query_map(params![date.format(DATE_FMT).to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    let mut times = vec![];
    for row in rows {
        times.push(row?);
    }
    Ok(times)
}

// ── Payments ──

pub fn insert_payment(conn: &Connection, payment: &Payment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO payments (id, booking_id, customer_id, amount, method, status,
            payment_date, reference, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            payment.id,
            payment.booking_id,
            payment.customer_id,
            payment.amount.to_string(),
            payment.method.as_str(),
            payment.status.as_str(),
            payment.payment_date.format(DATE_FMT).to_string(),
            payment.reference,
            payment.notes,
            payment.created_at.format(TS_FMT).to_string(),
            payment.updated_at.format(TS_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn list_payments(
    conn: &Connection,
    status: Option<&str>,
    page: i64,
    limit: i64,
) -> anyhow::Result<(Vec<Payment>, i64)> {
    let offset = (page - 1).max(0) * limit;

    let (total, mut stmt, has_status) = match status {
        Some(_) => (
            conn.query_row(
                "SELECT COUNT(*) FROM payments WHERE status = ?1",
                params![status],
                |row| row.get(0),
            )?,
            conn.prepare(
                "SELECT id, booking_id, customer_id, amount, method, status, payment_date, reference, notes, created_at, updated_at
                 FROM payments WHERE status = ?1 ORDER BY payment_date DESC, id ASC LIMIT ?2 OFFSET ?3",
            )?,
            true,
        ),
        None => (
            conn.query_row("SELECT COUNT(*) FROM payments", [], |row| row.get(0))?,
            conn.prepare(
                "SELECT id, booking_id, customer_id, amount, method, status, payment_date, reference, notes, created_at, updated_at
                 FROM payments ORDER BY payment_date DESC, id ASC LIMIT ?1 OFFSET ?2",
            )?,
            false,
        ),
    };

    let mut payments = vec![];
    if has_status {
        let rows = stmt.query_map(params![status, limit, offset], |row| {
            Ok(parse_payment_row(row))
        })?;
        for row in rows {
            payments.push(row??);
        }
    } else {
        let rows = stmt.query_map(params![limit, offset], |row| Ok(parse_payment_row(row)))?;
        for row in rows {
            payments.push(row??);
        }
    }
    Ok((payments, total))
}

pub fn get_payment_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Payment>> {
    let result = conn.query_row(
        "SELECT id, booking_id, customer_id, amount, method, status, payment_date, reference, notes, created_at, updated_at
         FROM payments WHERE id = ?1",
        params![id],
        |row| Ok(parse_payment_row(row)),
    );

    match result {
        Ok(payment) => Ok(Some(payment?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_payment(conn: &Connection, payment: &Payment) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE payments SET booking_id = ?1, customer_id = ?2, amount = ?3, method = ?4,
            status = ?5, payment_date = ?6, reference = ?7, notes = ?8, updated_at = ?9
         WHERE id = ?10",
        params![
            payment.booking_id,
            payment.customer_id,
            payment.amount.to_string(),
            payment.method.as_str(),
            payment.status.as_str(),
            payment.payment_date.format(DATE_FMT).to_string(),
            payment.reference,
            payment.notes,
            now_ts(),
            payment.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_payment(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM payments WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_payment_row(row: &rusqlite::Row) -> anyhow::Result<Payment> {
    let amount_str: String = row.get(3)?;
    let method_str: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    let payment_date_str: String = row.get(6)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    Ok(Payment {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        customer_id: row.get(2)?,
        amount: Decimal::from_str(&amount_str)
            .map_err(|_| anyhow::anyhow!("bad amount in payments row: {amount_str}"))?,
        method: PaymentMethod::parse(&method_str),
        status: PaymentRecordStatus::parse(&status_str),
        payment_date: NaiveDate::parse_from_str(&payment_date_str, DATE_FMT)
            .map_err(|_| anyhow::anyhow!("bad payment_date in payments row: {payment_date_str}"))?,
        reference: row.get(7)?,
        notes: row.get(8)?,
        created_at: NaiveDateTime::parse_from_str(&created_at_str, TS_FMT)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
        updated_at: NaiveDateTime::parse_from_str(&updated_at_str, TS_FMT)
            .unwrap_or_else(|_| Utc::now().naive_utc()),
    })
}

// ── Payment intents ──

pub struct StoredIntent {
    pub intent_id: String,
    pub booking_id: String,
    pub amount_cents: i64,
    pub client_secret: String,
    pub state: String,
}

/// Two racing create calls share an idempotency key and therefore an intent
/// id; the loser's insert is a no-op rather than a constraint error.
pub fn insert_payment_intent(conn: &Connection, intent: &StoredIntent) -> anyhow::Result<()> {
    let now = now_ts();
    conn.execute(
        "INSERT INTO payment_intents (intent_id, booking_id, amount_cents, client_secret, state, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
         ON CONFLICT(intent_id) DO NOTHING",
        params![
            intent.intent_id,
            intent.booking_id,
            intent.amount_cents,
            intent.client_secret,
            intent.state,
            now,
        ],
    )?;
    Ok(())
}

/// The most recent non-failed intent for a booking, used to keep intent
/// creation idempotent across page reloads.
pub fn find_live_intent_for_booking(
    conn: &Connection,
    booking_id: &str,
) -> anyhow::Result<Option<StoredIntent>> {
    let result = conn.query_row(
        "SELECT intent_id, booking_id, amount_cents, client_secret, state
         FROM payment_intents WHERE booking_id = ?1 AND state != 'failed'
         ORDER BY created_at DESC LIMIT 1",
        params![booking_id],
        |row| {
            Ok(StoredIntent {
                intent_id: row.get(0)?,
                booking_id: row.get(1)?,
                amount_cents: row.get(2)?,
                client_secret: row.get(3)?,
                state: row.get(4)?,
            })
        },
    );

    match result {
        Ok(intent) => Ok(Some(intent)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_payment_intent(
    conn: &Connection,
    intent_id: &str,
) -> anyhow::Result<Option<StoredIntent>> {
    let result = conn.query_row(
        "SELECT intent_id, booking_id, amount_cents, client_secret, state
         FROM payment_intents WHERE intent_id = ?1",
        params![intent_id],
        |row| {
            Ok(StoredIntent {
                intent_id: row.get(0)?,
                booking_id: row.get(1)?,
                amount_cents: row.get(2)?,
                client_secret: row.get(3)?,
                state: row.get(4)?,
            })
        },
    );

    match result {
        Ok(intent) => Ok(Some(intent)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_payment_intent_state(
    conn: &Connection,
    intent_id: &str,
    state: &str,
) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE payment_intents SET state = ?1, updated_at = ?2 WHERE intent_id = ?3",
        params![state, now_ts(), intent_id],
    )?;
    Ok(())
}

// ── Settings ──

pub fn get_settings(conn: &Connection) -> anyhow::Result<ClinicSettings> {
    let result = conn.query_row(
        "SELECT id, clinic_name, admin_email, site_url FROM settings WHERE id = 'default'",
        [],
        |row| {
            Ok(ClinicSettings {
                id: row.get(0)?,
                clinic_name: row.get(1)?,
                admin_email: row.get(2)?,
                site_url: row.get(3)?,
            })
        },
    );

    match result {
        Ok(settings) => Ok(settings),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(ClinicSettings::empty()),
        Err(e) => Err(e.into()),
    }
}

pub fn save_settings(conn: &Connection, settings: &ClinicSettings) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings (id, clinic_name, admin_email, site_url, updated_at)
         VALUES ('default', ?1, ?2, ?3, datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
           clinic_name = excluded.clinic_name,
           admin_email = excluded.admin_email,
           site_url = excluded.site_url,
           updated_at = excluded.updated_at",
        params![settings.clinic_name, settings.admin_email, settings.site_url],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_resolve_today_and_tomorrow() {
        let today = d("2024-06-05");
        assert_eq!(resolve_date_token("today", today), Some((today, today)));
        assert_eq!(
            resolve_date_token("tomorrow", today),
            Some((d("2024-06-06"), d("2024-06-06")))
        );
    }

    #[test]
    fn test_resolve_weeks() {
        // 2024-06-05 is a Wednesday; the week runs Mon 3rd to Sun 9th.
        let today = d("2024-06-05");
        assert_eq!(
            resolve_date_token("this_week", today),
            Some((d("2024-06-03"), d("2024-06-09")))
        );
        assert_eq!(
            resolve_date_token("next_week", today),
            Some((d("2024-06-10"), d("2024-06-16")))
        );
    }

    #[test]
    fn test_resolve_months() {
        let today = d("2024-06-05");
        assert_eq!(
            resolve_date_token("this_month", today),
            Some((d("2024-06-01"), d("2024-06-30")))
        );
        assert_eq!(
            resolve_date_token("next_month", today),
            Some((d("2024-07-01"), d("2024-07-31")))
        );
    }

    #[test]
    fn test_resolve_month_across_year_end() {
        let today = d("2024-12-15");
        assert_eq!(
            resolve_date_token("next_month", today),
            Some((d("2025-01-01"), d("2025-01-31")))
        );
    }

    #[test]
    fn test_resolve_explicit_date() {
        let today = d("2024-06-05");
        assert_eq!(
            resolve_date_token("2024-09-01", today),
            Some((d("2024-09-01"), d("2024-09-01")))
        );
        assert_eq!(resolve_date_token("not-a-date", today), None);
    }

    #[test]
    fn test_working_hours_synthesize_defaults() {
        let conn = crate::db::init_db(":memory:").unwrap();
        let hours = get_working_hours(&conn).unwrap();
        assert_eq!(hours.len(), 7);
        assert!(!hours[0].is_working_day); // Sunday
        assert_eq!(hours[6].start_time, "10:00"); // Saturday
    }

    #[test]
    fn test_working_hours_replace_and_revert() {
        let conn = crate::db::init_db(":memory:").unwrap();

        let mut monday = WorkingHour::default_for_day(1);
        monday.start_time = "08:00".to_string();
        replace_working_hours(&conn, &[monday.clone()]).unwrap();

        let hours = get_working_hours(&conn).unwrap();
        assert_eq!(hours[1].start_time, "08:00");
        // Tuesday was omitted from the PUT, so it reads back as the default.
        assert_eq!(hours[2], WorkingHour::default_for_day(2));
    }

    #[test]
    fn test_repeated_intent_insert_is_a_noop() {
        let conn = crate::db::init_db(":memory:").unwrap();

        let intent = StoredIntent {
            intent_id: "pi_1".to_string(),
            booking_id: "bk-1".to_string(),
            amount_cents: 15000,
            client_secret: "pi_1_secret".to_string(),
            state: "intent_created".to_string(),
        };
        insert_payment_intent(&conn, &intent).unwrap();

        // A racing second insert of the same provider intent must not error
        // and must leave the stored row intact.
        let duplicate = StoredIntent {
            intent_id: "pi_1".to_string(),
            booking_id: "bk-1".to_string(),
            amount_cents: 15000,
            client_secret: "pi_1_secret".to_string(),
            state: "confirmed".to_string(),
        };
        insert_payment_intent(&conn, &duplicate).unwrap();

        let stored = get_payment_intent(&conn, "pi_1").unwrap().unwrap();
        assert_eq!(stored.state, "intent_created");
        assert_eq!(stored.client_secret, "pi_1_secret");
    }

    #[test]
    fn test_settings_round_trip_and_default() {
        let conn = crate::db::init_db(":memory:").unwrap();
        assert_eq!(get_settings(&conn).unwrap().clinic_name, "");

        let settings = ClinicSettings {
            id: "default".to_string(),
            clinic_name: "Derma Clinic".to_string(),
            admin_email: Some("admin@clinic.test".to_string()),
            site_url: Some("https://clinic.test".to_string()),
        };
        save_settings(&conn, &settings).unwrap();

        let loaded = get_settings(&conn).unwrap();
        assert_eq!(loaded.clinic_name, "Derma Clinic");
        assert_eq!(loaded.admin_email.as_deref(), Some("admin@clinic.test"));
    }
}
