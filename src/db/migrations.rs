use anyhow::Context;
use rusqlite::Connection;

/// Ordered schema migrations, applied once each and recorded in
/// `_migrations`. The partial unique index on bookings is what makes
/// concurrent double-booking impossible by construction: the pre-insert
/// conflict check produces the friendly 409, the index backs it up.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_bookings",
        "CREATE TABLE bookings (
            id TEXT PRIMARY KEY,
            customer_id TEXT,
            customer_name TEXT NOT NULL,
            customer_email TEXT,
            customer_phone TEXT,
            service TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            amount TEXT NOT NULL,
            address TEXT,
            notes TEXT,
            team_member_id TEXT,
            duration_minutes INTEGER,
            status TEXT NOT NULL DEFAULT 'pending',
            payment_status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE UNIQUE INDEX ux_bookings_active_slot
            ON bookings(date, time)
            WHERE status IN ('pending', 'confirmed', 'scheduled');
        CREATE INDEX ix_bookings_date ON bookings(date);",
    ),
    (
        "002_schedule",
        "CREATE TABLE working_hours (
            day_of_week INTEGER PRIMARY KEY CHECK (day_of_week BETWEEN 0 AND 6),
            is_working_day INTEGER NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            buffer_minutes INTEGER NOT NULL,
            max_appointments INTEGER NOT NULL
        );
        CREATE TABLE service_durations (
            service TEXT PRIMARY KEY,
            duration_minutes INTEGER NOT NULL,
            buffer_minutes INTEGER NOT NULL
        );
        CREATE TABLE time_slots (
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            UNIQUE(date, time)
        );",
    ),
    (
        "003_payments",
        "CREATE TABLE payments (
            id TEXT PRIMARY KEY,
            booking_id TEXT,
            customer_id TEXT,
            amount TEXT NOT NULL,
            method TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            payment_date TEXT NOT NULL,
            reference TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE payment_intents (
            intent_id TEXT PRIMARY KEY,
            booking_id TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            client_secret TEXT NOT NULL,
            state TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX ix_payment_intents_booking ON payment_intents(booking_id);",
    ),
    (
        "004_settings",
        "CREATE TABLE settings (
            id TEXT PRIMARY KEY,
            clinic_name TEXT NOT NULL DEFAULT '',
            admin_email TEXT,
            site_url TEXT,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    ),
];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
