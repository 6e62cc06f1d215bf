use crate::models::{Booking, ClinicSettings};
use crate::services::mail::{EmailMessage, Mailer};

/// The customer-facing payment link derived from the public site URL.
pub fn payment_link(site_url: &str, booking_id: &str) -> String {
    format!("{}/payment/{}", site_url.trim_end_matches('/'), booking_id)
}

pub fn admin_notification(booking: &Booking, admin_email: &str) -> EmailMessage {
    let text = format!(
        "New booking received.\n\n\
         Customer: {}\n\
         Service: {}\n\
         Date: {} at {}\n\
         Amount: {}\n\
         Phone: {}\n\
         Email: {}\n",
        booking.customer_name,
        booking.service,
        booking.date.format("%Y-%m-%d"),
        booking.time.format("%H:%M"),
        booking.amount,
        booking.customer_phone.as_deref().unwrap_or("-"),
        booking.customer_email.as_deref().unwrap_or("-"),
    );
    let html = format!(
        "<h2>New booking</h2>\
         <p><strong>{}</strong> booked <strong>{}</strong> on {} at {} ({}).</p>",
        booking.customer_name,
        booking.service,
        booking.date.format("%Y-%m-%d"),
        booking.time.format("%H:%M"),
        booking.amount,
    );

    EmailMessage {
        to: admin_email.to_string(),
        subject: format!("New booking: {} on {}", booking.service, booking.date),
        text,
        html,
    }
}

pub fn customer_confirmation(
    booking: &Booking,
    customer_email: &str,
    site_url: &str,
) -> EmailMessage {
    let link = payment_link(site_url, &booking.id);
    let text = format!(
        "Hi {},\n\n\
         Your booking for {} on {} at {} has been received.\n\
         Amount due: {}\n\n\
         Complete your payment here: {}\n",
        booking.customer_name,
        booking.service,
        booking.date.format("%Y-%m-%d"),
        booking.time.format("%H:%M"),
        booking.amount,
        link,
    );
    let html = format!(
        "<p>Hi {},</p>\
         <p>Your booking for <strong>{}</strong> on {} at {} has been received.</p>\
         <p><a href=\"{}\">Pay {} now</a></p>",
        booking.customer_name,
        booking.service,
        booking.date.format("%Y-%m-%d"),
        booking.time.format("%H:%M"),
        link,
        booking.amount,
    );

    EmailMessage {
        to: customer_email.to_string(),
        subject: "Your booking is confirmed - payment required".to_string(),
        text,
        html,
    }
}

/// Best-effort dispatch after a booking write: the admin summary always, the
/// customer confirmation when an address was supplied. Each send is wrapped
/// independently; failures are logged and never propagate. Stored settings
/// take precedence over the environment fallbacks for both the admin address
/// and the payment link base.
pub async fn dispatch_booking_emails(
    mailer: &dyn Mailer,
    booking: &Booking,
    settings: &ClinicSettings,
    fallback_admin_email: &str,
    fallback_site_url: &str,
) {
    let admin_email = settings
        .admin_email
        .as_deref()
        .filter(|e| !e.is_empty())
        .unwrap_or(fallback_admin_email);
    let site_url = settings
        .site_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .unwrap_or(fallback_site_url);

    if admin_email.is_empty() {
        tracing::warn!(booking_id = %booking.id, "no admin email configured, skipping notification");
    } else if let Err(e) = mailer.send(&admin_notification(booking, admin_email)).await {
        tracing::warn!(booking_id = %booking.id, error = %e, "failed to send admin notification");
    }

    if let Some(customer_email) = booking.customer_email.as_deref().filter(|e| !e.is_empty()) {
        let message = customer_confirmation(booking, customer_email, site_url);
        if let Err(e) = mailer.send(&message).await {
            tracing::warn!(booking_id = %booking.id, error = %e, "failed to send customer confirmation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, PaymentStatus};
    use chrono::{NaiveDate, NaiveTime, Utc};
    use rust_decimal::Decimal;

    fn sample_booking() -> Booking {
        Booking {
            id: "bk-1".to_string(),
            customer_id: None,
            customer_name: "Alice".to_string(),
            customer_email: Some("alice@example.com".to_string()),
            customer_phone: None,
            service: "Facial".to_string(),
            date: NaiveDate::parse_from_str("2024-06-01", "%Y-%m-%d").unwrap(),
            time: NaiveTime::parse_from_str("10:00", "%H:%M").unwrap(),
            amount: Decimal::new(150, 0),
            address: None,
            notes: None,
            team_member_id: None,
            duration_minutes: None,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_payment_link_strips_trailing_slash() {
        assert_eq!(
            payment_link("https://clinic.test/", "bk-1"),
            "https://clinic.test/payment/bk-1"
        );
        assert_eq!(
            payment_link("https://clinic.test", "bk-1"),
            "https://clinic.test/payment/bk-1"
        );
    }

    #[test]
    fn test_admin_notification_summarizes_booking() {
        let message = admin_notification(&sample_booking(), "admin@clinic.test");
        assert_eq!(message.to, "admin@clinic.test");
        assert!(message.subject.contains("Facial"));
        assert!(message.text.contains("Alice"));
        assert!(message.text.contains("2024-06-01"));
        assert!(message.text.contains("10:00"));
        assert!(message.text.contains("150"));
    }

    #[test]
    fn test_customer_confirmation_contains_payment_link() {
        let message =
            customer_confirmation(&sample_booking(), "alice@example.com", "https://clinic.test");
        assert_eq!(message.to, "alice@example.com");
        assert!(message.text.contains("https://clinic.test/payment/bk-1"));
        assert!(message.html.contains("https://clinic.test/payment/bk-1"));
    }
}
