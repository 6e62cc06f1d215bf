use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub admin_email: String,
    pub site_url: String,
    pub sendgrid_api_key: String,
    pub mail_from: String,
    pub stripe_secret_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "clinicdesk.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_default(),
            site_url: env::var("SITE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            sendgrid_api_key: env::var("SENDGRID_API_KEY").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "bookings@clinic.example".to_string()),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
        }
    }
}
