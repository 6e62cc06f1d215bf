use serde::{Deserialize, Serialize};

/// Single-row clinic profile. The notification dispatcher prefers
/// `admin_email` here over the environment fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicSettings {
    pub id: String,
    pub clinic_name: String,
    pub admin_email: Option<String>,
    pub site_url: Option<String>,
}

impl ClinicSettings {
    pub fn empty() -> Self {
        Self {
            id: "default".to_string(),
            clinic_name: String::new(),
            admin_email: None,
            site_url: None,
        }
    }
}
