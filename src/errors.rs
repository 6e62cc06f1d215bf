use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("time slot already booked")]
    Conflict { existing_customer: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("payment error: {0}")]
    Payment(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": self.to_string(), "fields": fields }),
            ),
            AppError::Conflict { existing_customer } => (
                StatusCode::CONFLICT,
                serde_json::json!({
                    "error": "time slot already booked",
                    "conflict": true,
                    "message": format!(
                        "This time slot is already booked by {existing_customer}. Please choose a different time."
                    ),
                }),
            ),
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": self.to_string() }),
            ),
            AppError::Database(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": self.to_string() }),
            ),
            AppError::Payment(_) => (
                StatusCode::PAYMENT_REQUIRED,
                serde_json::json!({ "error": self.to_string() }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": "unauthorized" }),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}
