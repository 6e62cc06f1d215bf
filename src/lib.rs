pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// All routes, shared by the binary and the integration tests.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/bookings",
            get(handlers::bookings::list_bookings)
                .post(handlers::bookings::create_booking)
                .put(handlers::bookings::update_booking)
                .delete(handlers::bookings::delete_booking),
        )
        .route(
            "/api/admin/working-hours",
            get(handlers::admin::get_working_hours).put(handlers::admin::put_working_hours),
        )
        .route(
            "/api/admin/service-durations",
            get(handlers::admin::get_service_durations)
                .put(handlers::admin::put_service_durations),
        )
        .route(
            "/api/admin/time-slots",
            post(handlers::admin::generate_time_slots),
        )
        .route(
            "/api/admin/payments",
            get(handlers::admin::list_payments)
                .post(handlers::admin::create_payment)
                .put(handlers::admin::update_payment)
                .delete(handlers::admin::delete_payment),
        )
        .route(
            "/api/admin/settings",
            get(handlers::admin::get_settings).put(handlers::admin::put_settings),
        )
        .route(
            "/api/stripe/create-payment-intent",
            post(handlers::payments::create_payment_intent),
        )
        .route(
            "/api/stripe/confirm-payment",
            post(handlers::payments::confirm_payment),
        )
        .with_state(state)
}
