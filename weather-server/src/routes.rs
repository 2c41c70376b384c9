//! Route definitions

use axum::{Router, routing::get};

use crate::{handlers, state::AppState};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Dashboard page
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        // JSON API
        .route("/api/weather", get(handlers::get_weather))
        .route("/api/forecast", get(handlers::get_forecast))
        .route("/api/charts", get(handlers::get_charts))
        .route("/api/history", get(handlers::get_history))
        .with_state(state)
}
