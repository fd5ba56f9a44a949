use crate::handlers::{health_check, preflight, tourapi_handler};
use axum::{Router, routing::get};

/// Creates and configures all application routes
pub fn create_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/tourapi", get(tourapi_handler).options(preflight))
}
