//! Route definitions for the field health API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/fields", field_routes())
        .nest("/cache", cache_routes())
}

/// Field monitoring routes
fn field_routes() -> Router<AppState> {
    Router::new()
        .route("/:field_id/monitor", post(handlers::monitor_field))
        .route("/:field_id/analysis", get(handlers::get_analysis))
        .route("/:field_id/alerts", get(handlers::get_alerts))
        .route("/:field_id/prescription", get(handlers::get_prescription))
}

/// Offline cache maintenance routes
fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::cache_stats))
        .route("/sweep", post(handlers::sweep_cache))
}
