//! REST interface to the dashboard views

pub mod handlers;
pub mod service;

pub use service::AnalyticsService;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_router(service: Arc<AnalyticsService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        // Explicit lane query
        .route("/api/lanes", get(handlers::query_lanes))
        // Dashboard views
        .route("/api/v1/lanes", get(handlers::get_lanes))
        .route("/api/v1/finance", get(handlers::get_finance))
        .route("/api/v1/kpi", get(handlers::get_kpis))
        // Filter state
        .route("/api/v1/filters", get(handlers::get_filters).put(handlers::put_filters))
        .route("/api/v1/reload", post(handlers::reload))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
