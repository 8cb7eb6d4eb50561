pub mod health;

use axum::{routing::get, Router};

use crate::events::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Events API
        .route("/api/v1/events", get(handlers::handle_list_events))
        .route("/api/v1/events/hot", get(handlers::handle_hot_events))
        .route("/api/v1/events/:id", get(handlers::handle_event_detail))
        .route(
            "/api/v1/events/:id/timeline",
            get(handlers::handle_event_timeline),
        )
        .route(
            "/api/v1/events/:id/trends",
            get(handlers::handle_event_trends),
        )
        .route(
            "/api/v1/events/:id/timeseries",
            get(handlers::handle_event_time_series),
        )
        .route(
            "/api/v1/events/:id/propagation",
            get(handlers::handle_propagation_path),
        )
        .route(
            "/api/v1/events/:id/influence-users",
            get(handlers::handle_influence_users),
        )
        .route(
            "/api/v1/events/:id/geographic",
            get(handlers::handle_geographic_distribution),
        )
        .route(
            "/api/v1/events/:id/success-factors",
            get(handlers::handle_success_factors),
        )
        // Cross-event analytics
        .route("/api/v1/analytics/trends", get(handlers::handle_trend_data))
        .route(
            "/api/v1/analytics/categories",
            get(handlers::handle_category_stats),
        )
        .with_state(state)
}
