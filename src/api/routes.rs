use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Graph lifecycle
        .route("/graph/build", post(handlers::build))
        .route("/graph/stats", get(handlers::graph_stats))
        .route("/graph/ready", get(handlers::graph_ready))
        .route("/graph/reset", post(handlers::reset_graph))
        // Personalization
        .route("/ratings", post(handlers::apply_ratings))
        .route("/preferences", post(handlers::apply_preferences))
        // Queries
        .route("/recommendations", post(handlers::recommendations))
        .route("/similar/:movie_id", get(handlers::similar))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        // Outermost so the trace span can pick up the request id
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
