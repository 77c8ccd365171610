use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::get_status))
        // Session control
        .route("/session", put(handlers::reconfigure_session))
        .route("/session/reconnect", post(handlers::reconnect_session))
        // Talk control
        .route("/talk/unlatch", post(handlers::unlatch))
        .route("/buttons/:button/:edge", post(handlers::press_button))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
