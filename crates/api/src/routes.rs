//! Route definitions.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the API router over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/strategies", post(handlers::create_strategy))
        .route("/strategies/{id}", get(handlers::get_strategy))
        .route("/strategies/{id}/pause", post(handlers::pause_strategy))
        .route("/strategies/{id}/resume", post(handlers::resume_strategy))
        .route("/strategies/{id}/execute", post(handlers::execute_strategy))
        .route("/strategies/{id}/ledger", get(handlers::list_ledger))
        .route(
            "/strategies/{id}/reconciliation",
            get(handlers::reconcile_strategy),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
