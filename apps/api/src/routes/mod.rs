pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::profile::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/auth/me", get(handlers::handle_me))
        // Section store
        .route(
            "/api/v1/profile/sections/:kind",
            get(handlers::handle_get_section)
                .put(handlers::handle_save_section)
                .post(handlers::handle_save_section),
        )
        .route("/api/v1/profile/progress", get(handlers::handle_progress))
        .route("/api/v1/profile/complete", post(handlers::handle_complete))
        // Workflow session
        .route("/api/v1/profile/workflow", get(handlers::handle_workflow_view))
        .route(
            "/api/v1/profile/workflow/start",
            post(handlers::handle_workflow_start),
        )
        .route(
            "/api/v1/profile/workflow/next",
            post(handlers::handle_workflow_next),
        )
        .route(
            "/api/v1/profile/workflow/previous",
            post(handlers::handle_workflow_previous),
        )
        .route(
            "/api/v1/profile/workflow/skip",
            post(handlers::handle_workflow_skip),
        )
        .route(
            "/api/v1/profile/workflow/submit",
            post(handlers::handle_workflow_submit),
        )
        .with_state(state)
}
