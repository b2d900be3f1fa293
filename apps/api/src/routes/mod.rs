pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::document::handlers as document_handlers;
use crate::extraction::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        // Extraction turns
        .route(
            "/api/v1/sections/generate",
            post(handlers::handle_generate_section),
        )
        // Resume read-models
        .route(
            "/api/v1/sessions/:id/resume",
            get(document_handlers::handle_get_resume),
        )
        .route(
            "/api/v1/sessions/:id/guidance",
            get(document_handlers::handle_get_guidance),
        )
        .route(
            "/api/v1/resumes/validate",
            post(document_handlers::handle_validate_resume),
        )
        .with_state(state)
}
