//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Forms
        .route(
            "/forms",
            get(handlers::form::list_forms).post(handlers::form::create_form),
        )
        .route(
            "/forms/{id}",
            get(handlers::form::get_form)
                .put(handlers::form::update_form)
                .delete(handlers::form::delete_form),
        )
        .route("/forms/{id}/clone", post(handlers::form::clone_form))
        // Model-bound fields
        .route(
            "/forms/{id}/attributes",
            get(handlers::form::available_attributes),
        )
        .route(
            "/forms/{id}/model-fields",
            post(handlers::form::add_model_fields),
        )
        // Fields
        .route("/forms/{id}/fields", post(handlers::field::add_field))
        .route(
            "/forms/{id}/fields/{field_id}",
            put(handlers::field::update_field).delete(handlers::field::delete_field),
        )
        // Handlers
        .route("/forms/{id}/handlers", post(handlers::handler::add_handler))
        .route(
            "/forms/{id}/handlers/{handler_id}",
            put(handlers::handler::update_handler).delete(handlers::handler::delete_handler),
        )
        // Registry
        .route("/field-types", get(handlers::registry::field_types))
        .route("/handler-types", get(handlers::registry::handler_types))
        // Runtime
        .route("/forms/{id}/compose", get(handlers::runtime::compose_form))
        .route(
            "/forms/{id}/submissions",
            post(handlers::runtime::submit_form),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no user required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
