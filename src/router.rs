use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>, frontend_dir: &str) -> Router {
    Router::new()
        .route("/api/health", get(handlers::healthcheck))
        .route("/api/snapshot", get(handlers::get_snapshot))
        // Template routes
        .route("/api/templates", get(handlers::templates::list_templates))
        .route("/api/templates", post(handlers::templates::create_template))
        .route("/api/templates/:id", get(handlers::templates::get_template))
        .route("/api/templates/:id", put(handlers::templates::update_template))
        .route("/api/templates/:id", delete(handlers::templates::delete_template))
        .route("/api/templates/:id/usages", get(handlers::templates::get_usages))
        .route("/api/templates/:id/variables", post(handlers::templates::add_variable))
        .route("/api/templates/:id/variables/extract", post(handlers::templates::extract_variables))
        .route("/api/templates/:id/variables/:name", put(handlers::templates::edit_variable))
        .route("/api/templates/:id/variables/:name", delete(handlers::templates::delete_variable))
        // Stack routes
        .route("/api/stacks", get(handlers::stacks::list_stacks))
        .route("/api/stacks", post(handlers::stacks::create_stack))
        .route("/api/stacks/:id", get(handlers::stacks::get_stack))
        .route("/api/stacks/:id", put(handlers::stacks::update_stack))
        .route("/api/stacks/:id", delete(handlers::stacks::delete_stack))
        .route("/api/stacks/:id/variables/resolved", get(handlers::stacks::resolve_variables))
        .route("/api/stacks/:id/variables/:name", get(handlers::stacks::resolve_one))
        .route("/api/stacks/:id/variables/:name", put(handlers::stacks::set_variable))
        // Device routes
        .route("/api/device-groups", get(handlers::devices::list_device_groups))
        .route("/api/device-groups", post(handlers::devices::create_device_group))
        .route("/api/devices", get(handlers::devices::list_devices))
        .route("/api/devices", post(handlers::devices::create_device))
        // Configuration objects
        .route("/api/objects", post(handlers::objects::save_object))
        .route("/api/objects/:kind/:id", delete(handlers::objects::delete_object))
        // Composition
        .route("/api/view", post(handlers::views::compose))
        .route("/api/label", post(handlers::views::label))
        // Static files (frontend)
        .nest_service("/assets", ServeDir::new(format!("{}/assets", frontend_dir)))
        .fallback_service(
            ServeDir::new(frontend_dir).fallback(ServeFile::new(format!("{}/index.html", frontend_dir))),
        )
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
