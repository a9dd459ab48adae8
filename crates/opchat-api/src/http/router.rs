//! Axum router configuration with middleware.
//!
//! API routes are under `/api/v1/`, the live subscription under
//! `/ws/sessions/{id}`. Middleware: CORS, tracing.
//!
//! In production, the built chat-widget frontend is served from a static
//! directory (configurable via `OPCHAT_WEB_DIR`). API routes take
//! priority; if the directory does not exist, only the API is served.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
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
        // Sessions
        .route("/sessions", post(handlers::session::create_session))
        .route("/sessions/{id}", get(handlers::session::get_session))
        .route(
            "/sessions/{id}/messages",
            post(handlers::message::send_message).get(handlers::session::list_messages),
        )
        // Create-or-reuse entry point for the widget
        .route("/questions", post(handlers::message::send_question))
        // Automated answers
        .route("/chat", post(handlers::chat::auto_answer));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/ws/sessions/{id}", get(handlers::ws::ws_handler))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Serve the built widget frontend from disk if the directory exists.
    let web_dir = std::env::var("OPCHAT_WEB_DIR").unwrap_or_else(|_| "web/dist".to_string());
    if std::path::Path::new(&web_dir).exists() {
        let index_path = format!("{}/index.html", web_dir);
        let serve_dir = ServeDir::new(&web_dir).fallback(ServeFile::new(index_path));
        router = router.fallback_service(serve_dir);
        tracing::info!(path = %web_dir, "static file serving enabled");
    }

    router
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
