//! Axum router configuration with middleware.
//!
//! All API routes are under `/api/v1/`; `/health` sits at the root.
//! Middleware: CORS, request tracing.
//!
//! When `server.web_dir` points at a built web client, unknown paths fall
//! through to its `index.html` for client-side routing. API routes and
//! `/health` take priority.

use axum::Router;
use axum::extract::State;
use axum::routing::{delete, get, post};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat/active", get(handlers::chat::list_active))
        .route("/chat/start", post(handlers::chat::start_chat))
        .route("/chat/msg", post(handlers::chat::send_message))
        .route("/chat/load", post(handlers::chat::load_history))
        .route("/chat/{id}", delete(handlers::chat::delete_chat))
        .route("/orgs", get(handlers::organization::list_organizations));

    let web_dir = state.config.server.web_dir.clone();

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(web_dir) = web_dir.filter(|dir| std::path::Path::new(dir).exists()) {
        let index_path = format!("{web_dir}/index.html");
        let serve_dir = ServeDir::new(&web_dir).fallback(ServeFile::new(index_path));
        router = router.fallback_service(serve_dir);
        tracing::info!(path = %web_dir, "Web client static file serving enabled");
    }

    router
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    oracle: &'static str,
}

/// GET /health - Liveness plus an oracle reachability probe.
async fn health_check(State(state): State<AppState>) -> axum::Json<Health> {
    let oracle = match state.chat_service.oracle_health().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(kind = e.kind(), error = %e, "Oracle health probe failed");
            "unreachable"
        }
    };

    axum::Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        oracle,
    })
}
