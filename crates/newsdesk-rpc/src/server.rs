//! HTTP server implementation using Axum.

use crate::app_router::{app_router, NewsStore};
use crate::config::ServerConfig;
use crate::routes;
use axum::{Json, Router};
use newsdesk_core::ProcedureRouter;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Procedures served by the bridge and called in process by pages.
    pub router: Arc<ProcedureRouter>,
    pub store: Arc<NewsStore>,
}

impl AppState {
    /// State backed by the seeded news store.
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(NewsStore::seeded());
        Self {
            config,
            router: Arc::new(app_router(store.clone())),
            store,
        }
    }
}

/// Liveness probe.
pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Build the application router with every route and layer.
pub fn build_app(state: Arc<AppState>) -> Router {
    // Configure CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::register(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(config: ServerConfig) -> anyhow::Result<SocketAddr> {
    config.validate()?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(AppState::new(config));
    info!(
        "Serving {} procedures at {}",
        state.router.len(),
        state.config.endpoint_prefix()
    );

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    // Spawn the server in the background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}
