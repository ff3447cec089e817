//! Streamable HTTP transport for the MCP server.

mod middleware;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{auth_middleware, SecurityConfig};

use crate::config::Config;
use crate::mcp::PlanServer;

pub fn create_router(config: Arc<Config>) -> Router {
    let security = SecurityConfig::from_config(&config);
    create_router_with_config(config, security)
}

/// `/mcp` serves the MCP session endpoint behind the auth middleware;
/// `/health` stays open.
pub fn create_router_with_config(config: Arc<Config>, security: SecurityConfig) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(PlanServer::new(config.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let mcp = Router::new()
        .nest_service("/mcp", service)
        .route_layer(axum::middleware::from_fn_with_state(security, auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(mcp)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

pub async fn serve(config: Arc<Config>, port: u16) -> anyhow::Result<()> {
    let app = create_router(config);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("plan-mcp listening on http://127.0.0.1:{}/mcp", port);

    axum::serve(listener, app).await?;
    Ok(())
}
