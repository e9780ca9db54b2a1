//! HTTP server exposing the help desk

pub mod http;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::desk::HelpDesk;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub desk: Arc<HelpDesk>,
}

/// Build the router without binding a socket
pub fn router(desk: Arc<HelpDesk>) -> Router {
    let state = ServerState { desk };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ask", post(http::ask_handler))
        .route("/requests", get(http::list_requests_handler))
        .route(
            "/requests/{id}",
            get(http::get_request_handler).post(http::resolve_handler),
        )
        .route("/knowledge", get(http::list_knowledge_handler))
        .route("/api/status", get(http::status_handler))
        // Supervisor panel paths
        .route("/help-requests", get(http::list_requests_handler))
        .route("/help-response/{id}", post(http::resolve_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn start(desk: Arc<HelpDesk>, host: &str, port: u16) -> Result<()> {
    let listener = bind(host, port).await?;
    let addr = listener.local_addr().context("Listener has no local address")?;

    info!("{} listening on http://{}", crate::info(), addr);
    axum::serve(listener, router(desk))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Bind the listener; `host` may be an IP address or a resolvable name
pub async fn bind(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down front desk server");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_resolves_host_names() {
        let listener = bind("localhost", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_accepts_ip_literals() {
        let listener = bind("127.0.0.1", 0).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }
}
