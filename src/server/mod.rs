//! HTTP surface: payload delivery, technology index, health and live logs.

mod client_ip;
mod error;
mod handlers;
mod rate_limit;
mod request_log;

#[cfg(test)]
mod tests;

pub use client_ip::ClientIp;
pub use error::ApiError;
pub use rate_limit::{RateLimitConfig, RateLimitExceeded, RateLimiter};

use crate::resolver::PathResolver;
use crate::telemetry::LogBroadcaster;
use anyhow::{Context, Result};
use axum::middleware;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Request-independent knobs the handlers need
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Lower-case domain the service is reached at
    pub domain: String,
    /// Honor `X-Forwarded-For`
    pub trust_proxy: bool,
    /// Hide internal error details
    pub production: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            trust_proxy: false,
            production: false,
        }
    }
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<PathResolver>,
    pub payload_limiter: Arc<RateLimiter>,
    pub health_limiter: Arc<RateLimiter>,
    pub logs: LogBroadcaster,
    pub settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(
        resolver: PathResolver,
        payload_limit: RateLimitConfig,
        health_limit: RateLimitConfig,
        logs: LogBroadcaster,
        settings: ServerSettings,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            payload_limiter: Arc::new(RateLimiter::new(payload_limit)),
            health_limiter: Arc::new(RateLimiter::new(health_limit)),
            logs,
            settings: Arc::new(settings),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let payloads = Router::new()
        .route("/rfi", get(handlers::list_technologies))
        .route("/rfi/:technology", get(handlers::missing_filename))
        .route("/rfi/:technology/:filename", get(handlers::serve_payload))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_payloads,
        ));

    let health = Router::new()
        .route("/health", get(handlers::health))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_health,
        ));

    Router::new()
        .merge(payloads)
        .merge(health)
        .route("/logs/stream", get(handlers::stream_logs))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            request_log::log_requests,
        ))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        addr = %addr,
        root = %state.resolver.root().path().display(),
        technologies = state.resolver.registry().technology_count(),
        production = state.settings.production,
        "Payload server listening"
    );

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server terminated unexpectedly")?;

    info!("Payload server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
