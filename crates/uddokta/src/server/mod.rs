//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the poster API and health check
//! - Wire up middleware (tracing, body limit, timeout, panic guard)
//! - Optionally serve a static front end after the API routes
//! - Bind and serve with graceful shutdown

mod handlers;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};
use uddokta_core::{Config, PosterService};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PosterService>,
}

/// HTTP server for the poster API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: Config) -> Self {
        let state = AppState {
            service: Arc::new(PosterService::from_config(&config)),
        };
        Self {
            router: build_router(&config, state),
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Server running on http://{addr}");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(config: &Config, state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/create",
            post(handlers::create_poster)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        )
        .route("/health", get(handlers::health))
        .with_state(state);

    // Static files go last so API routes are never shadowed
    let app = match config.static_dir() {
        Some(dir) => {
            tracing::info!("Serving static files from {}", dir.display());
            api.fallback_service(ServeDir::new(dir))
        }
        None => api,
    };

    let body_limit = config.server.body_limit_mb.saturating_mul(1024 * 1024);
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);

    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(request_timeout, request_deadline))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// Abort requests that outlive `server.request_timeout_secs`.
async fn request_deadline(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => server_error(format!("request timed out after {}s", limit.as_secs())),
    }
}

/// Convert a handler panic into the JSON `server_error` shape.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    server_error(details)
}

fn server_error(details: String) -> Response {
    tracing::error!("/api/create error: {details}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "server_error", "details": details})),
    )
        .into_response()
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
