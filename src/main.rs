//! Agent Monitor Backend
//!
//! A REST API and WebSocket server tracking long-running extraction agents
//! and their tasks: registration, status/progress reporting, heartbeat-based
//! liveness detection, and crash-safe persistence of the tracking state.

mod api;
mod config;
mod error;
mod monitor;
mod websocket;

use api::AppContext;
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use config::Config;
use monitor::AgentMonitor;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Serialize)]
struct HelloResponse {
    message: String,
    status: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    message: String,
}

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    // Construct the one monitor instance for this process; it repopulates
    // itself from the snapshot file when one exists
    let monitor = Arc::new(AgentMonitor::new(Some(
        config.persistence.state_path.clone(),
    )));

    // Fan monitor events out to WebSocket clients. The callback runs under
    // the store lock, so it only serializes and hands off to the channel.
    let (events, _) = broadcast::channel::<String>(EVENT_CHANNEL_CAPACITY);
    {
        let events = events.clone();
        monitor.register_callback(move |event| match serde_json::to_string(event) {
            Ok(payload) => {
                // No receivers connected is a normal condition
                let _ = events.send(payload);
            }
            Err(e) => tracing::warn!("Failed to serialize monitor event: {}", e),
        });
    }

    let context = Arc::new(AppContext {
        monitor,
        config: config.clone(),
        events,
    });

    // Build our application with routes
    let app = Router::new()
        // Health check and hello world
        .route("/", get(hello_world))
        .route("/api/health", get(health_check))
        // Agent monitoring API
        .route("/api/monitor/agents", get(api::agents::list_agents))
        .route(
            "/api/monitor/agents/register",
            post(api::agents::register_agent),
        )
        .route(
            "/api/monitor/agents/:id",
            get(api::agents::get_agent_summary),
        )
        .route(
            "/api/monitor/agents/:id/status",
            put(api::agents::update_agent_status),
        )
        .route(
            "/api/monitor/agents/:id/heartbeat",
            post(api::agents::record_heartbeat),
        )
        // Task monitoring API
        .route("/api/monitor/tasks", get(api::tasks::list_tasks))
        .route("/api/monitor/tasks/assign", post(api::tasks::assign_task))
        .route("/api/monitor/tasks/:id", get(api::tasks::get_task))
        .route(
            "/api/monitor/tasks/:id/status",
            put(api::tasks::update_task_status),
        )
        .route(
            "/api/monitor/tasks/:id/progress",
            put(api::tasks::update_task_progress),
        )
        // Dashboard summaries
        .route("/api/monitor/summary", get(api::summary::overall_summary))
        .route(
            "/api/monitor/incomplete",
            get(api::tasks::list_incomplete_tasks),
        )
        .route(
            "/api/monitor/stalled",
            get(api::summary::check_stalled_agents),
        )
        // WebSocket for real-time updates
        .route("/ws", get(websocket::websocket_handler))
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive()) // Allow CORS for development
        .with_state(context);

    // Bind to address from config
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!("🚀 Server running on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Setup graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

async fn hello_world() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello from Agent Monitor Backend!".to_string(),
        status: "ok".to_string(),
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Backend is healthy".to_string(),
    })
}
