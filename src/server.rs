use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::{ExecutionPayload, ExecutionResult, Gateway, HealthReport};

async fn execute_code(
    State(gateway): State<Gateway>,
    payload: Result<Json<ExecutionPayload>, JsonRejection>,
) -> Result<Json<ExecutionResult>, GatewayError> {
    let Json(payload) = payload.map_err(|e| {
        warn!("Malformed execution request: {}", e);
        GatewayError::InvalidRequest(e.body_text())
    })?;

    Ok(Json(gateway.submit(payload).await?))
}

async fn health_check(State(gateway): State<Gateway>) -> (StatusCode, Json<HealthReport>) {
    let report = gateway.health_check().await;
    let status = if report.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

async fn list_languages(State(gateway): State<Gateway>) -> Result<Json<Value>, GatewayError> {
    Ok(Json(gateway.list_supported_languages().await?))
}

async fn check_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}

pub fn router(gateway: Gateway, allowed_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/execute", post(execute_code))
        .route("/health", get(health_check))
        .route("/languages", get(list_languages))
        .route("/version", get(check_version));

    Router::new()
        .nest("/api", api)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

pub async fn run_server(config: GatewayConfig) -> Result<()> {
    let gateway = Gateway::from_config(&config);
    let app = router(gateway, &config.cors_allowed_origins);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Execution gateway listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Execution gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received");
}
