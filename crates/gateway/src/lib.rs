//! HTTP API gateway for DocRelay.
//!
//! Exposes the relay and document endpoints under `/api` plus a `/health`
//! liveness check. Built on Axum.

pub mod api;
pub mod error;

#[cfg(test)]
pub(crate) mod test_support;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::Json,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use docrelay_config::{AppConfig, GatewayConfig};
use docrelay_core::document::DocumentStore;
use docrelay_documents::SqliteDocumentStore;
use docrelay_relay::RelayPipeline;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: Arc<RelayPipeline>,
    pub store: Arc<dyn DocumentStore>,
    pub bearer_tokens: Vec<String>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Bearer token authentication on `/api` routes (when tokens are configured)
/// - CORS from `gateway.allowed_origins`
/// - Request body size limit
/// - HTTP trace logging
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    let api = api::api_router().layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(cors_layer(&config.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
///
/// Opens the document store once, builds the pipeline from configuration,
/// serves until Ctrl-C, then closes the store.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let store = Arc::new(
        SqliteDocumentStore::open(
            &config.documents.database_url,
            config.documents.max_connections,
        )
        .await?,
    );
    let pipeline = RelayPipeline::from_config(&config, store.clone())?;

    if config.gateway.bearer_tokens.is_empty() {
        warn!("No bearer tokens configured; /api routes are unauthenticated");
    }

    let state = Arc::new(GatewayState {
        pipeline: Arc::new(pipeline),
        store: store.clone(),
        bearer_tokens: config.gateway.bearer_tokens.clone(),
    });
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Authentication middleware for `/api` routes.
///
/// Requires `Authorization: Bearer <token>` matching a configured token.
/// With no tokens configured every request passes.
async fn auth_middleware(
    State(state): State<SharedState>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    if state.bearer_tokens.is_empty() {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match auth_header {
        Some(token) if state.bearer_tokens.iter().any(|t| t == token) => Ok(next.run(req).await),
        _ => {
            warn!(
                path = %req.uri().path(),
                "Unauthorized request: missing or invalid bearer token"
            );
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn with_tokens(state: SharedState, tokens: &[&str]) -> SharedState {
        Arc::new(GatewayState {
            pipeline: state.pipeline.clone(),
            store: state.store.clone(),
            bearer_tokens: tokens.iter().map(|t| t.to_string()).collect(),
        })
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (state, _) = test_state(Ok("x".into())).await;
        let app = test_router(state);

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_requires_token_when_configured() {
        let (state, _) = test_state(Ok("x".into())).await;
        let app = test_router(with_tokens(state, &["secret-token"]));

        let req = Request::builder()
            .uri("/api/uploaded-documents")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let req = Request::builder()
            .uri("/api/uploaded-documents")
            .header("Authorization", "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let req = Request::builder()
            .uri("/api/uploaded-documents")
            .header("Authorization", "Bearer secret-token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_exempt_from_auth() {
        let (state, _) = test_state(Ok("x".into())).await;
        let app = test_router(with_tokens(state, &["secret-token"]));

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_body_rejected() {
        let (state, _) = test_state(Ok("x".into())).await;
        let config = GatewayConfig {
            body_limit_bytes: 1024,
            ..GatewayConfig::default()
        };
        let app = build_router(state, &config);

        let body = serde_json::json!({"filename": "big.txt", "content": "x".repeat(4096)});
        let req = Request::builder()
            .method("POST")
            .uri("/api/documents")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["kind"], "validation");
    }
}
