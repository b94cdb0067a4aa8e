//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the records and health handlers
//! - Wire up middleware (tracing, limits, request ID, timeout)
//! - Bind server to listener
//! - Stop when shutdown is triggered

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::config::ServiceConfig;
use crate::http::handlers::{get_records, health};
use crate::http::middleware::error_envelope;
use crate::lifecycle::ShutdownSignal;
use crate::observability::tracing::http_trace_layer;
use crate::records::RecordsExecutor;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<dyn RecordsExecutor>,
}

/// HTTP server for the records API.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving records from `executor`.
    pub fn new(config: ServiceConfig, executor: Arc<dyn RecordsExecutor>) -> Self {
        let state = AppState { executor };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let records_route = config.api.records_route();
        Router::new()
            .route(&records_route, get(get_records).post(get_records))
            .route("/health", get(health))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(error_envelope))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(http_trace_layer())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            route = %self.config.api.records_route(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::http::ErrorBody;
    use crate::records::RecordStore;

    const RECORDS_URI: &str = "/_xpack/ml/anomaly_detectors/myjob/results/records";

    fn server() -> HttpServer {
        let store = RecordStore::default();
        store.create_job("myjob");
        HttpServer::new(ServiceConfig::default(), Arc::new(store))
    }

    async fn status(server: &HttpServer, method: &str, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        server.router.clone().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_records_route_accepts_get_and_post() {
        let server = server();
        assert_eq!(status(&server, "GET", RECORDS_URI).await, StatusCode::OK);
        assert_eq!(status(&server, "POST", RECORDS_URI).await, StatusCode::OK);
        assert_eq!(status(&server, "PUT", RECORDS_URI).await, StatusCode::METHOD_NOT_ALLOWED);
    }

    async fn error_response(server: HttpServer, request: Request<Body>) -> (StatusCode, ErrorBody) {
        let response = server.router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn small_body_server() -> HttpServer {
        let mut config = ServiceConfig::default();
        config.security.max_body_size = 16;
        let store = RecordStore::default();
        store.create_job("myjob");
        HttpServer::new(config, Arc::new(store))
    }

    #[tokio::test]
    async fn test_oversized_declared_body_gets_json_413() {
        let request = Request::builder()
            .method("POST")
            .uri(RECORDS_URI)
            .header("content-length", "64")
            .body(Body::from(vec![b' '; 64]))
            .unwrap();

        let (status, body) = error_response(small_body_server(), request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body.error.kind, "payload_too_large");
        assert_eq!(body.status, 413);
    }

    #[tokio::test]
    async fn test_oversized_streamed_body_gets_json_413() {
        let request = Request::builder()
            .method("POST")
            .uri(RECORDS_URI)
            .body(Body::from(vec![b' '; 64]))
            .unwrap();

        let (status, body) = error_response(small_body_server(), request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body.error.kind, "payload_too_large");
    }

    #[tokio::test]
    async fn test_undecodable_job_id_gets_json_400() {
        let request = Request::builder()
            .uri("/_xpack/ml/anomaly_detectors/%FF/results/records")
            .body(Body::empty())
            .unwrap();

        let (status, body) = error_response(server(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.kind, "malformed_request");
    }

    #[tokio::test]
    async fn test_missing_job_id_never_reaches_handler() {
        let server = server();
        let uri = "/_xpack/ml/anomaly_detectors//results/records";
        assert_eq!(status(&server, "GET", uri).await, StatusCode::NOT_FOUND);
    }
}
