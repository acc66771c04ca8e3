//! HTTP surface: router, listener lifecycle, `/health` and `/metrics`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::errors::ServerError;
use crate::health::health_check;
use crate::hub::{Hub, HubHandle};
use crate::ingress::ws_handler;
use crate::shutdown::{NamedTask, ShutdownCoordinator};

/// Shared state handed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// Mailbox of the hub control loop.
    pub hub: HubHandle,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server was created.
    pub start_time: Instant,
    /// Prometheus handle for `/metrics`, if a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// A configured server with its hub already running.
pub struct ChorusServer {
    config: Arc<ServerConfig>,
    hub: HubHandle,
    hub_task: JoinHandle<()>,
    shutdown: ShutdownCoordinator,
    metrics: Option<PrometheusHandle>,
    start_time: Instant,
}

impl ChorusServer {
    /// Spawn the hub and prepare the router. Must be called inside a Tokio
    /// runtime.
    pub fn new(config: ServerConfig, metrics: Option<PrometheusHandle>) -> Self {
        let shutdown = ShutdownCoordinator::new();
        let (hub, hub_task) = Hub::spawn(config.mailbox_capacity, shutdown.token());
        Self {
            config: Arc::new(config),
            hub,
            hub_task,
            shutdown,
            metrics,
            start_time: Instant::now(),
        }
    }

    /// Handle to the running hub.
    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Build the Axum router.
    pub fn router(&self) -> Router {
        let state = AppState {
            hub: self.hub.clone(),
            config: Arc::clone(&self.config),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route(&self.config.ws_path, any(ws_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind the listener and start serving in the background.
    pub async fn listen(self) -> Result<RunningServer, ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

        let router = self.router();
        let token = self.shutdown.token();
        let serve_task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                warn!(error = %e, "http server exited with error");
            }
        });

        info!(%local_addr, ws_path = %self.config.ws_path, "chorus server listening");

        Ok(RunningServer {
            local_addr,
            hub: self.hub,
            tasks: vec![("http", serve_task), ("hub", self.hub_task)],
            shutdown: self.shutdown,
            config: self.config,
        })
    }
}

/// A server that is accepting connections.
pub struct RunningServer {
    local_addr: SocketAddr,
    hub: HubHandle,
    tasks: Vec<NamedTask>,
    shutdown: ShutdownCoordinator,
    config: Arc<ServerConfig>,
}

impl RunningServer {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle to the running hub.
    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Token cancelled when shutdown begins.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.token()
    }

    /// Stop accepting connections and stop the hub (closing every peer's
    /// queue). Either task still running after the configured shutdown
    /// timeout is aborted.
    pub async fn shutdown(self) {
        let aborted = self
            .shutdown
            .drain(self.tasks, self.config.shutdown_timeout)
            .await;
        info!(aborted, "chorus server stopped");
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = health_check(state.start_time, state.hub.peer_count().await.ok());
    let status = if body.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
