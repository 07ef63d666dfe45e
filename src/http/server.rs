//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: logout endpoint plus catch-all dispatch
//! - Wire up middleware (request ID, tracing, inbound timeout)
//! - Run the revocation sweeper alongside the listener
//! - Serve until the shutdown signal, then drain

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::RevocationSweeper;
use crate::config::GatewayConfig;
use crate::dispatch::{DispatchError, DispatchPipeline};
use crate::http::request::{client_addr, request_id, UuidRequestId};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DispatchPipeline>,
}

/// Public listener of the gateway.
pub struct GatewayServer {
    router: Router,
    sweeper: RevocationSweeper,
}

impl GatewayServer {
    pub fn new(config: &GatewayConfig, state: AppState, sweeper: RevocationSweeper) -> Self {
        let router = Self::build_router(config, state);
        Self { router, sweeper }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.auth.logout_path, post(logout_handler).fallback(dispatch_handler))
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.inbound_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(request.headers()),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for driving the gateway without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, accepting connections on `listener`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        let sweeper = tokio::spawn(self.sweeper.run(shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Gateway received shutdown signal, draining");
            })
            .await?;

        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "Revocation sweeper task failed");
        }

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Catch-all handler: run the dispatch pipeline.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let client = client_addr(&request);
    let (parts, body) = request.into_parts();

    match state.pipeline.dispatch(parts, body, client).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// Revoke the presented token until its own expiry.
async fn logout_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, _) = request.into_parts();
    match state.pipeline.authenticate(&parts).await {
        Ok(context) => {
            state.pipeline.gate().revoke(&context).await;
            StatusCode::NO_CONTENT.into_response()
        }
        Err(failure) => {
            tracing::info!(reason = failure.code(), "Logout rejected");
            DispatchError::from(failure).into_response()
        }
    }
}
