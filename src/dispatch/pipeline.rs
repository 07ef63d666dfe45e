//! Per-request orchestration: resolve, authenticate, forward.
//!
//! # Responsibilities
//! - Resolve the route; stop with 404 when none matches
//! - Authenticate when the route requires it; stop with 401 on failure
//! - Buffer the body under the size limit; stop with 413 when it is larger
//! - Forward and return the downstream response unchanged
//! - Record request metrics and the failure reason
//!
//! # Design Decisions
//! - The downstream is never contacted for a request that failed resolution or auth
//! - The body is not read until the route and the token have both been accepted
//! - Stateless per request; all shared state is behind `Arc`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::Response;

use crate::auth::{AuthContext, AuthFailure, AuthenticationGate};
use crate::dispatch::DispatchError;
use crate::http::request::read_body;
use crate::observability::metrics;
use crate::proxy::{Forward, ForwardRequest};
use crate::routing::{ResolvedRoute, RouteRegistry};

pub struct DispatchPipeline {
    registry: Arc<RouteRegistry>,
    gate: Arc<AuthenticationGate>,
    forwarder: Arc<dyn Forward>,
    max_body_bytes: usize,
}

impl DispatchPipeline {
    pub fn new(
        registry: Arc<RouteRegistry>,
        gate: Arc<AuthenticationGate>,
        forwarder: Arc<dyn Forward>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            registry,
            gate,
            forwarder,
            max_body_bytes,
        }
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    pub fn gate(&self) -> &Arc<AuthenticationGate> {
        &self.gate
    }

    /// Dispatch one inbound request.
    pub async fn dispatch(
        &self,
        parts: Parts,
        body: Body,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Body>, DispatchError> {
        let start = Instant::now();
        let method = parts.method.clone();
        let path = parts.uri.path().to_owned();

        let resolved = match self.registry.resolve(&path) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::debug!(method = %method, path = %path, "No route matched");
                metrics::record_request(method.as_str(), e.status().as_u16(), "none", start);
                return Err(e);
            }
        };

        let result = self.authorize_and_forward(&resolved, parts, body, client_addr).await;

        let status = match &result {
            Ok(response) => response.status(),
            Err(e) => {
                tracing::info!(
                    route = %resolved.route.id,
                    path = %path,
                    reason = e.code(),
                    "Request rejected"
                );
                e.status()
            }
        };
        metrics::record_request(method.as_str(), status.as_u16(), &resolved.route.id, start);

        result
    }

    async fn authorize_and_forward(
        &self,
        resolved: &ResolvedRoute<'_>,
        parts: Parts,
        body: Body,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Body>, DispatchError> {
        let auth = if resolved.route.requires_auth {
            Some(self.authenticate(&parts).await?)
        } else {
            None
        };

        let body = read_body(body, self.max_body_bytes).await?;

        let request = ForwardRequest {
            query: parts.uri.query().map(str::to_owned),
            method: parts.method,
            headers: parts.headers,
            body,
            client_addr,
        };

        let response = self.forwarder.forward(resolved, request, auth.as_ref()).await?;
        Ok(response)
    }

    /// Authenticate the request's `Authorization` header.
    pub async fn authenticate(&self, parts: &Parts) -> Result<AuthContext, AuthFailure> {
        let header = match parts.headers.get(AUTHORIZATION) {
            None => "",
            Some(value) => value.to_str().map_err(|_| AuthFailure::MalformedToken)?,
        };
        self.gate.authenticate(header).await
    }
}
