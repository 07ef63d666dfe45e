//! Downstream request forwarding.
//!
//! # Responsibilities
//! - Build the downstream URL and request from the resolved route
//! - Sanitize headers and inject gateway-asserted identity
//! - Enforce the downstream timeout
//! - Hand back the downstream response untouched
//!
//! # Design Decisions
//! - No retries: a failed exchange is reported once, as Unavailable or Timeout
//! - Connect failures (including connect timeouts) count as Unavailable
//! - Response bodies are streamed, request bodies arrive already buffered

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, Response, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::auth::AuthContext;
use crate::proxy::headers::{append_forwarded_for, apply_identity, strip_hop_by_hop, IdentityHeaders};
use crate::proxy::url::build_target_url;
use crate::routing::ResolvedRoute;

/// Why a downstream exchange did not produce a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ForwardingFailure {
    #[error("downstream service unavailable")]
    DownstreamUnavailable,

    #[error("downstream service timed out")]
    DownstreamTimeout,
}

impl ForwardingFailure {
    pub fn code(&self) -> &'static str {
        match self {
            ForwardingFailure::DownstreamUnavailable => "downstream_unavailable",
            ForwardingFailure::DownstreamTimeout => "downstream_timeout",
        }
    }
}

/// The parts of an inbound request that are forwarded.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub query: Option<String>,
    pub client_addr: Option<SocketAddr>,
}

/// Sends a request to the downstream named by a resolved route.
#[async_trait]
pub trait Forward: Send + Sync {
    async fn forward(
        &self,
        resolved: &ResolvedRoute<'_>,
        request: ForwardRequest,
        auth: Option<&AuthContext>,
    ) -> Result<Response<Body>, ForwardingFailure>;
}

/// Forwarder configuration.
#[derive(Debug, Clone)]
pub struct ForwarderSettings {
    pub connect_timeout: Duration,
    pub downstream_timeout: Duration,
    pub identity: IdentityHeaders,
}

/// HTTP reverse proxy over a pooled hyper client.
#[derive(Clone)]
pub struct ReverseProxyForwarder {
    client: Client<HttpConnector, Body>,
    settings: ForwarderSettings,
}

impl ReverseProxyForwarder {
    pub fn new(settings: ForwarderSettings) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(settings.connect_timeout));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self { client, settings }
    }

    fn build_request(
        &self,
        resolved: &ResolvedRoute<'_>,
        request: ForwardRequest,
        auth: Option<&AuthContext>,
    ) -> Result<Request<Body>, ForwardingFailure> {
        let target = build_target_url(resolved, request.query.as_deref());
        let uri: Uri = target.parse().map_err(|e| {
            tracing::error!(route = %resolved.route.id, target = %target, error = %e, "Invalid downstream URI");
            ForwardingFailure::DownstreamUnavailable
        })?;

        let mut headers = request.headers;
        strip_hop_by_hop(&mut headers);
        apply_identity(&mut headers, &self.settings.identity, auth);
        if let Some(addr) = request.client_addr {
            append_forwarded_for(&mut headers, addr.ip());
        }

        let mut req = Request::new(Body::from(request.body));
        *req.method_mut() = request.method;
        *req.uri_mut() = uri;
        *req.headers_mut() = headers;
        Ok(req)
    }
}

#[async_trait]
impl Forward for ReverseProxyForwarder {
    async fn forward(
        &self,
        resolved: &ResolvedRoute<'_>,
        request: ForwardRequest,
        auth: Option<&AuthContext>,
    ) -> Result<Response<Body>, ForwardingFailure> {
        let req = self.build_request(resolved, request, auth)?;
        let route_id = &resolved.route.id;

        tracing::debug!(route = %route_id, method = %req.method(), uri = %req.uri(), "Forwarding request");

        match time::timeout(self.settings.downstream_timeout, self.client.request(req)).await {
            Ok(Ok(response)) => {
                let (parts, body) = response.into_parts();
                Ok(Response::from_parts(parts, Body::new(body)))
            }
            Ok(Err(e)) => {
                tracing::warn!(route = %route_id, error = %e, connect = e.is_connect(), "Downstream request failed");
                Err(ForwardingFailure::DownstreamUnavailable)
            }
            Err(_) => {
                tracing::warn!(route = %route_id, timeout = ?self.settings.downstream_timeout, "Downstream request timed out");
                Err(ForwardingFailure::DownstreamTimeout)
            }
        }
    }
}
