//! Shared utilities for integration tests: mock downstreams and a gateway spawner.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use jsonwebtoken::Algorithm;
use serde_json::Value;
use tokio::net::TcpListener;

use gateway_dispatch::auth::{Claims, RevocationStore, SystemClock, TokenIssuer};
use gateway_dispatch::config::{GatewayConfig, RouteDefinition};
use gateway_dispatch::lifecycle::{Gateway, Shutdown};

pub const SECRET: &str = "integration-secret-0123456789abcdef";

/// One request as seen by a mock downstream.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct BackendState {
    captured: Arc<Mutex<Vec<Captured>>>,
    status: StatusCode,
    body: &'static str,
    delay: Option<Duration>,
}

/// Handle to a running mock downstream.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.captured.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Captured> {
        self.captured.lock().unwrap().last().cloned()
    }
}

/// Start a downstream that answers every request with `status` and `body`.
pub async fn start_mock_backend(status: StatusCode, body: &'static str) -> MockBackend {
    spawn_backend(status, body, None).await
}

/// Start a downstream that waits `delay` before answering 200.
pub async fn start_slow_backend(delay: Duration) -> MockBackend {
    spawn_backend(StatusCode::OK, "slow", Some(delay)).await
}

async fn spawn_backend(
    status: StatusCode,
    body: &'static str,
    delay: Option<Duration>,
) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));

    let state = BackendState {
        captured: captured.clone(),
        status,
        body,
        delay,
    };
    let app = Router::new().fallback(record).with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, captured }
}

async fn record(State(state): State<BackendState>, request: Request<Body>) -> (StatusCode, &'static str) {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    state.captured.lock().unwrap().push(Captured {
        method: parts.method.to_string(),
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        headers: parts.headers,
        body,
    });

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }
    (state.status, state.body)
}

/// An address on which nothing is listening.
pub fn dead_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

pub fn route(id: &str, prefix: &str, base: &str, target_prefix: &str, requires_auth: bool) -> RouteDefinition {
    RouteDefinition::new(id, prefix, base, target_prefix, requires_auth)
}

/// Valid configuration with tight timeouts for tests.
pub fn base_config(routes: Vec<RouteDefinition>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.jwt_secret = Some(SECRET.to_string());
    config
        .auth
        .claim_headers
        .insert("role".into(), "x-member-role".into());
    config.timeouts.connect_secs = 1;
    config.timeouts.downstream_secs = 1;
    config.timeouts.inbound_secs = 5;
    config.routes = routes;
    config
}

/// A running gateway. Dropping it shuts the gateway down.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub store: Arc<dyn RevocationStore>,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_gateway(config: GatewayConfig) -> TestGateway {
    let gateway = Gateway::build(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    tokio::spawn(gateway.server().run(listener, shutdown.subscribe()));

    TestGateway {
        addr,
        store: gateway.store().clone(),
        shutdown,
    }
}

pub fn issue_token(subject: &str, extra: Value) -> String {
    let extra: Claims = match extra {
        Value::Object(map) => map,
        _ => Claims::new(),
    };
    TokenIssuer::new(SECRET.as_bytes(), Algorithm::HS256, Arc::new(SystemClock))
        .issue(subject, Duration::from_secs(600), extra)
        .unwrap()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
