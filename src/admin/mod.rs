//! Operator API on its own listener.
//!
//! # Endpoints
//! - `GET /admin/status`: version, status, route count
//! - `GET /admin/routes`: the route table in configuration order
//! - `GET /admin/revocations`: revocation store size
//!
//! Every endpoint requires `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::auth::RevocationStore;
use crate::routing::RouteRegistry;

use self::auth::admin_auth_middleware;
use self::handlers::{get_revocations, get_routes, get_status};

#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<RouteRegistry>,
    pub store: Arc<dyn RevocationStore>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/revocations", get(get_revocations))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{InMemoryRevocationStore, ManualClock};
    use crate::config::RouteDefinition;
    use axum::body::Body;
    use axum::http::{header::AUTHORIZATION, Request, StatusCode};
    use tower::ServiceExt;

    async fn state() -> AdminState {
        let clock = Arc::new(ManualClock::new(100));
        let store = InMemoryRevocationStore::new(clock);
        store.revoke("jti-1", 500).await;
        let registry = RouteRegistry::new(vec![
            RouteDefinition::new("member", "/api/member", "http://member:8081", "/v1", false),
            RouteDefinition::new("orders", "/api/orders", "http://orders:8082", "", true),
        ])
        .unwrap();
        AdminState {
            registry: Arc::new(registry),
            store: Arc::new(store),
            api_key: Arc::from("admin-key"),
        }
    }

    async fn get_json(router: Router, path: &str, key: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::get(path);
        if let Some(key) = key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
        }
        let response = router.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_requires_api_key() {
        let router = setup_admin_router(state().await);
        let (status, _) = get_json(router.clone(), "/admin/status", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = get_json(router, "/admin/status", Some("wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_endpoints() {
        let router = setup_admin_router(state().await);

        let (status, body) = get_json(router.clone(), "/admin/status", Some("admin-key")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "operational");
        assert_eq!(body["routes"], 2);

        let (_, body) = get_json(router.clone(), "/admin/routes", Some("admin-key")).await;
        assert_eq!(body[0]["id"], "member");
        assert_eq!(body[1]["requires_auth"], true);

        let (_, body) = get_json(router, "/admin/revocations", Some("admin-key")).await;
        assert_eq!(body["entries"], 1);
    }
}
