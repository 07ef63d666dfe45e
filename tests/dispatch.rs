//! End-to-end dispatch through a real gateway listener and mock downstreams.

use std::time::Duration;

use axum::http::StatusCode;
use gateway_dispatch::auth::RevocationStore;
use serde_json::{json, Value};

mod common;

use common::{
    base_config, client, dead_addr, issue_token, route, spawn_gateway, start_mock_backend,
    start_slow_backend,
};

#[tokio::test]
async fn test_member_login_forwarded_to_versioned_path() {
    let member = start_mock_backend(StatusCode::OK, "welcome").await;
    let gateway = spawn_gateway(base_config(vec![route(
        "member",
        "/api/member",
        &member.url(),
        "/v1",
        false,
    )]))
    .await;

    let res = client()
        .post(gateway.url("/api/member/login?next=home"))
        .header("x-member-id", "spoofed")
        .header("content-type", "application/json")
        .body(r#"{"user":"m","password":"p"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "welcome");

    let seen = member.last().unwrap();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path_and_query, "/v1/login?next=home");
    assert_eq!(seen.body.as_ref(), br#"{"user":"m","password":"p"}"#);
    assert_eq!(seen.headers["content-type"], "application/json");
    assert_eq!(seen.headers["x-forwarded-for"], "127.0.0.1");
    assert!(seen.headers.contains_key("x-request-id"));
    assert!(seen.headers.get("x-member-id").is_none(), "spoofed identity must be stripped");
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let backend = start_mock_backend(StatusCode::OK, "ok").await;
    let gateway = spawn_gateway(base_config(vec![route("member", "/api/member", &backend.url(), "", false)])).await;

    let res = client().get(gateway.url("/api/unknown")).send().await.unwrap();

    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "route_not_found");
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn test_protected_route_without_token_never_reaches_downstream() {
    let orders = start_mock_backend(StatusCode::OK, "orders").await;
    let gateway = spawn_gateway(base_config(vec![route("orders", "/api/orders", &orders.url(), "", true)])).await;

    let res = client().get(gateway.url("/api/orders/1")).send().await.unwrap();

    assert_eq!(res.status(), 401);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "auth_missing_token");
    assert_eq!(orders.hits(), 0);
}

#[tokio::test]
async fn test_protected_route_injects_identity_headers() {
    let orders = start_mock_backend(StatusCode::OK, "orders").await;
    let gateway = spawn_gateway(base_config(vec![route(
        "orders",
        "/api/orders",
        &orders.url(),
        "/v1/orders",
        true,
    )]))
    .await;
    let token = issue_token("member-42", json!({"role": "gold"}));

    let res = client()
        .get(gateway.url("/api/orders/7"))
        .bearer_auth(&token)
        .header("x-member-role", "admin")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let seen = orders.last().unwrap();
    assert_eq!(seen.path_and_query, "/v1/orders/7");
    assert_eq!(seen.headers["x-member-id"], "member-42");
    assert_eq!(seen.headers["x-member-role"], "gold");
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let orders = start_mock_backend(StatusCode::OK, "orders").await;
    let gateway = spawn_gateway(base_config(vec![route("orders", "/api/orders", &orders.url(), "", true)])).await;

    let token = issue_token("member-42", json!({}));
    let mut tampered = token.into_bytes();
    let last = tampered.len() - 1;
    tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let res = client()
        .get(gateway.url("/api/orders"))
        .bearer_auth(tampered)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 401);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "auth_invalid_signature");
    assert_eq!(orders.hits(), 0);
}

#[tokio::test]
async fn test_logout_revokes_token_until_expiry() {
    let orders = start_mock_backend(StatusCode::OK, "orders").await;
    let gateway = spawn_gateway(base_config(vec![route("orders", "/api/orders", &orders.url(), "", true)])).await;
    let token = issue_token("member-42", json!({}));
    let http = client();

    let res = http.get(gateway.url("/api/orders")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = http.post(gateway.url("/auth/logout")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), 204);
    assert_eq!(gateway.store.len(), 1);

    let res = http.get(gateway.url("/api/orders")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), 401);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "auth_revoked");
    assert_eq!(orders.hits(), 1);
}

#[tokio::test]
async fn test_downstream_status_passes_through() {
    let teapot = start_mock_backend(StatusCode::IM_A_TEAPOT, "short and stout").await;
    let gateway = spawn_gateway(base_config(vec![route("tea", "/tea", &teapot.url(), "", false)])).await;

    let res = client().get(gateway.url("/tea/pot")).send().await.unwrap();

    assert_eq!(res.status(), 418);
    assert_eq!(res.text().await.unwrap(), "short and stout");
}

#[tokio::test]
async fn test_unreachable_downstream_is_502() {
    let base = format!("http://{}", dead_addr());
    let gateway = spawn_gateway(base_config(vec![route("dead", "/dead", &base, "", false)])).await;

    let res = client().get(gateway.url("/dead/x")).send().await.unwrap();

    assert_eq!(res.status(), 502);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "downstream_unavailable");
}

#[tokio::test]
async fn test_slow_downstream_is_504() {
    let slow = start_slow_backend(Duration::from_secs(3)).await;
    let gateway = spawn_gateway(base_config(vec![route("slow", "/slow", &slow.url(), "", false)])).await;

    let res = client().get(gateway.url("/slow/x")).send().await.unwrap();

    assert_eq!(res.status(), 504);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "downstream_timeout");
    assert_eq!(slow.hits(), 1);
}

#[tokio::test]
async fn test_longest_prefix_wins_over_config_order() {
    let general = start_mock_backend(StatusCode::OK, "general").await;
    let v2 = start_mock_backend(StatusCode::OK, "v2").await;
    let gateway = spawn_gateway(base_config(vec![
        route("api", "/api/", &general.url(), "", false),
        route("api-v2", "/api/v2/", &v2.url(), "/internal", false),
    ]))
    .await;

    let res = client().get(gateway.url("/api/v2/foo")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "v2");
    assert_eq!(v2.last().unwrap().path_and_query, "/internal/foo");

    let res = client().get(gateway.url("/api/v1/foo")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "general");
    assert_eq!(general.last().unwrap().path_and_query, "/v1/foo");
}
