//! Revocation under concurrent load.

use axum::http::StatusCode;
use futures_util::future::join_all;
use gateway_dispatch::auth::RevocationStore;
use serde_json::json;

mod common;

use common::{base_config, client, issue_token, route, spawn_gateway, start_mock_backend};

#[tokio::test]
async fn test_concurrent_logouts_all_take_effect() {
    let orders = start_mock_backend(StatusCode::OK, "orders").await;
    let gateway = spawn_gateway(base_config(vec![route("orders", "/api/orders", &orders.url(), "", true)])).await;
    let http = client();

    let tokens: Vec<String> = (0..50)
        .map(|i| issue_token(&format!("member-{i}"), json!({})))
        .collect();

    let logouts = tokens.iter().map(|token| {
        http.post(gateway.url("/auth/logout")).bearer_auth(token).send()
    });
    for res in join_all(logouts).await {
        assert_eq!(res.unwrap().status(), 204);
    }
    assert_eq!(gateway.store.len(), tokens.len());

    let requests = tokens.iter().map(|token| {
        http.get(gateway.url("/api/orders")).bearer_auth(token).send()
    });
    for res in join_all(requests).await {
        assert_eq!(res.unwrap().status(), 401);
    }
    assert_eq!(orders.hits(), 0);
}

#[tokio::test]
async fn test_other_tokens_unaffected_by_revocation() {
    let orders = start_mock_backend(StatusCode::OK, "orders").await;
    let gateway = spawn_gateway(base_config(vec![route("orders", "/api/orders", &orders.url(), "", true)])).await;
    let http = client();

    let revoked = issue_token("member-1", json!({}));
    let live = issue_token("member-1", json!({}));

    let res = http.post(gateway.url("/auth/logout")).bearer_auth(&revoked).send().await.unwrap();
    assert_eq!(res.status(), 204);

    let concurrency = 20;
    let requests = (0..concurrency).map(|i| {
        let token = if i % 2 == 0 { &revoked } else { &live };
        http.get(gateway.url("/api/orders")).bearer_auth(token).send()
    });

    let statuses: Vec<u16> = join_all(requests)
        .await
        .into_iter()
        .map(|res| res.unwrap().status().as_u16())
        .collect();

    assert_eq!(statuses.iter().filter(|s| **s == 401).count(), concurrency / 2);
    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), concurrency / 2);
    assert_eq!(orders.hits(), concurrency / 2);
}
