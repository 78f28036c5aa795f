//! End-to-end forwarding tests against an embedded-directory gateway.

use serde_json::{json, Value};

use common::{
    client, dead_url, process, register, start_failing_backend, start_gateway, start_mock_backend,
    start_programmable_backend, test_config,
};

mod common;

#[tokio::test]
async fn test_forwards_to_registered_backend() {
    let backend = start_mock_backend("b1").await;
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &backend.url, &[("echo", "chat")]).await;

    let res = process(&gateway.url, "chat", json!({ "modelName": "echo", "content": "hi" })).await;
    assert_eq!(res.status(), 200);
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["backend"], "b1");
    assert_eq!(body["received"]["content"], "hi");

    assert_eq!(backend.hits(), 1);
    assert!(request_id.is_some());
    assert_eq!(backend.last_request_id(), request_id, "request id reaches the backend");
}

#[tokio::test]
async fn test_model_alias_field() {
    let backend = start_mock_backend("b1").await;
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &backend.url, &[("tldr", "summarize")]).await;

    let res = process(&gateway.url, "summarize", json!({ "model": "tldr", "content": "long" })).await;
    assert_eq!(res.status(), 200);
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_round_robin_across_backends() {
    let b1 = start_mock_backend("b1").await;
    let b2 = start_mock_backend("b2").await;
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &b1.url, &[("echo", "chat")]).await;
    register(&gateway.url, &b2.url, &[("echo", "chat")]).await;

    for _ in 0..4 {
        let res = process(&gateway.url, "chat", json!({ "modelName": "echo" })).await;
        assert_eq!(res.status(), 200);
    }
    assert_eq!(b1.hits(), 2);
    assert_eq!(b2.hits(), 2);
}

#[tokio::test]
async fn test_failover_on_server_error() {
    let broken = start_failing_backend(500).await;
    let healthy = start_mock_backend("healthy").await;
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &broken.url, &[("echo", "chat")]).await;
    register(&gateway.url, &healthy.url, &[("echo", "chat")]).await;

    for _ in 0..4 {
        let res = process(&gateway.url, "chat", json!({ "modelName": "echo" })).await;
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["backend"], "healthy");
    }
    // Tried once, then cooling down for the rest of the run.
    assert_eq!(broken.hits(), 1);
    assert_eq!(healthy.hits(), 4);

    let failed: Value = client()
        .get(format!("{}/admin/failed", gateway.url))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(failed["failed"], json!([broken.url]));
}

#[tokio::test]
async fn test_all_backends_failing_relays_last_response() {
    let b1 = start_failing_backend(503).await;
    let b2 = start_failing_backend(503).await;
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &b1.url, &[("echo", "chat")]).await;
    register(&gateway.url, &b2.url, &[("echo", "chat")]).await;

    let res = process(&gateway.url, "chat", json!({ "modelName": "echo" })).await;
    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "backend failure");
    // Each candidate is tried once; attempts stop when candidates run out.
    assert_eq!(b1.hits() + b2.hits(), 2);
}

#[tokio::test]
async fn test_attempts_are_bounded() {
    let backends = [
        start_failing_backend(500).await,
        start_failing_backend(500).await,
        start_failing_backend(500).await,
        start_failing_backend(500).await,
    ];
    let mut config = test_config();
    config.retries.max_attempts = 3;
    let gateway = start_gateway(config).await;
    for backend in &backends {
        register(&gateway.url, &backend.url, &[("echo", "chat")]).await;
    }

    let res = process(&gateway.url, "chat", json!({ "modelName": "echo" })).await;
    assert_eq!(res.status(), 500);
    let total: u32 = backends.iter().map(|b| b.hits()).sum();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    // Fails its first request only.
    let flaky = start_programmable_backend(|n, _| {
        if n == 1 {
            (502, json!({ "error": "warming up" }))
        } else {
            (200, json!({ "backend": "flaky" }))
        }
    })
    .await;
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &flaky.url, &[("echo", "chat")]).await;

    let first = process(&gateway.url, "chat", json!({ "modelName": "echo" })).await;
    assert_eq!(first.status(), 502);

    // Sole candidate is cooling down; selection still releases it.
    let second = process(&gateway.url, "chat", json!({ "modelName": "echo" })).await;
    assert_eq!(second.status(), 200);
    assert_eq!(flaky.hits(), 2);
}

#[tokio::test]
async fn test_no_response_from_any_backend_is_internal_error() {
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &dead_url().await, &[("echo", "chat")]).await;

    let res = process(&gateway.url, "chat", json!({ "modelName": "echo" })).await;
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to process request"));
}

#[tokio::test]
async fn test_server_error_survives_later_unreachable_attempt() {
    let broken = start_failing_backend(500).await;
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &broken.url, &[("echo", "chat")]).await;
    // Sorts after 127.0.0.1, so it is tried second; nothing listens there.
    register(&gateway.url, "http://127.0.0.9:1", &[("echo", "chat")]).await;

    let res = process(&gateway.url, "chat", json!({ "modelName": "echo" })).await;
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "backend failure", "the backend's own body is relayed");
    assert_eq!(broken.hits(), 1);
}

#[tokio::test]
async fn test_unreachable_backend_fails_over() {
    let healthy = start_mock_backend("healthy").await;
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &dead_url().await, &[("echo", "chat")]).await;
    register(&gateway.url, &healthy.url, &[("echo", "chat")]).await;

    for _ in 0..3 {
        let res = process(&gateway.url, "chat", json!({ "modelName": "echo" })).await;
        assert_eq!(res.status(), 200);
    }
    assert_eq!(healthy.hits(), 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let picky = start_failing_backend(422).await;
    let other = start_mock_backend("other").await;
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &picky.url, &[("echo", "chat")]).await;
    register(&gateway.url, &other.url, &[("echo", "chat")]).await;

    let mut statuses = Vec::new();
    for _ in 0..2 {
        statuses.push(process(&gateway.url, "chat", json!({ "modelName": "echo" })).await.status().as_u16());
    }
    statuses.sort();
    assert_eq!(statuses, vec![200, 422]);
    assert_eq!(picky.hits(), 1);
    assert_eq!(other.hits(), 1);
}

#[tokio::test]
async fn test_missing_model_name() {
    let gateway = start_gateway(test_config()).await;

    let res = process(&gateway.url, "chat", json!({ "content": "hi" })).await;
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["actor"], "system");
    assert_eq!(body["error"], "Missing model name");

    let res = process(&gateway.url, "summarize", json!({ "content": "hi" })).await;
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert!(body["summary"].is_string());
}

#[tokio::test]
async fn test_unknown_model() {
    let gateway = start_gateway(test_config()).await;

    let res = process(&gateway.url, "chat", json!({ "modelName": "nope" })).await;
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "No services available for model: nope");
}

#[tokio::test]
async fn test_unhealthy_backends_are_not_candidates() {
    let mut config = test_config();
    config.health_check.enabled = true;
    config.health_check.interval_ms = 200;
    config.health_check.timeout_ms = 100;
    let gateway = start_gateway(config).await;
    register(&gateway.url, &dead_url().await, &[("echo", "chat")]).await;

    tokio::time::sleep(std::time::Duration::from_millis(600)).await;

    let res = process(&gateway.url, "chat", json!({ "modelName": "echo" })).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_model_listings() {
    let b1 = start_mock_backend("b1").await;
    let b2 = start_mock_backend("b2").await;
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &b1.url, &[("echo", "chat"), ("tldr", "summarize")]).await;
    register(&gateway.url, &b2.url, &[("echo", "chat"), ("llava", "image")]).await;

    let all: Value = client()
        .get(format!("{}/api/models", gateway.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all, json!({ "availableModels": ["echo", "llava", "tldr"] }));

    let chat: Value = client()
        .get(format!("{}/api/models/types/chat", gateway.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(chat, json!({ "availableModels": ["echo"] }));
}

#[tokio::test]
async fn test_unknown_route() {
    let gateway = start_gateway(test_config()).await;
    let res = client().get(format!("{}/nope", gateway.url)).send().await.unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Route not found: /nope");
}

#[tokio::test]
async fn test_log_pass_through() {
    let mut config = test_config();
    let gateway = start_gateway(config.clone()).await;
    let res = client().get(format!("{}/api/logs", gateway.url)).send().await.unwrap();
    assert_eq!(res.status(), 503);

    let store = start_mock_backend("logs").await;
    config.gateway.log_store_url = Some(store.url.clone());
    let gateway = start_gateway(config.clone()).await;

    let res = client()
        .post(format!("{}/api/logs", gateway.url))
        .json(&json!({ "level": "info", "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["received"]["message"], "hello");

    let res = client()
        .get(format!("{}/api/query/recent?limit=5", gateway.url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(store.hits(), 2);

    config.gateway.log_store_url = Some(dead_url().await);
    let gateway = start_gateway(config).await;
    let res = client().get(format!("{}/api/logs", gateway.url)).send().await.unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to forward to logger"));
}

#[tokio::test]
async fn test_admin_api() {
    let broken = start_failing_backend(500).await;
    let gateway = start_gateway(test_config()).await;
    register(&gateway.url, &broken.url, &[("echo", "chat")]).await;
    process(&gateway.url, "chat", json!({ "modelName": "echo" })).await;

    let unauthorized = client().get(format!("{}/admin/status", gateway.url)).send().await.unwrap();
    assert_eq!(unauthorized.status(), 401);
    let wrong = client()
        .get(format!("{}/admin/status", gateway.url))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);

    let status: Value = client()
        .get(format!("{}/admin/status", gateway.url))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["directory"], "embedded");
    assert_eq!(status["registeredBackends"], 1);
    assert_eq!(status["failedBackends"], 1);
    assert_eq!(status["cacheEntries"], 1);

    let reset = client()
        .post(format!("{}/admin/balancer/reset", gateway.url))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap();
    assert_eq!(reset.status(), 200);

    let cleared = client()
        .delete(format!("{}/admin/cache", gateway.url))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap();
    assert_eq!(cleared.status(), 200);

    let cache: Value = client()
        .get(format!("{}/admin/cache", gateway.url))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cache["entries"], 0);
    assert_eq!(cache["ttlMs"], 30_000);

    let failed: Value = client()
        .get(format!("{}/admin/failed", gateway.url))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(failed["failed"], json!([]));
}

#[tokio::test]
async fn test_admin_routes_absent_when_disabled() {
    let mut config = test_config();
    config.admin.enabled = false;
    let gateway = start_gateway(config).await;
    let res = client()
        .get(format!("{}/admin/status", gateway.url))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}
