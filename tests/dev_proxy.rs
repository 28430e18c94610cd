//! Proxy table behaviour against a live dev server.

use std::time::Duration;

use apex_devserver::config::ProxyRuleConfig;
use axum::http::StatusCode;

mod common;

use common::{MockResponse, start_dev_server, start_echo_backend, start_programmable_backend};

#[tokio::test]
async fn test_dev_prefixes_forwarded_with_host_rewritten() {
    let upstream = start_echo_backend().await;
    let server = start_dev_server(common::dev_config(upstream.addr)).await;
    let client = common::client();

    for path in ["/api/exercises/?page=2", "/admin/login/", "/static/admin/css/base.css"] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        let body = res.text().await.unwrap();
        assert_eq!(body, format!("GET {path} host={} body=", upstream.addr));
    }

    let requests = upstream.requests();
    assert_eq!(requests.len(), 3);
    for request in requests {
        assert_eq!(request.header("host"), Some(upstream.addr.to_string().as_str()));
    }
}

#[tokio::test]
async fn test_other_paths_not_forwarded() {
    let upstream = start_echo_backend().await;
    let server = start_dev_server(common::dev_config(upstream.addr)).await;
    let client = common::client();

    for path in ["/src/main.tsx", "/favicon.ico", "/v1/api/users"] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
    }
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn test_host_preserved_without_change_origin() {
    let upstream = start_echo_backend().await;
    let mut config = common::dev_config(upstream.addr);
    for rule in &mut config.proxy {
        rule.change_origin = false;
    }
    let server = start_dev_server(config).await;

    let res = common::client()
        .get(server.url("/api/ping"))
        .send()
        .await
        .unwrap();
    let body = res.text().await.unwrap();
    assert_eq!(body, format!("GET /api/ping host={} body=", server.addr));
}

#[tokio::test]
async fn test_method_and_body_relayed() {
    let upstream = start_echo_backend().await;
    let server = start_dev_server(common::dev_config(upstream.addr)).await;

    let res = common::client()
        .post(server.url("/api/workouts/"))
        .header("content-type", "application/json")
        .body(r#"{"name":"leg day"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().starts_with("POST /api/workouts/ "));

    let recorded = &upstream.requests()[0];
    assert_eq!(recorded.body, r#"{"name":"leg day"}"#);
    assert_eq!(recorded.header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn test_upstream_status_and_redirects_relayed() {
    let upstream = start_programmable_backend(|req| match req.target.as_str() {
        "/admin/" => MockResponse::new(302, "")
            .with_header("Location", "/admin/login/?next=/admin/"),
        "/api/missing/" => MockResponse::new(404, "not here"),
        _ => MockResponse::new(500, "boom"),
    })
    .await;
    let server = start_dev_server(common::dev_config(upstream.addr)).await;
    let client = common::client();

    let res = client.get(server.url("/admin/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/admin/login/?next=/admin/");

    let res = client.get(server.url("/api/missing/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "not here");

    let res = client.get(server.url("/static/x.js")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "boom");

    // The redirect is the client's to follow, not the proxy's.
    assert_eq!(upstream.requests().len(), 3);
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let server = start_dev_server(common::dev_config(common::closed_port())).await;

    let res = common::client()
        .get(server.url("/api/programs/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");
}

#[tokio::test]
async fn test_reloaded_table_takes_effect() {
    let upstream = start_echo_backend().await;
    let config = common::dev_config(upstream.addr);
    let server = start_dev_server(config.clone()).await;
    let client = common::client();

    let res = client.get(server.url("/media/a.png")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let mut reloaded = config;
    reloaded
        .proxy
        .push(ProxyRuleConfig::dev("/media", &format!("http://{}", upstream.addr)));
    server.config_tx.send(reloaded).unwrap();

    let mut status = StatusCode::NOT_FOUND;
    for _ in 0..50 {
        status = client
            .get(server.url("/media/a.png"))
            .send()
            .await
            .unwrap()
            .status();
        if status == StatusCode::OK {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_attached() {
    let upstream = start_echo_backend().await;
    let server = start_dev_server(common::dev_config(upstream.addr)).await;

    let res = common::client()
        .get(server.url("/api/ping"))
        .send()
        .await
        .unwrap();
    assert!(res.headers().contains_key("x-request-id"));
    assert!(upstream.requests()[0].header("x-request-id").is_some());
}

#[tokio::test]
async fn test_dot_segments_cannot_leave_prefix() {
    let upstream = start_echo_backend().await;
    let server = start_dev_server(common::dev_config(upstream.addr)).await;

    for target in [
        "/admin/../secret",
        "/static/%2e%2e/private",
        "/api/%2E%2E/%2e%2e/etc/passwd",
    ] {
        let response = common::raw_get(server.addr, target).await;
        assert!(response.starts_with("HTTP/1.1 404"), "{target}: {response}");
    }
    assert!(upstream.requests().is_empty(), "{:?}", upstream.requests());
}

#[tokio::test]
async fn test_dot_segments_resolved_before_relaying() {
    let upstream = start_echo_backend().await;
    let server = start_dev_server(common::dev_config(upstream.addr)).await;

    let response = common::raw_get(server.addr, "/api/v1/../exercises/").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].target, "/api/exercises/");
}

#[tokio::test]
async fn test_insecure_route_accepts_self_signed_upstream() {
    let (tls_addr, served) = common::start_self_signed_backend().await;
    let mut config = common::dev_config(common::closed_port());
    config.proxy[0] = ProxyRuleConfig::dev("/api", &format!("https://{tls_addr}"));
    let server = start_dev_server(config).await;

    let res = common::client().get(server.url("/api/ping")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "tls ok");
    assert_eq!(served.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_secure_route_rejects_self_signed_upstream() {
    let (tls_addr, served) = common::start_self_signed_backend().await;
    let mut config = common::dev_config(common::closed_port());
    let mut rule = ProxyRuleConfig::dev("/api", &format!("https://{tls_addr}"));
    rule.secure = true;
    config.proxy[0] = rule;
    let server = start_dev_server(config).await;

    let res = common::client().get(server.url("/api/ping")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(served.load(std::sync::atomic::Ordering::SeqCst), 0);
}
