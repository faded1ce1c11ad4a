//! End-to-end tests against an in-process configuration server.

#![cfg(all(feature = "http", feature = "aes"))]

mod common;

use cloud_config_client::prelude::*;
use common::{KEY, TestServer, encrypted, environment_body};
use std::time::Duration;

fn settings(server: &TestServer) -> ConnectionSettings {
    ConnectionSettings::new()
        .with_base_url(&server.base_url)
        .with_application_name("orders")
        .with_profiles("prod,eu")
}

async fn build(settings: ConnectionSettings) -> Result<CloudConfig> {
    CloudConfig::builder()
        .with_settings(settings)
        .with_host(HostInfo::default())
        .build()
        .await
}

#[tokio::test]
async fn test_request_shape() {
    let server = TestServer::respond(200, environment_body(&[])).await;

    build(settings(&server).with_label("feature/login"))
        .await
        .unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/orders/prod,eu/feature(_)login");
    assert_eq!(request.headers["accept"], "application/json");
    assert!(!request.headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_basic_auth_header() {
    let server = TestServer::respond(200, environment_body(&[])).await;

    build(settings(&server).with_basic_auth("reader", "s3cret"))
        .await
        .unwrap();

    // base64("reader:s3cret")
    assert_eq!(
        server.requests()[0].headers["authorization"],
        "Basic cmVhZGVyOnMzY3JldA=="
    );
}

#[tokio::test]
async fn test_profiles_from_host() {
    let server = TestServer::respond(200, environment_body(&[])).await;

    CloudConfig::builder()
        .with_settings(ConnectionSettings::new().with_base_url(&server.base_url))
        .with_host(HostInfo::new("billing").with_active_profiles(["staging"]))
        .build()
        .await
        .unwrap();

    assert_eq!(server.requests()[0].path, "/billing/staging/master");
}

#[tokio::test]
async fn test_precedence_and_fallback() {
    let body = environment_body(&[
        ("orders-prod.yml", &[("db.host", "prod-db")]),
        ("orders.yml", &[("db.port", "5433")]),
        ("application.yml", &[("db.host", "localhost"), ("db.port", "5432")]),
    ]);
    let server = TestServer::respond(200, body).await;

    let config = CloudConfig::builder()
        .with_settings(settings(&server))
        .with_host(HostInfo::default())
        .with_fallback(|_: &str| Some("unset".to_string()))
        .build()
        .await
        .unwrap();

    assert_eq!(config.resolve("db.host").as_deref(), Some("prod-db"));
    assert_eq!(config.resolve("db.port").as_deref(), Some("5433"));
    assert_eq!(config.resolve("missing.key").as_deref(), Some("unset"));
    assert_eq!(config.origin().version.as_deref(), Some("6f2d1c0"));
    assert_eq!(config.origin().source_names.len(), 3);
}

#[tokio::test]
async fn test_encrypted_values_are_decrypted() {
    let secret = encrypted("prod-password");
    let body = environment_body(&[
        ("orders-prod.yml", &[("db.password", secret.as_str()), ("db.user", "orders")]),
        ("application.yml", &[("db.password", "![not-even-base64]")]),
    ]);
    let server = TestServer::respond(200, body).await;

    let config = build(settings(&server).with_encryption_key(KEY))
        .await
        .unwrap();

    // The overwritten, undecryptable value never reaches the filter.
    assert_eq!(config.get("db.password"), Some("prod-password"));
    assert_eq!(config.get("db.user"), Some("orders"));
    assert_eq!(config.dump_all()["db.password"], "prod-password");
}

#[tokio::test]
async fn test_plain_values_unchanged_with_encryption_enabled() {
    let body = environment_body(&[("application.yml", &[("greeting", "![hello"), ("name", "x]")])]);
    let server = TestServer::respond(200, body).await;

    let config = build(settings(&server).with_encryption_key(KEY))
        .await
        .unwrap();

    assert_eq!(config.get("greeting"), Some("![hello"));
    assert_eq!(config.get("name"), Some("x]"));
}

#[tokio::test]
async fn test_one_corrupt_secret_fails_everything() {
    let plain: Vec<(String, String)> = (0..10)
        .map(|i| (format!("plain.{i}"), format!("value-{i}")))
        .collect();
    let mut pairs: Vec<(&str, &str)> = plain.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    pairs.push(("db.password", "![bm90IGEgcmVhbCBjaXBoZXJ0ZXh0]"));
    let server = TestServer::respond(200, environment_body(&[("application.yml", pairs.as_slice())])).await;

    let err = build(settings(&server).with_encryption_key(KEY))
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::Decryption { ref key, .. } if key == "db.password"));
}

#[tokio::test]
async fn test_encrypted_value_without_key_fails() {
    let body = environment_body(&[("application.yml", &[("db.password", "![c2VjcmV0]")])]);
    let server = TestServer::respond(200, body).await;

    let err = build(settings(&server)).await.unwrap_err();
    assert!(matches!(err, ConfigError::Decryption { .. }));
}

#[tokio::test]
async fn test_server_error_status() {
    let server = TestServer::respond(500, r#"{"error": "boom"}"#).await;

    let err = build(settings(&server)).await.unwrap_err();
    assert!(matches!(err, ConfigError::RemoteFetch(ref msg) if msg.contains("500")));
}

#[tokio::test]
async fn test_not_found_status() {
    let server = TestServer::respond(404, "{}").await;

    let err = build(settings(&server)).await.unwrap_err();
    assert!(matches!(err, ConfigError::RemoteFetch(_)));
}

#[tokio::test]
async fn test_malformed_body() {
    let server = TestServer::respond(200, r#"{"name": "orders", "profiles": ["prod"]}"#).await;

    let err = build(settings(&server)).await.unwrap_err();
    assert!(matches!(err, ConfigError::RemoteFetch(_)));
}

#[tokio::test]
async fn test_unresponsive_server_times_out() {
    let server = TestServer::silent().await;

    let started = std::time::Instant::now();
    let err = build(settings(&server).with_timeout(Duration::from_millis(300)))
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::RemoteFetch(_)));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind and drop to get a port nobody listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let settings = ConnectionSettings::new()
        .with_base_url(format!("http://127.0.0.1:{port}/"))
        .with_application_name("orders")
        .with_profiles("prod");

    let err = build(settings).await.unwrap_err();
    assert!(matches!(err, ConfigError::RemoteFetch(_)));
}

#[tokio::test]
async fn test_missing_profiles_makes_no_request() {
    let server = TestServer::respond(200, environment_body(&[])).await;

    let err = build(
        ConnectionSettings::new()
            .with_base_url(&server.base_url)
            .with_application_name("orders"),
    )
    .await
    .unwrap_err();

    assert!(err.is_configuration());
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_placeholders_over_remote_values() {
    let body = environment_body(&[(
        "application.yml",
        &[("db.host", "prod-db"), ("db.url", "postgres://${db.host}:${db.port:5432}/orders")],
    )]);
    let server = TestServer::respond(200, body).await;

    let config = build(settings(&server)).await.unwrap();
    assert_eq!(
        config.resolve_placeholders("${db.url}").unwrap(),
        "postgres://prod-db:5432/orders"
    );
}
