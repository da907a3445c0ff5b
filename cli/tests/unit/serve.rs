//! Unit tests for `berth serve`: resolution before bind, and the bound port.

#![allow(clippy::expect_used)]

use std::time::Duration;

use berth_cli::application::services::serve_service::AppRegistry;
use berth_cli::commands::serve::serve_with_shutdown;
use berth_cli::domain::{LaunchError, RuntimeConfig, RuntimeOverrides};
use berth_common::GatewayConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

fn config(pairs: &[(&str, &str)]) -> RuntimeConfig {
    let env = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()));
    RuntimeConfig::resolve(env, &RuntimeOverrides::default()).expect("config")
}

async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    listener.local_addr().expect("addr").port()
}

async fn connect_with_retry(port: u16) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server never accepted on port {port}");
}

#[tokio::test]
async fn serves_health_on_configured_port() {
    let port = free_port().await;
    let cfg = config(&[("PORT", &port.to_string()), ("HOST", "127.0.0.1")]);
    let (tx, rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let registry = AppRegistry::builtin();
        serve_with_shutdown(&registry, &cfg, &GatewayConfig::default(), async {
            let _ = rx.await;
        })
        .await
    });

    let mut stream = connect_with_retry(port).await;
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .expect("write");
    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read");
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("\"healthy\""), "{response}");

    tx.send(()).expect("shutdown");
    server.await.expect("join").expect("clean shutdown");
}

#[tokio::test]
async fn unknown_app_fails_before_binding() {
    // Hold the port: an attempt to bind would surface PortInUse instead.
    let held = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = held.local_addr().expect("addr").port();
    let cfg = config(&[
        ("PORT", &port.to_string()),
        ("HOST", "127.0.0.1"),
        ("APP_MODULE", "other.server:app"),
    ]);

    let err = serve_with_shutdown(
        &AppRegistry::builtin(),
        &cfg,
        &GatewayConfig::default(),
        std::future::ready(()),
    )
    .await
    .expect_err("unknown app");
    match err.downcast_ref::<LaunchError>() {
        Some(LaunchError::UnknownApplication { app, available }) => {
            assert_eq!(app, "other.server:app");
            assert!(available.contains("yield_agent.server:app"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn occupied_port_is_port_in_use() {
    let held = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = held.local_addr().expect("addr").port();
    let cfg = config(&[("PORT", &port.to_string()), ("HOST", "127.0.0.1")]);

    let err = serve_with_shutdown(
        &AppRegistry::builtin(),
        &cfg,
        &GatewayConfig::default(),
        std::future::ready(()),
    )
    .await
    .expect_err("port held");
    assert!(matches!(
        err.downcast_ref::<LaunchError>(),
        Some(LaunchError::PortInUse { .. })
    ));
}
