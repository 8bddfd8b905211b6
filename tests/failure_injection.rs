//! Failure injection tests for the load balancer.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

mod common;

#[tokio::test]
async fn test_no_healthy_backend_returns_503_without_contacting_backends() {
    let hits = Arc::new(AtomicU32::new(0));
    let h = hits.clone();
    let backend = common::start_programmable_backend(move |_| {
        let h = h.clone();
        async move {
            h.fetch_add(1, Ordering::SeqCst);
            (200, "ok".into())
        }
    })
    .await;

    let proxy = common::start_proxy(common::test_config(&[backend])).await;
    proxy.pool.set_alive(0, false);

    let res = common::client().get(proxy.url("/work")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "No healthy backends available");
    assert_eq!(hits.load(Ordering::SeqCst), 0, "no backend may be contacted");
    assert_eq!(proxy.pool.active_connections(0), 0);
}

#[tokio::test]
async fn test_health_check_eviction_and_recovery() {
    let b1 = common::start_mock_backend("b1").await;

    let b2_healthy = Arc::new(AtomicBool::new(true));
    let b2h = b2_healthy.clone();
    let b2 = common::start_programmable_backend(move |_| {
        let b2h = b2h.clone();
        async move {
            if b2h.load(Ordering::SeqCst) {
                (200, "b2".into())
            } else {
                (500, "dead".into())
            }
        }
    })
    .await;

    let mut config = common::test_config(&[b1, b2]);
    config.health_check.enabled = true;
    config.health_check.interval_secs = 1;
    let proxy = common::start_proxy(config).await;
    let client = common::client();

    async fn tally(client: &reqwest::Client, url: &str, n: usize) -> (usize, usize) {
        let (mut b1_hits, mut b2_hits) = (0, 0);
        for _ in 0..n {
            let body = client.get(url).send().await.unwrap().text().await.unwrap();
            if body == "b1" {
                b1_hits += 1;
            }
            if body == "b2" {
                b2_hits += 1;
            }
        }
        (b1_hits, b2_hits)
    }

    let url = proxy.url("/");
    let (b1_hits, b2_hits) = tally(&client, &url, 10).await;
    assert_eq!((b1_hits, b2_hits), (5, 5));

    b2_healthy.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(!proxy.pool.is_alive(1));

    let (b1_hits, b2_hits) = tally(&client, &url, 10).await;
    assert_eq!(b1_hits, 10, "Only b1 should be hit after b2 eviction");
    assert_eq!(b2_hits, 0, "b2 should have 0 hits after eviction");

    b2_healthy.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(proxy.pool.is_alive(1));

    let (b1_hits, b2_hits) = tally(&client, &url, 10).await;
    assert_eq!((b1_hits, b2_hits), (5, 5), "b2 should rejoin the rotation");
}

#[tokio::test]
async fn test_all_probes_failing_yields_503() {
    let dead = common::closed_port().await;

    let mut config = common::test_config(&[dead]);
    config.health_check.enabled = true;
    let proxy = common::start_proxy(config).await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!proxy.pool.is_alive(0));

    let res = common::client().get(proxy.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unreachable_backend_returns_502_and_stays_alive() {
    let dead = common::closed_port().await;
    let proxy = common::start_proxy(common::test_config(&[dead])).await;

    let res = common::client().get(proxy.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");

    assert_eq!(proxy.pool.active_connections(0), 0);
    assert!(proxy.pool.is_alive(0), "only the prober may mark a backend dead");
}

#[tokio::test]
async fn test_backend_dying_mid_body_releases_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                // promise 100 bytes, deliver 10, hang up
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n0123456789")
                    .await;
                tokio::time::sleep(Duration::from_millis(100)).await;
            });
        }
    });

    let proxy = common::start_proxy(common::test_config(&[backend])).await;

    let res = common::client().get(proxy.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.bytes().await.is_err(), "truncated body must surface as an error");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(proxy.pool.active_connections(0), 0);
    assert!(proxy.pool.is_alive(0));
}

#[tokio::test]
async fn test_client_abort_releases_connection() {
    let backend = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_millis(800)).await;
        (200, "slow".into())
    })
    .await;
    let proxy = common::start_proxy(common::test_config(&[backend])).await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .no_proxy()
        .build()
        .unwrap();
    assert!(client.get(proxy.url("/")).send().await.is_err());

    // released either on disconnect or when the late response is dropped
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert_eq!(proxy.pool.active_connections(0), 0);
}
