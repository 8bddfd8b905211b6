//! Simulated CPU-bound backend for local testing.
//!
//! `SERVER_NAME`, `CAPACITY` and `PORT` configure it, e.g.
//! `SERVER_NAME=b1 PORT=8081 cargo run --example mock_backend`.

use std::env;
use std::hint::black_box;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, routing::get, Router};

struct Identity {
    name: String,
    capacity: String,
}

async fn work(State(identity): State<Arc<Identity>>) -> String {
    let mut acc: u64 = 0;
    for i in 0..1_000_000u64 {
        acc = acc.wrapping_add(black_box(i * i));
    }
    black_box(acc);
    format!("Hello from {} (Capacity: {})", identity.name, identity.capacity)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let identity = Arc::new(Identity {
        name: env::var("SERVER_NAME").unwrap_or_else(|_| "unknown".to_string()),
        capacity: env::var("CAPACITY").unwrap_or_else(|_| "medium".to_string()),
    });
    let port: u16 = env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8080);

    tracing::info!(server = %identity.name, capacity = %identity.capacity, port, "Starting backend");

    let app = Router::new().route("/", get(work)).with_state(identity);
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
