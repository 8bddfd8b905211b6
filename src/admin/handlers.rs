use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::load_balancer::BackendSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub strategy: &'static str,
    pub backends: usize,
    pub alive_backends: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        strategy: state.pool.strategy().as_str(),
        backends: state.pool.backends().len(),
        alive_backends: state.pool.alive_count(),
    })
}

pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<BackendSnapshot>> {
    Json(state.pool.snapshot())
}
