//! Per-request failures and their HTTP mapping.

use axum::http::uri::InvalidUri;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that end a proxied request early.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Every backend in the pool is marked dead.
    #[error("No healthy backends available")]
    NoHealthyBackend,

    /// The selected backend could not be reached or broke the connection.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// The backend address and request path did not form a valid URI.
    #[error("invalid upstream URI: {0}")]
    InvalidUpstreamUri(#[from] InvalidUri),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoHealthyBackend => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::InvalidUpstreamUri(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match &self {
            ProxyError::NoHealthyBackend => "No healthy backends available",
            ProxyError::Upstream(_) => "Upstream request failed",
            ProxyError::InvalidUpstreamUri(_) => "Failed to build upstream request",
        };
        (self.status(), body).into_response()
    }
}
