//! HTTP handlers and the middleware shared by every route.

pub mod hooker;
pub mod nodes;

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use beacon_core::{resolve_remote_addr, FORWARDED_FOR};

use crate::error::status_response;

pub use hooker::handle_hooker;
pub use nodes::NodesState;

// ── Middleware ────────────────────────────────────────────────────────────────

/// Resolve the caller's address once and attach it as a
/// [`beacon_core::RemoteAddr`] extension for every downstream handler.
pub async fn remote_addr(mut request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let forwarded = request
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok());

    let remote = resolve_remote_addr(&peer, forwarded);
    request.extensions_mut().insert(remote);
    next.run(request).await
}

// ── /healthz ──────────────────────────────────────────────────────────────────

pub async fn handle_healthz() -> &'static str {
    "healthy\n"
}

// ── fallback ──────────────────────────────────────────────────────────────────

pub async fn handle_not_found() -> Response {
    status_response(StatusCode::NOT_FOUND)
}
