//! /nodes/ — self-registration directory.
//!
//! `PUT /nodes/?name=<name>` records the caller's resolved address under
//! `name`; `GET /nodes/?name=<name>` returns it as `<address>\r\n`. Every
//! request must carry `Authorization: Bearer <token>`, checked before
//! anything else. Any other method is refused with 403.

use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Extension, Router};
use subtle::ConstantTimeEq;

use beacon_core::RemoteAddr;
use beacon_services::DirectoryStore;

use crate::error::NodesError;

/// Store and credential the endpoint is built with. Both are fixed for the
/// endpoint's lifetime.
#[derive(Clone)]
pub struct NodesState {
    store: Arc<dyn DirectoryStore>,
    /// Full expected header value, `Bearer <token>`.
    authorization: Arc<str>,
}

impl NodesState {
    pub fn new(store: Arc<dyn DirectoryStore>, token: &str) -> Self {
        Self {
            store,
            authorization: Arc::from(format!("Bearer {}", token)),
        }
    }

    pub fn store(&self) -> &Arc<dyn DirectoryStore> {
        &self.store
    }
}

pub fn router(state: NodesState) -> Router {
    Router::new()
        .route("/nodes/", any(handle_nodes))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .with_state(state)
}

async fn require_bearer(
    State(state): State<NodesState>,
    request: Request,
    next: Next,
) -> Result<Response, NodesError> {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .is_some_and(|v| v.as_bytes().ct_eq(state.authorization.as_bytes()).into());

    if !authorized {
        tracing::warn!(
            method = %request.method(),
            remote = ?request.extensions().get::<RemoteAddr>(),
            "unauthorized nodes request"
        );
        return Err(NodesError::Forbidden);
    }

    Ok(next.run(request).await)
}

pub async fn handle_nodes(
    State(state): State<NodesState>,
    Extension(remote): Extension<RemoteAddr>,
    method: Method,
    uri: Uri,
) -> Result<Response, NodesError> {
    match method {
        Method::GET => lookup(&state, &uri).await,
        Method::PUT => register(&state, &uri, &remote).await,
        other => {
            tracing::warn!(method = %other, "method not allowed on /nodes/");
            Err(NodesError::Forbidden)
        }
    }
}

async fn lookup(state: &NodesState, uri: &Uri) -> Result<Response, NodesError> {
    let name = node_name(uri)?;
    match state.store.get(&name).await {
        Ok(Some(address)) => {
            tracing::debug!(name = %name, address = %address, "node looked up");
            Ok(format!("{}\r\n", address).into_response())
        }
        Ok(None) => Err(NodesError::NotFound(name)),
        Err(source) => Err(NodesError::Store {
            op: "get",
            name,
            source,
        }),
    }
}

async fn register(
    state: &NodesState,
    uri: &Uri,
    remote: &RemoteAddr,
) -> Result<Response, NodesError> {
    let name = node_name(uri)?;
    if let Err(source) = state.store.set(&name, remote.as_str()).await {
        return Err(NodesError::Store {
            op: "set",
            name,
            source,
        });
    }
    tracing::info!(
        name = %name,
        address = %remote,
        backend = state.store.backend(),
        "node registered"
    );
    Ok(StatusCode::OK.into_response())
}

/// First `name` pair in the query string. Repeats after the first are
/// ignored; an empty first value counts as missing.
fn node_name(uri: &Uri) -> Result<String, NodesError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map_err(|e| NodesError::BadQuery(e.body_text()))?;
    match pairs.into_iter().find(|(key, _)| key == "name") {
        Some((_, name)) if !name.is_empty() => Ok(name),
        _ => Err(NodesError::MissingName),
    }
}
