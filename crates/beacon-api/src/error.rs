use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use beacon_services::StoreError;

/// Everything /nodes/ can answer besides success.
#[derive(Debug, thiserror::Error)]
pub enum NodesError {
    #[error("missing name parameter")]
    MissingName,
    #[error("invalid query: {0}")]
    BadQuery(String),
    #[error("forbidden")]
    Forbidden,
    #[error("node {0:?} not found")]
    NotFound(String),
    #[error("{op} {name:?} failed: {source}")]
    Store {
        op: &'static str,
        name: String,
        #[source]
        source: StoreError,
    },
}

impl NodesError {
    pub fn status(&self) -> StatusCode {
        match self {
            NodesError::MissingName | NodesError::BadQuery(_) => StatusCode::BAD_REQUEST,
            NodesError::Forbidden => StatusCode::FORBIDDEN,
            NodesError::NotFound(_) => StatusCode::NOT_FOUND,
            NodesError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NodesError {
    fn into_response(self) -> Response {
        match &self {
            NodesError::Store { op, name, source } => {
                tracing::error!(op = %op, name = %name, error = %source, "directory store failed");
            }
            NodesError::NotFound(name) => tracing::debug!(name = %name, "node not found"),
            NodesError::MissingName | NodesError::BadQuery(_) => {
                tracing::warn!(error = %self, "rejected nodes request");
            }
            // logged where the decision is made
            NodesError::Forbidden => {}
        }
        status_response(self.status())
    }
}

/// Plain-text `<code> <reason>` body used for every error status.
pub fn status_response(status: StatusCode) -> Response {
    let body = format!(
        "{} {}\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );
    (status, body).into_response()
}
