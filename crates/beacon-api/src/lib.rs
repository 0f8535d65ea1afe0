pub mod error;
pub mod handlers;


use std::future::Future;
use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use error::NodesError;
pub use handlers::NodesState;

/// Build the full HTTP surface.
///
/// `/nodes/` only exists when `nodes` is `Some`; without it the path falls
/// through to the generic 404 like any other unknown route.
pub fn router(nodes: Option<NodesState>) -> Router {
    let mut app = Router::new()
        .route("/healthz", get(handlers::handle_healthz))
        .route(
            "/hooker",
            post(handlers::handle_hooker).layer(DefaultBodyLimit::disable()),
        );

    if let Some(state) = nodes {
        app = app.merge(handlers::nodes::router(state));
    }

    app.fallback(handlers::handle_not_found)
        .layer(middleware::from_fn(handlers::remote_addr))
        .layer(TraceLayer::new_for_http())
}

/// Serve `app` on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "http up");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
