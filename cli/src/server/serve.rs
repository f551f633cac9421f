//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::SkyliftError;
use crate::server::handlers::{action_handler, no_content_handler, panel_handler};
use crate::server::state::ServerState;

/// Build the panel router: the root page plus an empty answer for
/// every other path.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(panel_handler).post(action_handler))
        .fallback(no_content_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), SkyliftError>>, SkyliftError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Build server listening on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| SkyliftError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| SkyliftError::ServerError(e.to_string()))
    });

    Ok(handle)
}
