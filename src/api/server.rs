use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware,
    routing::{any, get, post},
};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{Span, info, warn};

use super::{
    auth::require_credential,
    services::{
        health, missing_task_id, status_method_not_allowed, submit_method_not_allowed,
        submit_task, task_status,
    },
    state::AppState,
    utils::redacted_target,
};
use crate::config::Config;
use crate::runner::CommandRunner;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build the HTTP router for the given state
///
/// Only the submit route sits behind the credential middleware; status
/// requests are re-authorized against the task in the handler.
pub fn router(state: AppState) -> Router {
    let secret = state.config.auth.password.clone();
    let ui_dir = state.config.server.ui_dir.clone();

    let app = Router::new()
        .route(
            "/api/download",
            post(submit_task).fallback(submit_method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(secret, require_credential))
        .route(
            "/api/download/status/{task_id}",
            get(task_status).fallback(status_method_not_allowed),
        )
        .route("/api/download/status", any(missing_task_id))
        .route("/api/download/status/", any(missing_task_id))
        .route("/health", get(health))
        .with_state(state);

    let app = match ui_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app
        // Transparently decompress gzip request bodies
        .layer(RequestDecompressionLayer::new())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
}

/// Status requests may carry the shared secret in `?token=`
fn request_span(request: &Request<Body>) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        uri = %redacted_target(request.uri()),
        version = ?request.version()
    )
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    if config.is_open_mode() {
        warn!("No password set, requests are not authorized");
    }

    let runner = CommandRunner::from_config(&config.downloader);
    info!(
        program = runner.program(),
        output_path = %config.downloader.output_path.display(),
        "Using downloader"
    );

    let address = config.server.bind_addr;
    let state = AppState::new(config, Arc::new(runner));
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "tunedrop listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
