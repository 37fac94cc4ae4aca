//! Kutta file server binary.
//!
//! Serves a directory over HTTP for browsing, uploading, downloading and
//! deleting files, plus a small shared text clipboard. Startup performs the
//! pre-flight steps (log redirection, privilege drop) before the immutable
//! configuration is handed to the router.

mod auth;
mod clipboard;
mod config;
mod delete;
mod error;
mod exclusive;
mod frontend;
mod http;
mod icons;
mod listing;
mod logging;
mod privdrop;
mod registry;
mod render;
mod router;
mod storage;
mod upload;

use axum_server::Handle;
use clap::Parser;
use shadow_rs::shadow;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::signal;
use tracing::info;

use crate::config::{Args, SHUTDOWN_GRACE_SECS, ServerConfig};
use crate::router::{AppState, build_router};

shadow!(build);

/// Starts the server and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let args = Args::parse();
    let _log_guard = logging::init_logging(args.log.as_deref())?;

    if let Some(user) = args.user.as_deref() {
        privdrop::drop_privileges(user)?;
        info!(user, "dropped privileges");
    }

    let config = ServerConfig::from_args(&args)?;
    let host = args
        .bind
        .parse::<IpAddr>()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);

    info!(
        "🚀 Serving {} on http://{}",
        config.base_dir.display(),
        addr
    );
    if config.uploads_only_listing {
        info!("default port: listing shows only files uploaded in this session");
    }
    if config.read_only {
        info!("read-only mode: uploads and deletes disabled");
    }
    if config.upload_only {
        info!("upload-only mode: directory listing disabled");
    }

    let app = build_router(AppState::new(config));
    let handle = Handle::new();
    let server = axum_server::bind(addr)
        .handle(handle.clone())
        .serve(app.into_make_service_with_connect_info::<SocketAddr>());

    tokio::select! {
        result = server => result?,
        _ = shutdown_signal(handle) => {}
    }

    Ok(())
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received termination signal shutting down");
    handle.graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_GRACE_SECS)));
}
