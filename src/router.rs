//! 路由表与共享状态装配。

use axum::extract::{DefaultBodyLimit, Extension, connect_info::ConnectInfo};
use axum::http::Request;
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info_span};

use crate::auth::AuthConfig;
use crate::clipboard::Clipboard;
use crate::config::{MAX_FORM_UPLOAD_SIZE, ServerConfig};
use crate::registry::UploadRegistry;
use crate::storage::Storage;
use crate::{auth, clipboard, delete, frontend, http, listing, upload};

/// 处理器共享的进程级状态。
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<Storage>,
    pub registry: Arc<UploadRegistry>,
    pub clipboard: Arc<Clipboard>,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let storage = Arc::new(Storage::new(config.base_dir.clone()));
        let auth = Arc::new(AuthConfig::new(config.auth_credentials.as_deref()));
        Self {
            config: Arc::new(config),
            storage,
            registry: Arc::new(UploadRegistry::new()),
            clipboard: Arc::new(Clipboard::new()),
            auth,
        }
    }
}

/// 构建完整路由：认证、安全头、请求追踪与共享状态。
pub fn build_router(state: AppState) -> Router {
    let files = ServeDir::new(state.config.base_dir.clone());

    Router::new()
        .route(
            "/upload",
            post(upload::upload_form)
                .put(upload::upload_raw_unnamed)
                .layer(DefaultBodyLimit::max(MAX_FORM_UPLOAD_SIZE)),
        )
        .route("/upload/{*name}", put(upload::upload_raw))
        .route("/delete", get(delete::delete_file))
        .route("/bulkdelete", post(delete::bulk_delete))
        .route(
            "/clipboard",
            get(clipboard::get_clipboard).post(clipboard::post_clipboard),
        )
        .route("/clipboard/export", get(clipboard::export_clipboard))
        .route("/clipboard/clear", post(clipboard::clear_clipboard))
        .route("/static/{*path}", get(frontend::serve_static))
        .nest_service("/files", files)
        .fallback(listing::index)
        .layer(middleware::from_fn(auth::auth_middleware))
        .layer(middleware::from_fn(http::add_security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let connect_ip = request
                        .extensions()
                        .get::<ConnectInfo<SocketAddr>>()
                        .map(|ConnectInfo(addr)| addr.ip());
                    let client_ip = http::resolve_client_ip(request.headers(), connect_ip)
                        .map(|ip| ip.to_string())
                        .unwrap_or_else(|| "unknown".to_string());

                    info_span!(
                        env!("CARGO_CRATE_NAME"),
                        client_ip,
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(Extension(state.config))
        .layer(Extension(state.storage))
        .layer(Extension(state.registry))
        .layer(Extension(state.clipboard))
        .layer(Extension(state.auth))
}
