//! Basic 认证中间件：静态凭据比对，`/static/` 路径豁免。

use axum::extract::{Extension, connect_info::ConnectInfo};
use axum::http::{HeaderMap, HeaderValue, Request, header};
use axum::{body::Body as AxumBody, middleware, response::Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

use crate::config::AUTH_REALM;
use crate::error::ApiError;
use crate::http::resolve_client_ip;

const STATIC_PREFIX: &str = "/static/";

/// 预先计算的 `Authorization` 期望值；`None` 表示未启用认证。
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    expected: Option<String>,
}

impl AuthConfig {
    /// 由 `user:pass` 形式的凭据构建，空凭据关闭认证。
    pub fn new(credentials: Option<&str>) -> Self {
        let expected = credentials
            .filter(|creds| !creds.is_empty())
            .map(|creds| format!("Basic {}", STANDARD.encode(creds)));
        Self { expected }
    }

    pub fn is_enabled(&self) -> bool {
        self.expected.is_some()
    }

    fn accepts(&self, header: Option<&HeaderValue>) -> bool {
        match &self.expected {
            None => true,
            Some(expected) => header.is_some_and(|value| value.as_bytes() == expected.as_bytes()),
        }
    }
}

/// 认证中间件：逐请求比对 `Authorization` 头。
pub async fn auth_middleware(
    Extension(auth): Extension<Arc<AuthConfig>>,
    req: Request<AxumBody>,
    next: middleware::Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path();
    if !auth.is_enabled() || path.starts_with(STATIC_PREFIX) {
        return Ok(next.run(req).await);
    }

    if auth.accepts(req.headers().get(header::AUTHORIZATION)) {
        return Ok(next.run(req).await);
    }

    let connect_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let client_ip = resolve_client_ip(req.headers(), connect_ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    warn!(path, client_ip, "unauthorized access");

    let mut headers = HeaderMap::new();
    headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_REALM));
    Err(ApiError::Unauthorized(headers))
}
