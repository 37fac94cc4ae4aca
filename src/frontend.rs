//! 嵌入式静态资源服务（`/static/*`）。

use axum::body::Body as AxumBody;
use axum::extract::Path as UrlPath;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use rust_embed::RustEmbed;

use crate::error::ApiError;

#[derive(RustEmbed)]
#[folder = "static"]
/// 嵌入式页面样式与脚本。
pub struct StaticAssets;

/// 静态资源处理器。
pub async fn serve_static(UrlPath(path): UrlPath<String>) -> Result<Response, ApiError> {
    load_embedded_asset(path.trim_start_matches('/'))?
        .ok_or_else(|| ApiError::NotFound("not found".into()))
}

/// 加载指定路径的嵌入式资源。
fn load_embedded_asset(path: &str) -> Result<Option<Response>, ApiError> {
    let asset = StaticAssets::get(path);
    let Some(asset) = asset else {
        return Ok(None);
    };
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.essence_str())
            .map_err(|_| ApiError::Internal("invalid MIME type".into()))?,
    );
    Ok(Some(
        (headers, AxumBody::from(asset.data.into_owned())).into_response(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn serves_embedded_stylesheet() {
        let response = serve_static(UrlPath("app.css".to_string()))
            .await
            .unwrap_or_else(|_| panic!("asset missing"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("text/css"))
        );
    }

    #[tokio::test]
    async fn unknown_asset_is_not_found() {
        let result = serve_static(UrlPath("missing.js".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
