//! 共享文本剪贴板：追加、读取、导出与清空。

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{Extension, Form, FromRequest, Json, Request};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json as JsonResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::CLIPBOARD_EXPORT_NAME;
use crate::error::ApiError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClipboardEntry {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// 进程内剪贴板，按插入顺序保存。
#[derive(Debug, Default)]
pub struct Clipboard {
    entries: RwLock<Vec<ClipboardEntry>>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加文本；空文本不记录，返回是否追加。
    pub async fn push(&self, text: String) -> bool {
        if text.is_empty() {
            return false;
        }
        self.entries.write().await.push(ClipboardEntry {
            text,
            timestamp: Utc::now(),
        });
        true
    }

    pub async fn snapshot(&self) -> Vec<ClipboardEntry> {
        self.entries.read().await.clone()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[derive(Deserialize, Default)]
pub(crate) struct ClipboardText {
    #[serde(default)]
    text: String,
}

/// 按 Content-Type 接受 JSON 或 urlencoded 表单。
pub(crate) struct ClipboardPayload(ClipboardText);

impl<S> FromRequest<S> for ClipboardPayload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));
        if is_json {
            let Json(payload) = Json::<ClipboardText>::from_request(req, state)
                .await
                .map_err(JsonRejection::into_response)?;
            Ok(Self(payload))
        } else {
            let Form(payload) = Form::<ClipboardText>::from_request(req, state)
                .await
                .map_err(FormRejection::into_response)?;
            Ok(Self(payload))
        }
    }
}

/// 返回全部剪贴板条目。
pub async fn get_clipboard(
    Extension(clipboard): Extension<Arc<Clipboard>>,
) -> JsonResponse<Vec<ClipboardEntry>> {
    JsonResponse(clipboard.snapshot().await)
}

/// 追加剪贴板条目。
pub async fn post_clipboard(
    Extension(clipboard): Extension<Arc<Clipboard>>,
    ClipboardPayload(payload): ClipboardPayload,
) -> StatusCode {
    let length = payload.text.len();
    if clipboard.push(payload.text).await {
        info!(length, "clipboard entry added");
    }
    StatusCode::CREATED
}

/// 以附件形式导出剪贴板。
pub async fn export_clipboard(
    Extension(clipboard): Extension<Arc<Clipboard>>,
) -> Result<Response, ApiError> {
    let disposition =
        HeaderValue::from_str(&format!("attachment; filename={CLIPBOARD_EXPORT_NAME}"))
            .map_err(|_| ApiError::Internal("failed to build response headers".into()))?;
    let entries = clipboard.snapshot().await;
    Ok((
        [(header::CONTENT_DISPOSITION, disposition)],
        JsonResponse(entries),
    )
        .into_response())
}

/// 清空剪贴板。
pub async fn clear_clipboard(Extension(clipboard): Extension<Arc<Clipboard>>) -> StatusCode {
    clipboard.clear().await;
    info!("clipboard cleared");
    StatusCode::OK
}
