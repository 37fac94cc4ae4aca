//! 上传处理：multipart 表单（POST）与原始请求体（PUT）两种方式。

use axum::body::{Body as AxumBody, Bytes};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Extension, Multipart, Path as UrlPath};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use futures_util::stream::{Stream, StreamExt};
use http_body_util::BodyExt;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::exclusive::ExclusiveFile;
use crate::registry::UploadRegistry;
use crate::storage::Storage;

const FORM_FIELD: &str = "file";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadMode {
    Form,
    Raw,
}

impl UploadMode {
    fn method(self) -> &'static str {
        match self {
            UploadMode::Form => "POST",
            UploadMode::Raw => "PUT",
        }
    }
}

#[derive(Debug)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub bytes: u64,
}

/// 表单上传，成功后重定向回来源页面。
pub async fn upload_form(
    Extension(config): Extension<Arc<ServerConfig>>,
    Extension(storage): Extension<Arc<Storage>>,
    Extension(registry): Extension<Arc<UploadRegistry>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    ensure_writable(&config)?;
    let multipart =
        multipart.map_err(|err| ApiError::BadRequest(format!("Failed to read file: {err}")))?;
    ingest_form(&storage, &registry, multipart).await?;

    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("/");
    Ok(Redirect::to(referer).into_response())
}

/// 原始请求体上传，文件名取 URL 最后一段。
pub async fn upload_raw(
    Extension(config): Extension<Arc<ServerConfig>>,
    Extension(storage): Extension<Arc<Storage>>,
    Extension(registry): Extension<Arc<UploadRegistry>>,
    UrlPath(name): UrlPath<String>,
    body: AxumBody,
) -> Result<StatusCode, ApiError> {
    ensure_writable(&config)?;
    ingest_raw(&storage, &registry, &name, body).await?;
    Ok(StatusCode::CREATED)
}

/// `PUT /upload` 不带文件名。
pub async fn upload_raw_unnamed(
    Extension(config): Extension<Arc<ServerConfig>>,
) -> Result<StatusCode, ApiError> {
    ensure_writable(&config)?;
    Err(ApiError::BadRequest("Missing filename in URL".into()))
}

fn ensure_writable(config: &ServerConfig) -> Result<(), ApiError> {
    if config.read_only {
        return Err(ApiError::Forbidden(
            "Uploads disabled in read-only mode".into(),
        ));
    }
    Ok(())
}

/// 从 multipart 中取出 `file` 字段并写入基础目录。
pub async fn ingest_form(
    storage: &Storage,
    registry: &UploadRegistry,
    mut multipart: Multipart,
) -> Result<StoredUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(format!("Failed to read file: {err}")))?
    {
        if field.name() != Some(FORM_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .and_then(sanitize_filename)
            .ok_or_else(|| ApiError::BadRequest("Failed to read file".into()))?;
        return store_upload(storage, registry, &filename, field, UploadMode::Form).await;
    }
    Err(ApiError::BadRequest("Failed to read file".into()))
}

/// 将原始请求体写入基础目录，文件名取路径最后一段。
pub async fn ingest_raw(
    storage: &Storage,
    registry: &UploadRegistry,
    url_path: &str,
    body: AxumBody,
) -> Result<StoredUpload, ApiError> {
    let filename = sanitize_filename(url_path)
        .ok_or_else(|| ApiError::BadRequest("Missing filename in URL".into()))?;
    let stream = BodyExt::into_data_stream(body);
    store_upload(storage, registry, &filename, stream, UploadMode::Raw).await
}

/// 以独占方式创建目标文件并写入数据流，成功后登记为本进程上传。
///
/// 写入失败时删除已创建的文件且不登记。
pub async fn store_upload<S, E>(
    storage: &Storage,
    registry: &UploadRegistry,
    filename: &str,
    stream: S,
    mode: UploadMode,
) -> Result<StoredUpload, ApiError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut target = ExclusiveFile::create(storage.root_path(), filename).await?;
    debug!(path = %target.path().display(), "receiving upload");
    let write_result: Result<u64, ApiError> = async {
        let mut total_written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| ApiError::BadRequest(err.to_string()))?;
            if chunk.is_empty() {
                continue;
            }
            target
                .file_mut()
                .write_all(&chunk)
                .await
                .map_err(|err| ApiError::Internal(err.to_string()))?;
            total_written += chunk.len() as u64;
        }
        Ok(total_written)
    }
    .await;
    let bytes = match write_result {
        Ok(value) => value,
        Err(err) => {
            target.cleanup().await;
            return Err(err);
        }
    };
    let path = target.finalize().await?;
    registry.insert(path.clone()).await;

    info!(
        path = %path.display(),
        bytes,
        method = mode.method(),
        "uploaded"
    );
    Ok(StoredUpload { path, bytes })
}

/// 取路径最后一段作为文件名；空名、`.` 与 `..` 视为无效。
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::io;
    use tempfile::tempdir;

    fn make_storage() -> (tempfile::TempDir, Arc<Storage>) {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().to_path_buf();
        (temp, Arc::new(Storage::new(root)))
    }

    fn read_only_config(read_only: bool) -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            base_dir: PathBuf::from("/unused"),
            read_only,
            upload_only: false,
            auth_credentials: None,
            uploads_only_listing: false,
        })
    }

    #[test]
    fn sanitize_takes_final_segment() {
        assert_eq!(sanitize_filename("a/b/c.txt").as_deref(), Some("c.txt"));
        assert_eq!(sanitize_filename(r"C:\Users\me\x.png").as_deref(), Some("x.png"));
        assert_eq!(sanitize_filename("notes.md").as_deref(), Some("notes.md"));
        assert_eq!(sanitize_filename("dir/"), None);
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename(".."), None);
    }

    #[tokio::test]
    async fn raw_upload_writes_and_registers() {
        let (_temp, storage) = make_storage();
        let registry = UploadRegistry::new();
        let stored = ingest_raw(&storage, &registry, "nested/hello.txt", AxumBody::from("hello"))
            .await
            .unwrap_or_else(|_| panic!("upload failed"));

        assert_eq!(stored.path, storage.root_path().join("hello.txt"));
        assert_eq!(stored.bytes, 5);
        assert_eq!(std::fs::read(&stored.path).expect("read"), b"hello");
        assert!(registry.contains(&stored.path).await);
    }

    #[tokio::test]
    async fn raw_upload_renames_on_collision() {
        let (_temp, storage) = make_storage();
        let existing = storage.root_path().join("report.pdf");
        std::fs::write(&existing, b"original").expect("seed");
        let registry = UploadRegistry::new();

        let stored = ingest_raw(&storage, &registry, "report.pdf", AxumBody::from("uploaded"))
            .await
            .unwrap_or_else(|_| panic!("upload failed"));

        assert_ne!(stored.path, existing);
        assert_eq!(std::fs::read(&existing).expect("read original"), b"original");
        assert_eq!(std::fs::read(&stored.path).expect("read new"), b"uploaded");
        assert!(!registry.contains(&existing).await);
        assert!(registry.contains(&stored.path).await);
    }

    #[tokio::test]
    async fn failed_stream_leaves_no_file_and_no_registration() {
        let (_temp, storage) = make_storage();
        let registry = UploadRegistry::new();
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::other("connection reset")),
        ]);

        let result = store_upload(&storage, &registry, "broken.bin", chunks, UploadMode::Raw).await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert!(!storage.root_path().join("broken.bin").exists());
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn raw_upload_rejects_missing_filename() {
        let (_temp, storage) = make_storage();
        let registry = UploadRegistry::new();
        let result = ingest_raw(&storage, &registry, "", AxumBody::empty()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn read_only_rejects_before_touching_disk() {
        let (_temp, storage) = make_storage();
        let registry = Arc::new(UploadRegistry::new());
        let result = upload_raw(
            Extension(read_only_config(true)),
            Extension(storage.clone()),
            Extension(registry.clone()),
            UrlPath("x.txt".to_string()),
            AxumBody::from("data"),
        )
        .await;

        assert!(matches!(result, Err(ApiError::Forbidden(_))));
        assert!(!storage.root_path().join("x.txt").exists());
        assert_eq!(registry.len().await, 0);
    }
}
